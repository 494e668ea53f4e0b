//! Testing helpers: hand-rolled doubles for the flow's collaborators.
//!
//! Used by this crate's unit tests and by the workspace integration
//! tests, so the checkout flow can run without Postgres or a bot token.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::{ChatId, InlineKeyboardButtonKind, InlineKeyboardMarkup, MessageId};
use tokio::sync::Mutex;

use samovar_core::{NewOrder, OrderId, OrderStatus, PlacedOrder};

use crate::gateway::{GatewayError, OrderGateway};
use crate::outbound::{Messenger, OutboundError};

/// One message captured by [`RecordingMessenger`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat: ChatId,
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl SentMessage {
    /// All callback data strings carried by the attached keyboard.
    #[must_use]
    pub fn callback_data(&self) -> Vec<String> {
        self.keyboard
            .iter()
            .flat_map(|kb| kb.inline_keyboard.iter().flatten())
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }
}

/// [`Messenger`] that records every outbound call instead of hitting
/// the Telegram API.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<SentMessage>>,
    cleared: Mutex<Vec<(ChatId, MessageId)>>,
}

impl RecordingMessenger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for handing the double around as a trait
    /// object while keeping a concrete handle for assertions.
    #[must_use]
    pub fn shared() -> (Arc<Self>, Arc<dyn Messenger>) {
        let recorder = Arc::new(Self::new());
        let messenger: Arc<dyn Messenger> = recorder.clone();
        (recorder, messenger)
    }

    /// Every message sent so far, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Every keyboard removal performed so far.
    pub async fn cleared(&self) -> Vec<(ChatId, MessageId)> {
        self.cleared.lock().await.clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), OutboundError> {
        self.sent.lock().await.push(SentMessage {
            chat,
            text: text.to_owned(),
            keyboard: None,
        });
        Ok(())
    }

    async fn send_inline(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<(), OutboundError> {
        self.sent.lock().await.push(SentMessage {
            chat,
            text: text.to_owned(),
            keyboard: Some(keyboard),
        });
        Ok(())
    }

    async fn clear_keyboard(&self, chat: ChatId, message: MessageId) -> Result<(), OutboundError> {
        self.cleared.lock().await.push((chat, message));
        Ok(())
    }
}

#[derive(Default)]
struct StubGatewayState {
    orders: Vec<PlacedOrder>,
    next_id: i32,
    fail_create: bool,
}

/// In-memory [`OrderGateway`] with the same idempotent status semantics
/// as the production implementation.
#[derive(Default)]
pub struct StubGateway {
    state: Mutex<StubGatewayState>,
}

impl StubGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_order` fail as unreachable.
    pub async fn fail_creates(&self) {
        self.state.lock().await.fail_create = true;
    }

    /// All orders created so far.
    pub async fn created(&self) -> Vec<PlacedOrder> {
        self.state.lock().await.orders.clone()
    }

    /// Current status of an order, if it exists.
    pub async fn status_of(&self, id: OrderId) -> Option<OrderStatus> {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.status)
    }

    /// Current shipping address of an order, if it exists.
    pub async fn address_of(&self, id: OrderId) -> Option<String> {
        self.state
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.shipping_address.clone())
    }
}

#[async_trait]
impl OrderGateway for StubGateway {
    async fn create_order(&self, order: NewOrder) -> Result<PlacedOrder, GatewayError> {
        let mut state = self.state.lock().await;
        if state.fail_create {
            return Err(GatewayError::Unavailable("connection refused".to_owned()));
        }
        state.next_id += 1;
        let placed = PlacedOrder {
            id: OrderId::new(state.next_id),
            status: OrderStatus::Pending,
            total_amount: order.total_amount,
            shipping_address: order.shipping_address,
        };
        state.orders.push(placed.clone());
        Ok(placed)
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<PlacedOrder, GatewayError> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(GatewayError::NotFound(id))?;
        if order.status != status {
            order.status = status;
        }
        Ok(order.clone())
    }

    async fn update_shipping_address(
        &self,
        id: OrderId,
        address: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(GatewayError::NotFound(id))?;
        order.shipping_address = address.to_owned();
        Ok(())
    }
}
