//! Order-confirmation orchestrator.
//!
//! Drives the checkout handshake between the Mini App, the order store,
//! and the chat: cart submission persists a pending order and sends the
//! inline confirm / change-address prompt; callbacks promote the order or
//! start the address-correction loop.
//!
//! Persistence failures degrade instead of blocking: the prompt is still
//! sent, flagged as not durably recorded, and the callback data carries
//! the `nodb` marker. An order whose prompt is never answered stays
//! `pending` forever; there is no reaper.

use std::sync::Arc;

use teloxide::types::{ChatId, MessageId};
use thiserror::Error;
use tracing::{info, warn};

use samovar_core::{CartItem, NewOrder, NewOrderItem, OrderId, OrderStatus, Price};

use crate::gateway::{GatewayError, OrderGateway};
use crate::keyboards;
use crate::outbound::{Messenger, OutboundError};
use crate::session::{PendingConfirmation, SessionStore};

/// Cart submission failure surfaced to the HTTP layer.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The chat never went through the login handoff.
    #[error("chat is not authenticated")]
    NotAuthenticated,

    /// The confirmation prompt could not be delivered.
    #[error(transparent)]
    Outbound(#[from] OutboundError),
}

/// Failure in a callback-driven step of the flow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("chat has no active session")]
    NoSession,

    #[error(transparent)]
    Outbound(#[from] OutboundError),
}

/// Result of a cart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// `None` when the order store was unreachable and the flow degraded.
    pub order_id: Option<OrderId>,
}

/// The confirmation flow's collaborators, injected as trait objects.
pub struct ConfirmationFlow {
    gateway: Arc<dyn OrderGateway>,
    sessions: Arc<dyn SessionStore>,
    outbound: Arc<dyn Messenger>,
}

impl ConfirmationFlow {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn OrderGateway>,
        sessions: Arc<dyn SessionStore>,
        outbound: Arc<dyn Messenger>,
    ) -> Self {
        Self {
            gateway,
            sessions,
            outbound,
        }
    }

    /// Handle a cart submitted through `POST /web-data`.
    ///
    /// Persists a pending order for the authenticated chat and sends the
    /// inline confirmation prompt. When persistence fails the prompt is
    /// still sent with a not-recorded placeholder.
    ///
    /// # Errors
    ///
    /// [`SubmitError::NotAuthenticated`] when the chat has no session;
    /// [`SubmitError::Outbound`] when the prompt cannot be delivered.
    pub async fn submit_cart(
        &self,
        chat: ChatId,
        query_id: &str,
        items: &[CartItem],
        total: Price,
    ) -> Result<SubmitOutcome, SubmitError> {
        let session = self
            .sessions
            .get(chat)
            .await
            .ok_or(SubmitError::NotAuthenticated)?;

        let address = session
            .user
            .address
            .clone()
            .unwrap_or_else(|| "(no address on file)".to_owned());

        let new_order = NewOrder {
            user_id: Some(session.user.id),
            items: items
                .iter()
                .map(|item| NewOrderItem {
                    product_id: item.id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            total_amount: total,
            shipping_address: address.clone(),
        };

        let order_id = match self.gateway.create_order(new_order).await {
            Ok(order) => {
                info!(order_id = %order.id, chat_id = chat.0, "pending order persisted");
                Some(order.id)
            }
            Err(e) => {
                warn!(chat_id = chat.0, error = %e, "order persistence failed, degrading");
                None
            }
        };

        let text = order_summary(items, total, &address, order_id.is_some());
        let keyboard = keyboards::confirmation_keyboard(query_id, order_id, chat);
        self.outbound.send_inline(chat, &text, keyboard).await?;

        let pending = PendingConfirmation {
            query_id: query_id.to_owned(),
            order_id,
        };
        self.sessions
            .update(chat, Box::new(move |s| s.pending = Some(pending)))
            .await;

        Ok(SubmitOutcome { order_id })
    }

    /// Handle the confirm callback.
    ///
    /// Promotes the order to `processing` (a no-op when it already is),
    /// removes the prompt's buttons, clears the session's pending
    /// confirmation, and returns the text to answer the query with.
    ///
    /// # Errors
    ///
    /// [`FlowError::Outbound`] when the keyboard removal fails hard.
    pub async fn confirm(
        &self,
        chat: ChatId,
        prompt: MessageId,
        order_id: Option<OrderId>,
    ) -> Result<String, FlowError> {
        if let Some(id) = order_id {
            match self.gateway.update_status(id, OrderStatus::Processing).await {
                Ok(order) => {
                    info!(order_id = %order.id, status = %order.status, "order confirmed");
                }
                Err(e) => {
                    // The user already committed; report success and leave
                    // the promotion to the admin panel.
                    warn!(order_id = %id, error = %e, "status promotion failed");
                }
            }
        }

        self.outbound.clear_keyboard(chat, prompt).await?;
        self.sessions
            .update(
                chat,
                Box::new(|s| {
                    s.pending = None;
                    s.awaiting_address = false;
                }),
            )
            .await;

        Ok(order_id.map_or_else(
            || "✅ Order confirmed! Our team will register it shortly.".to_owned(),
            |id| format!("✅ Order #{id} confirmed! We are processing it."),
        ))
    }

    /// Handle the change-address callback: arm the address capture and
    /// prompt for free text.
    ///
    /// # Errors
    ///
    /// [`FlowError::NoSession`] when the chat is not authenticated;
    /// [`FlowError::Outbound`] when the prompt cannot be sent.
    pub async fn request_address_change(&self, chat: ChatId) -> Result<String, FlowError> {
        let armed = self
            .sessions
            .update(chat, Box::new(|s| s.awaiting_address = true))
            .await;
        if !armed {
            return Err(FlowError::NoSession);
        }

        self.outbound
            .send_text(chat, "✏️ Send the new delivery address as a message.")
            .await?;
        Ok("Waiting for the new address".to_owned())
    }

    /// Consume a plain-text message as the corrected address when the
    /// capture is armed.
    ///
    /// Returns `false` (leaving the message for menu handling) when the
    /// chat is not awaiting an address. On capture the session and the
    /// pending order are updated and the confirmation prompt is re-sent
    /// with the corrected address.
    ///
    /// # Errors
    ///
    /// [`FlowError::Outbound`] when the re-sent prompt cannot be delivered.
    pub async fn capture_address(&self, chat: ChatId, text: &str) -> Result<bool, FlowError> {
        let Some(session) = self.sessions.get(chat).await else {
            return Ok(false);
        };
        if !session.awaiting_address {
            return Ok(false);
        }

        let address = text.trim().to_owned();
        self.sessions
            .update(
                chat,
                Box::new({
                    let address = address.clone();
                    move |s| {
                        s.awaiting_address = false;
                        s.user.address = Some(address);
                    }
                }),
            )
            .await;

        if let Some(pending) = session.pending {
            if let Some(id) = pending.order_id
                && let Err(e) = self.gateway.update_shipping_address(id, &address).await
            {
                warn!(order_id = %id, error = %e, "shipping address update failed");
            }

            let text = format!(
                "📦 Delivery address updated to: {address}\n\nPlease confirm your order."
            );
            let keyboard =
                keyboards::confirmation_keyboard(&pending.query_id, pending.order_id, chat);
            self.outbound.send_inline(chat, &text, keyboard).await?;
        } else {
            self.outbound
                .send_text(chat, &format!("📦 Delivery address updated to: {address}"))
                .await?;
        }

        Ok(true)
    }
}

fn order_summary(items: &[CartItem], total: Price, address: &str, durable: bool) -> String {
    let mut lines = vec!["🧾 Your order:".to_owned(), String::new()];
    for item in items {
        lines.push(format!(
            "  {} × {} — {}",
            item.quantity,
            item.name,
            item.subtotal()
        ));
    }
    lines.push(String::new());
    lines.push(format!("Total: {total}"));
    lines.push(format!("Delivery address: {address}"));
    if !durable {
        lines.push(String::new());
        lines.push(
            "⚠️ The order could not be recorded right now; our team will register it manually."
                .to_owned(),
        );
    }
    lines.push(String::new());
    lines.push("Confirm the order or change the delivery address.".to_owned());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ChatSession, InMemorySessionStore, SessionUser};
    use crate::testing::{RecordingMessenger, StubGateway};
    use samovar_core::{ProductId, UserId, UserRole};

    fn tea(quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(5),
            name: "Tea".to_owned(),
            price: Price::from(10),
            quantity,
        }
    }

    async fn authenticated_flow() -> (
        ConfirmationFlow,
        Arc<StubGateway>,
        Arc<InMemorySessionStore>,
        Arc<RecordingMessenger>,
    ) {
        let gateway = Arc::new(StubGateway::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let outbound = Arc::new(RecordingMessenger::new());
        sessions
            .insert(
                ChatId(1),
                ChatSession::new(SessionUser {
                    id: UserId::new(42),
                    username: "alice".to_owned(),
                    role: UserRole::User,
                    email: None,
                    address: Some("Street 1".to_owned()),
                }),
            )
            .await;
        let flow = ConfirmationFlow::new(gateway.clone(), sessions.clone(), outbound.clone());
        (flow, gateway, sessions, outbound)
    }

    #[tokio::test]
    async fn submit_rejects_unauthenticated_chat() {
        let gateway = Arc::new(StubGateway::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let outbound = Arc::new(RecordingMessenger::new());
        let flow = ConfirmationFlow::new(gateway.clone(), sessions, outbound.clone());

        let result = flow
            .submit_cart(ChatId(1), "q1", &[tea(2)], Price::from(20))
            .await;

        assert!(matches!(result, Err(SubmitError::NotAuthenticated)));
        assert_eq!(gateway.created().await.len(), 0);
        assert!(outbound.sent().await.is_empty());
    }

    #[tokio::test]
    async fn submit_persists_and_sends_confirmation_prompt() {
        let (flow, gateway, sessions, outbound) = authenticated_flow().await;

        let outcome = flow
            .submit_cart(ChatId(1), "q1", &[tea(2)], Price::from(20))
            .await
            .expect("submit");

        let order_id = outcome.order_id.expect("order id");
        let created = gateway.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].status, OrderStatus::Pending);
        assert_eq!(created[0].total_amount, Price::from(20));

        let sent = outbound.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat, ChatId(1));
        assert!(sent[0].text.contains("2 × Tea — 20"));
        assert!(sent[0].text.contains("Street 1"));
        assert!(
            sent[0]
                .callback_data()
                .contains(&format!("confirm_order_q1_{order_id}"))
        );

        let session = sessions.get(ChatId(1)).await.expect("session");
        let pending = session.pending.expect("pending confirmation");
        assert_eq!(pending.query_id, "q1");
        assert_eq!(pending.order_id, Some(order_id));
    }

    #[tokio::test]
    async fn submit_degrades_when_persistence_is_down() {
        let (flow, gateway, _sessions, outbound) = authenticated_flow().await;
        gateway.fail_creates().await;

        let outcome = flow
            .submit_cart(ChatId(1), "q1", &[tea(1)], Price::from(10))
            .await
            .expect("submit degrades, not errors");

        assert_eq!(outcome.order_id, None);
        let sent = outbound.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("could not be recorded"));
        assert!(
            sent[0]
                .callback_data()
                .contains(&"confirm_order_q1_nodb".to_owned())
        );
    }

    #[tokio::test]
    async fn confirm_promotes_order_and_clears_pending() {
        let (flow, gateway, sessions, outbound) = authenticated_flow().await;
        let outcome = flow
            .submit_cart(ChatId(1), "q1", &[tea(2)], Price::from(20))
            .await
            .expect("submit");
        let order_id = outcome.order_id.expect("order id");

        let reply = flow
            .confirm(ChatId(1), MessageId(77), Some(order_id))
            .await
            .expect("confirm");

        assert!(reply.contains(&format!("#{order_id}")));
        assert_eq!(
            gateway.status_of(order_id).await,
            Some(OrderStatus::Processing)
        );
        assert_eq!(outbound.cleared().await, vec![(ChatId(1), MessageId(77))]);
        let session = sessions.get(ChatId(1)).await.expect("session");
        assert!(session.pending.is_none());
    }

    #[tokio::test]
    async fn confirm_is_idempotent() {
        let (flow, gateway, _sessions, _outbound) = authenticated_flow().await;
        let outcome = flow
            .submit_cart(ChatId(1), "q1", &[tea(2)], Price::from(20))
            .await
            .expect("submit");
        let order_id = outcome.order_id.expect("order id");

        flow.confirm(ChatId(1), MessageId(77), Some(order_id))
            .await
            .expect("first confirm");
        flow.confirm(ChatId(1), MessageId(77), Some(order_id))
            .await
            .expect("second confirm is a no-op");

        assert_eq!(
            gateway.status_of(order_id).await,
            Some(OrderStatus::Processing)
        );
    }

    #[tokio::test]
    async fn address_correction_loops_back_to_confirmation() {
        let (flow, gateway, sessions, outbound) = authenticated_flow().await;
        let outcome = flow
            .submit_cart(ChatId(1), "q1", &[tea(2)], Price::from(20))
            .await
            .expect("submit");
        let order_id = outcome.order_id.expect("order id");

        flow.request_address_change(ChatId(1))
            .await
            .expect("request change");
        assert!(
            sessions
                .get(ChatId(1))
                .await
                .expect("session")
                .awaiting_address
        );

        let consumed = flow
            .capture_address(ChatId(1), "Street 2")
            .await
            .expect("capture");
        assert!(consumed);

        let session = sessions.get(ChatId(1)).await.expect("session");
        assert!(!session.awaiting_address);
        assert_eq!(session.user.address.as_deref(), Some("Street 2"));
        assert_eq!(gateway.address_of(order_id).await.as_deref(), Some("Street 2"));

        // Re-sent prompt with the same callback data (open-question decision).
        let sent = outbound.sent().await;
        let last = sent.last().expect("re-sent prompt");
        assert!(last.text.contains("Street 2"));
        assert!(
            last.callback_data()
                .contains(&format!("confirm_order_q1_{order_id}"))
        );
    }

    #[tokio::test]
    async fn plain_text_is_not_consumed_without_the_flag() {
        let (flow, _gateway, _sessions, _outbound) = authenticated_flow().await;
        let consumed = flow
            .capture_address(ChatId(1), "hello there")
            .await
            .expect("capture check");
        assert!(!consumed);
    }
}
