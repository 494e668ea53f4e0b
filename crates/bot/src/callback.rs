//! Inline-keyboard callback data codec.
//!
//! Wire format, kept compatible with the Mini App:
//!
//! ```text
//! confirm_order_<queryId>_<orderId|nodb>
//! change_address_<chatId>
//! ```
//!
//! The order id is the *last* `_`-separated segment so that query ids
//! containing underscores still parse.

use teloxide::types::ChatId;

use samovar_core::OrderId;

const CONFIRM_PREFIX: &str = "confirm_order_";
const CHANGE_ADDRESS_PREFIX: &str = "change_address_";

/// Marker used in place of an order id when persistence was unavailable.
pub const NO_DB_MARKER: &str = "nodb";

/// A parsed inline-keyboard action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// User tapped "confirm" on the order prompt.
    ConfirmOrder {
        query_id: String,
        /// `None` when the order was never durably recorded.
        order_id: Option<OrderId>,
    },
    /// User asked to correct the delivery address.
    ChangeAddress { chat_id: ChatId },
}

impl CallbackAction {
    /// Serialize to the callback-data wire format.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::ConfirmOrder { query_id, order_id } => {
                let order = order_id.map_or_else(|| NO_DB_MARKER.to_owned(), |id| id.to_string());
                format!("{CONFIRM_PREFIX}{query_id}_{order}")
            }
            Self::ChangeAddress { chat_id } => format!("{CHANGE_ADDRESS_PREFIX}{}", chat_id.0),
        }
    }

    /// Parse callback data; `None` for anything this bot did not emit.
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(rest) = data.strip_prefix(CONFIRM_PREFIX) {
            let (query_id, order) = rest.rsplit_once('_')?;
            let order_id = if order == NO_DB_MARKER {
                None
            } else {
                Some(order.parse::<OrderId>().ok()?)
            };
            return Some(Self::ConfirmOrder {
                query_id: query_id.to_owned(),
                order_id,
            });
        }
        if let Some(rest) = data.strip_prefix(CHANGE_ADDRESS_PREFIX) {
            return Some(Self::ChangeAddress {
                chat_id: ChatId(rest.parse::<i64>().ok()?),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_round_trips() {
        let action = CallbackAction::ConfirmOrder {
            query_id: "q1".to_owned(),
            order_id: Some(OrderId::new(5)),
        };
        assert_eq!(action.encode(), "confirm_order_q1_5");
        assert_eq!(CallbackAction::parse("confirm_order_q1_5"), Some(action));
    }

    #[test]
    fn confirm_without_persisted_order_uses_marker() {
        let action = CallbackAction::ConfirmOrder {
            query_id: "q1".to_owned(),
            order_id: None,
        };
        assert_eq!(action.encode(), "confirm_order_q1_nodb");
        assert_eq!(CallbackAction::parse("confirm_order_q1_nodb"), Some(action));
    }

    #[test]
    fn query_ids_with_underscores_survive() {
        let action = CallbackAction::ConfirmOrder {
            query_id: "AAF3_q_9".to_owned(),
            order_id: Some(OrderId::new(12)),
        };
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
    }

    #[test]
    fn change_address_round_trips() {
        let action = CallbackAction::ChangeAddress {
            chat_id: ChatId(123_456),
        };
        assert_eq!(action.encode(), "change_address_123456");
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
    }

    #[test]
    fn foreign_data_is_rejected() {
        assert_eq!(CallbackAction::parse("confirm_order_"), None);
        assert_eq!(CallbackAction::parse("confirm_order_q1_abc"), None);
        assert_eq!(CallbackAction::parse("change_address_abc"), None);
        assert_eq!(CallbackAction::parse("something_else"), None);
    }
}
