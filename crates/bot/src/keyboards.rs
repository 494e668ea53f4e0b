//! Reply and inline keyboards for the storefront bot.

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    WebAppInfo,
};

use samovar_core::{OrderId, UserRole};

use crate::callback::CallbackAction;
use crate::config::BotConfig;

pub const BTN_CONTACTS: &str = "📞 Contacts";
pub const BTN_ABOUT: &str = "ℹ️ About us";
pub const BTN_LOGIN: &str = "🚀 Log in";
pub const BTN_SHOP: &str = "🛍 Open the shop";
pub const BTN_ADMIN_PANEL: &str = "⚙️ Admin panel";
pub const BTN_ADMIN_STATS: &str = "📊 Statistics";
pub const BTN_LOGOUT: &str = "🚪 Log out";

fn web_app_button(text: &str, config: &BotConfig, path: &str) -> KeyboardButton {
    KeyboardButton::new(text).request(ButtonRequest::WebApp(WebAppInfo {
        url: config.web_app_page(path),
    }))
}

/// Keyboard for chats without a session: contacts, about, login form.
#[must_use]
pub fn guest_keyboard(config: &BotConfig) -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![
            KeyboardButton::new(BTN_CONTACTS),
            KeyboardButton::new(BTN_ABOUT),
        ],
        vec![web_app_button(BTN_LOGIN, config, "form")],
    ])
    .resize_keyboard()
}

/// Keyboard for an authenticated chat, shaped by the account role.
#[must_use]
pub fn role_keyboard(role: UserRole, config: &BotConfig) -> KeyboardMarkup {
    let rows = match role {
        UserRole::Admin => vec![
            vec![web_app_button(BTN_ADMIN_PANEL, config, "admin")],
            vec![web_app_button(BTN_ADMIN_STATS, config, "stats")],
            vec![KeyboardButton::new(BTN_LOGOUT)],
        ],
        UserRole::User => vec![
            vec![web_app_button(BTN_SHOP, config, "")],
            vec![KeyboardButton::new(BTN_LOGOUT)],
        ],
    };
    KeyboardMarkup::new(rows).resize_keyboard()
}

/// Inline confirm / change-address prompt attached to the order summary.
#[must_use]
pub fn confirmation_keyboard(
    query_id: &str,
    order_id: Option<OrderId>,
    chat_id: teloxide::types::ChatId,
) -> InlineKeyboardMarkup {
    let confirm = CallbackAction::ConfirmOrder {
        query_id: query_id.to_owned(),
        order_id,
    };
    let change = CallbackAction::ChangeAddress { chat_id };
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Confirm order", confirm.encode()),
        InlineKeyboardButton::callback("✏️ Change address", change.encode()),
    ]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::{ChatId, InlineKeyboardButtonKind};
    use url::Url;

    #[test]
    fn confirmation_keyboard_carries_callback_data() {
        let keyboard = confirmation_keyboard("q1", Some(OrderId::new(5)), ChatId(1));
        let data: Vec<String> = keyboard
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(data, vec!["confirm_order_q1_5", "change_address_1"]);
    }

    #[test]
    fn guest_keyboard_links_to_login_form() {
        let config = BotConfig::new(Url::parse("https://shop.example.com/").expect("url"));
        let keyboard = guest_keyboard(&config);
        assert_eq!(keyboard.keyboard.len(), 2);
    }
}
