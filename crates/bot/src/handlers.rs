//! Update handlers for the storefront bot.
//!
//! One message handler and one callback handler, mirroring the shape of
//! the conversational flow: login handoff from the Mini App, menu
//! buttons, address capture, and the confirm / change-address callbacks.

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MessageKind;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::callback::CallbackAction;
use crate::config::BotConfig;
use crate::keyboards::{self, BTN_ABOUT, BTN_CONTACTS, BTN_LOGOUT};
use crate::orchestrator::ConfirmationFlow;
use crate::session::{ChatSession, SessionStore, SessionUser};

const CONTACTS_TEXT: &str = "📱 Our contacts:\n\n• Phone: +1 (999) 123-45-67\n• Email: info@samovar.example\n• Address: 123 Sample Street";
const ABOUT_TEXT: &str =
    "🏢 About us:\n\nThe best shop in town — quality goods, fast delivery, great service.";

/// Commands the bot understands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "Show the keyboard and main menu.")]
    Start,
    #[command(description = "Show the main menu.")]
    Menu,
    #[command(description = "Show the number of active sessions.")]
    Sessions,
    #[command(description = "Log out of the shop.")]
    Logout,
}

fn main_menu_text(session: &ChatSession) -> String {
    let mut text = "Main menu\n\n".to_owned();
    match session.user.role {
        samovar_core::UserRole::Admin => {
            text.push_str("You are an administrator.\nUse the buttons below to manage the shop.");
        }
        samovar_core::UserRole::User => {
            text.push_str("Use the buttons below to browse the shop.");
        }
    }
    text
}

/// Handle a `/`-command.
///
/// # Errors
///
/// Returns an error when a Telegram API call fails.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    sessions: Arc<dyn SessionStore>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let session = sessions.get(chat_id).await;

    match cmd {
        Command::Start => {
            if let Some(session) = session {
                bot.send_message(chat_id, main_menu_text(&session))
                    .reply_markup(keyboards::role_keyboard(session.user.role, &config))
                    .await?;
            } else {
                bot.send_message(chat_id, "Use the buttons below:")
                    .reply_markup(keyboards::guest_keyboard(&config))
                    .await?;
            }
        }
        Command::Menu => {
            if let Some(session) = session {
                bot.send_message(chat_id, main_menu_text(&session)).await?;
            }
        }
        Command::Sessions => {
            if session.is_some() {
                let count = sessions.count().await;
                bot.send_message(chat_id, format!("Active sessions: {count}"))
                    .await?;
            }
        }
        Command::Logout => {
            logout(&bot, chat_id, &sessions, &config).await?;
        }
    }
    Ok(())
}

/// Handle a non-command message: web-app login handoff, armed address
/// capture, then menu buttons.
///
/// # Errors
///
/// Returns an error when a Telegram API call fails.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    sessions: Arc<dyn SessionStore>,
    flow: Arc<ConfirmationFlow>,
    config: Arc<BotConfig>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    if let MessageKind::WebAppData(payload) = &msg.kind {
        return handle_web_app_login(&bot, chat_id, &payload.web_app_data.data, &sessions, &config)
            .await;
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    // An armed address capture swallows the message before any menu match.
    match flow.capture_address(chat_id, text).await {
        Ok(true) => return Ok(()),
        Ok(false) => {}
        Err(e) => {
            warn!(chat_id = chat_id.0, error = %e, "address capture failed");
            return Ok(());
        }
    }

    match text {
        BTN_CONTACTS => {
            bot.send_message(chat_id, CONTACTS_TEXT).await?;
        }
        BTN_ABOUT => {
            bot.send_message(chat_id, ABOUT_TEXT).await?;
        }
        BTN_LOGOUT => {
            if sessions.get(chat_id).await.is_some() {
                logout(&bot, chat_id, &sessions, &config).await?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Handle an inline-keyboard callback from the confirmation prompt.
///
/// # Errors
///
/// Returns an error when a Telegram API call fails.
pub async fn handle_callback(bot: Bot, q: CallbackQuery, flow: Arc<ConfirmationFlow>) -> Result<()> {
    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(data) else {
        warn!(data, "unrecognized callback data");
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    let reply = match action {
        CallbackAction::ConfirmOrder { order_id, .. } => {
            flow.confirm(chat_id, message_id, order_id).await
        }
        CallbackAction::ChangeAddress { chat_id: target } => {
            flow.request_address_change(target).await
        }
    };

    match reply {
        Ok(text) => {
            bot.answer_callback_query(q.id.clone()).text(text).await?;
        }
        Err(e) => {
            warn!(chat_id = chat_id.0, error = %e, "callback handling failed");
            let _ = bot
                .answer_callback_query(q.id.clone())
                .text("Something went wrong, please try again.")
                .await;
        }
    }
    Ok(())
}

async fn handle_web_app_login(
    bot: &Bot,
    chat_id: ChatId,
    raw: &str,
    sessions: &Arc<dyn SessionStore>,
    config: &Arc<BotConfig>,
) -> Result<()> {
    match serde_json::from_str::<SessionUser>(raw) {
        Ok(user) => {
            info!(chat_id = chat_id.0, user_id = %user.id, "web-app login handoff");
            let role = user.role;
            let summary = login_summary(&user);
            sessions.insert(chat_id, ChatSession::new(user)).await;

            bot.send_message(chat_id, "Authorization successful!")
                .await?;
            bot.send_message(chat_id, summary)
                .reply_markup(keyboards::role_keyboard(role, config))
                .await?;
        }
        Err(e) => {
            error!(chat_id = chat_id.0, error = %e, "malformed web-app login payload");
            bot.send_message(chat_id, "Could not process the login data.")
                .await?;
        }
    }
    Ok(())
}

fn login_summary(user: &SessionUser) -> String {
    let mut summary = format!("Username: {}\nRole: {}", user.username, user.role);
    if let Some(email) = &user.email {
        summary.push_str(&format!("\nEmail: {email}"));
    }
    summary
}

async fn logout(
    bot: &Bot,
    chat_id: ChatId,
    sessions: &Arc<dyn SessionStore>,
    config: &Arc<BotConfig>,
) -> Result<()> {
    if sessions.remove(chat_id).await {
        bot.send_message(chat_id, "You have been logged out.")
            .reply_markup(keyboards::guest_keyboard(config))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use samovar_core::{UserId, UserRole};

    #[test]
    fn login_summary_includes_email_when_present() {
        let user = SessionUser {
            id: UserId::new(1),
            username: "alice".to_owned(),
            role: UserRole::Admin,
            email: Some("alice@example.com".to_owned()),
            address: None,
        };
        let summary = login_summary(&user);
        assert!(summary.contains("alice"));
        assert!(summary.contains("admin"));
        assert!(summary.contains("alice@example.com"));
    }
}
