//! Dispatcher wiring for the Telegram transport.

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::info;

use crate::config::BotConfig;
use crate::handlers::{self, Command};
use crate::orchestrator::ConfirmationFlow;
use crate::session::SessionStore;

/// The update-handling tree: callbacks, commands, then plain messages.
#[must_use]
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handlers::handle_command),
                )
                .endpoint(handlers::handle_message),
        )
}

/// Run the long-polling dispatcher until shutdown.
pub async fn dispatch(
    bot: Bot,
    config: Arc<BotConfig>,
    sessions: Arc<dyn SessionStore>,
    flow: Arc<ConfirmationFlow>,
) {
    info!("Telegram dispatcher starting");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![config, sessions, flow])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
