//! Samovar server binary.
//!
//! Boots the REST API and the Telegram dispatcher in one process: the two
//! share the session store, the order gateway, and the query cache, so a
//! cart submitted over HTTP lands in the same confirmation flow the bot's
//! callbacks drive.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use teloxide::Bot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use samovar_bot::config::BotConfig;
use samovar_bot::gateway::OrderGateway;
use samovar_bot::orchestrator::ConfirmationFlow;
use samovar_bot::outbound::{Messenger, TelegramMessenger};
use samovar_bot::session::{InMemorySessionStore, SessionStore};
use samovar_server::cache::QueryCache;
use samovar_server::config::ServerConfig;
use samovar_server::db::{self, PgOrderRepo, PgProductRepo, PgProductTypeRepo, PgUserRepo};
use samovar_server::gateway::RepoOrderGateway;
use samovar_server::routes;
use samovar_server::state::{AppState, Services};

/// Initialize Sentry error tracking and return a guard that must be kept
/// alive for the process lifetime.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Sentry must initialize before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "samovar_server=info,samovar_bot=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let cache = QueryCache::in_memory();
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let orders = Arc::new(PgOrderRepo::new(pool.clone()));
    let gateway: Arc<dyn OrderGateway> =
        Arc::new(RepoOrderGateway::new(orders.clone(), cache.clone()));

    let bot = Bot::new(config.telegram_token.expose_secret());
    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(bot.clone()));
    let flow = Arc::new(ConfirmationFlow::new(
        gateway,
        sessions.clone(),
        messenger,
    ));

    let app_state = AppState::new(Services {
        products: Arc::new(PgProductRepo::new(pool.clone())),
        product_types: Arc::new(PgProductTypeRepo::new(pool.clone())),
        orders,
        users: Arc::new(PgUserRepo::new(pool)),
        cache,
        sessions: sessions.clone(),
        flow: flow.clone(),
    });

    let bot_config = Arc::new(BotConfig::new(config.web_app_url.clone()));
    tokio::spawn(samovar_bot::runner::dispatch(
        bot,
        bot_config,
        sessions,
        flow,
    ));

    let app = routes::router(app_state);
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Server started on {addr}");
    tracing::info!("WebApp URL: {}", config.web_app_url);

    axum::serve(listener, app).await.expect("Server error");
}
