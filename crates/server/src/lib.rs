//! Samovar server - REST API backend for the Telegram Mini App storefront.
//!
//! # Architecture
//!
//! - Axum JSON API for products, product types, orders and users
//! - `PostgreSQL` via sqlx repositories behind trait seams
//! - Read-through `moka` cache over every list/detail query, with
//!   coarse prefix invalidation on writes
//! - `POST /web-data` hands carts to the bot's confirmation orchestrator
//!
//! The binary in `main.rs` also hosts the Telegram long-polling
//! dispatcher; both sides share the in-process session store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::AppError;
pub use state::{AppState, Services};
