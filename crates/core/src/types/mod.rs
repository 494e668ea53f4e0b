//! Core types for Samovar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use cart::CartItem;
pub use id::*;
pub use order::{NewOrder, NewOrderItem, PlacedOrder};
pub use price::Price;
pub use status::*;
