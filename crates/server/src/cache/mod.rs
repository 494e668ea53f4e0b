//! Read-through cache layer for list/detail queries.
//!
//! The cache is an optimization layer, not a consistency boundary: every
//! failure path degrades to the source of truth. Writes invalidate a whole
//! resource prefix before the HTTP response goes out, so a client reading
//! right after a successful write never sees cached-stale data.

mod keys;
mod store;

pub use keys::cache_key;
pub use store::{CacheBackend, CacheError, MokaBackend, QueryCache};

use std::time::Duration;

/// Cache namespace for product list/detail entries.
pub const PRODUCTS_PREFIX: &str = "products";
/// Cache namespace for product-type entries.
pub const TYPES_PREFIX: &str = "types";
/// Cache namespace for order entries.
pub const ORDERS_PREFIX: &str = "orders";
/// Cache namespace for user-listing entries.
pub const USERS_PREFIX: &str = "users";

/// TTL for list queries and order details.
pub const TTL_LIST: Duration = Duration::from_secs(3600);
/// TTL for a single product detail.
pub const TTL_PRODUCT_DETAIL: Duration = Duration::from_secs(7200);
