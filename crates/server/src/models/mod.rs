//! API-facing data models.
//!
//! JSON field names stay camelCase for compatibility with the Mini App
//! frontend; list responses keep the `{count, rows}` / paging shapes the
//! frontend already consumes. The same structs round-trip through the
//! cache, so everything here is `Serialize + Deserialize`.

pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, OrderPage, OrderWithItems};
pub use product::{Product, ProductPage, ProductType, ProductTypePage};
pub use user::{PublicUser, User, UserPage};
