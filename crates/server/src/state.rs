//! Application state shared across handlers.

use std::sync::Arc;

use samovar_bot::orchestrator::ConfirmationFlow;
use samovar_bot::session::SessionStore;

use crate::cache::QueryCache;
use crate::db::{OrderRepo, ProductRepo, ProductTypeRepo, UserRepo};

/// The state's collaborators, gathered so construction sites stay
/// readable.
pub struct Services {
    pub products: Arc<dyn ProductRepo>,
    pub product_types: Arc<dyn ProductTypeRepo>,
    pub orders: Arc<dyn OrderRepo>,
    pub users: Arc<dyn UserRepo>,
    pub cache: QueryCache,
    pub sessions: Arc<dyn SessionStore>,
    pub flow: Arc<ConfirmationFlow>,
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Repositories and the session store are
/// trait objects, so tests swap in in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Services>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            inner: Arc::new(services),
        }
    }

    /// Product repository.
    #[must_use]
    pub fn products(&self) -> &dyn ProductRepo {
        self.inner.products.as_ref()
    }

    /// Product-type repository.
    #[must_use]
    pub fn product_types(&self) -> &dyn ProductTypeRepo {
        self.inner.product_types.as_ref()
    }

    /// Order repository.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepo {
        self.inner.orders.as_ref()
    }

    /// User repository.
    #[must_use]
    pub fn users(&self) -> &dyn UserRepo {
        self.inner.users.as_ref()
    }

    /// Read-through query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    /// Chat session store shared with the bot.
    #[must_use]
    pub fn sessions(&self) -> &dyn SessionStore {
        self.inner.sessions.as_ref()
    }

    /// Order-confirmation orchestrator.
    #[must_use]
    pub fn flow(&self) -> &ConfirmationFlow {
        self.inner.flow.as_ref()
    }
}
