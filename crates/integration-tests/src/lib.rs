//! Test support for the workspace integration tests.
//!
//! Builds the full application — router, cache, confirmation flow — over
//! in-memory repositories with call counters, so the read-through cache
//! contract and the checkout flow are observable without Postgres or a
//! bot token.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tower::ServiceExt;

use samovar_bot::orchestrator::ConfirmationFlow;
use samovar_bot::session::{ChatSession, InMemorySessionStore, SessionStore, SessionUser};
use samovar_bot::testing::RecordingMessenger;
use samovar_core::{
    NewOrder, OrderId, OrderItemId, OrderStatus, Price, ProductId, ProductTypeId, UserId, UserRole,
};
use samovar_server::cache::QueryCache;
use samovar_server::db::{
    NewProduct, NewUser, OrderQuery, OrderRepo, ProductQuery, ProductRepo, ProductTypeQuery,
    ProductTypeRepo, RepositoryError, UpdateProduct, UserQuery, UserRepo,
};
use samovar_server::gateway::RepoOrderGateway;
use samovar_server::models::{
    Order, OrderItem, OrderPage, OrderWithItems, Product, ProductPage, ProductType,
    ProductTypePage, PublicUser, User, UserPage,
};
use samovar_server::routes;
use samovar_server::state::{AppState, Services};

/// A fully wired application over in-memory collaborators, with handles
/// for assertions.
pub struct TestApp {
    pub router: Router,
    pub products: Arc<InMemoryProductRepo>,
    pub product_types: Arc<InMemoryProductTypeRepo>,
    pub orders: Arc<InMemoryOrderRepo>,
    pub users: Arc<InMemoryUserRepo>,
    pub sessions: Arc<InMemorySessionStore>,
    pub outbound: Arc<RecordingMessenger>,
    pub cache: QueryCache,
}

impl TestApp {
    /// Application over a working in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cache(QueryCache::in_memory())
    }

    /// Application over the given cache (e.g. one with a failing backend).
    #[must_use]
    pub fn with_cache(cache: QueryCache) -> Self {
        let products = Arc::new(InMemoryProductRepo::default());
        let product_types = Arc::new(InMemoryProductTypeRepo::default());
        let orders = Arc::new(InMemoryOrderRepo::default());
        let users = Arc::new(InMemoryUserRepo::default());
        let sessions = Arc::new(InMemorySessionStore::new());
        let (outbound, messenger) = RecordingMessenger::shared();

        let gateway = Arc::new(RepoOrderGateway::new(
            orders.clone() as Arc<dyn OrderRepo>,
            cache.clone(),
        ));
        let flow = Arc::new(ConfirmationFlow::new(
            gateway,
            sessions.clone() as Arc<dyn SessionStore>,
            messenger,
        ));

        let state = AppState::new(Services {
            products: products.clone(),
            product_types: product_types.clone(),
            orders: orders.clone(),
            users: users.clone(),
            cache: cache.clone(),
            sessions: sessions.clone(),
            flow,
        });

        Self {
            router: routes::router(state),
            products,
            product_types,
            orders,
            users,
            sessions,
            outbound,
            cache,
        }
    }

    /// Authenticate `chat_id` as a storefront user with `address`.
    pub async fn authenticate(&self, chat_id: i64, user_id: i32, address: &str) {
        self.sessions
            .insert(
                ChatId(chat_id),
                ChatSession::new(SessionUser {
                    id: UserId::new(user_id),
                    username: format!("user{user_id}"),
                    role: UserRole::User,
                    email: None,
                    address: Some(address.to_owned()),
                }),
            )
            .await;
    }

    /// `GET` a JSON endpoint.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    /// Send a JSON body with the given method.
    pub async fn send_json(&self, method: &str, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a catalogue product for seeding.
#[must_use]
pub fn product(id: i32, name: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: format!("{name} description"),
        rating: 0.0,
        price: Price::from(price),
        in_stock: true,
        img: String::new(),
        product_type_id: None,
        created_at: Utc::now(),
    }
}

// ---------------------------------------------------------------------------
// In-memory repositories
// ---------------------------------------------------------------------------

/// In-memory [`ProductRepo`] counting source-of-truth reads.
#[derive(Default)]
pub struct InMemoryProductRepo {
    rows: Mutex<Vec<Product>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl InMemoryProductRepo {
    /// Seed a product as-is, keeping generated ids clear of seeded ones.
    pub async fn seed(&self, product: Product) {
        let id = usize::try_from(product.id.as_i32()).unwrap_or(0);
        self.next_id.fetch_max(id, Ordering::SeqCst);
        self.rows.lock().await.push(product);
    }

    /// How many times `list` hit this repository.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// How many times `get` hit this repository.
    #[must_use]
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

fn page_slice<T: Clone>(rows: &[T], page: i64, limit: i64) -> Vec<T> {
    let start = usize::try_from((page - 1).max(0) * limit).unwrap_or(0);
    rows.iter().skip(start).take(usize::try_from(limit).unwrap_or(0)).cloned().collect()
}

#[async_trait]
impl ProductRepo for InMemoryProductRepo {
    async fn list(&self, query: &ProductQuery) -> Result<ProductPage, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let filtered: Vec<Product> = rows
            .iter()
            .filter(|p| {
                query
                    .product_type_id
                    .is_none_or(|t| p.product_type_id == Some(t))
            })
            .filter(|p| {
                query.search.as_ref().is_none_or(|s| {
                    p.name.to_lowercase().contains(&s.to_lowercase())
                        || p.description.to_lowercase().contains(&s.to_lowercase())
                })
            })
            .cloned()
            .collect();
        let count = i64::try_from(filtered.len()).unwrap_or(0);
        Ok(ProductPage {
            count,
            rows: page_slice(&filtered, query.page, query.limit),
        })
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rows.lock().await.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = Product {
            id: ProductId::new(i32::try_from(id).unwrap_or(i32::MAX)),
            name: new.name,
            description: new.description,
            rating: 0.0,
            price: new.price,
            in_stock: new.in_stock,
            img: new.img,
            product_type_id: new.product_type_id,
            created_at: Utc::now(),
        };
        self.rows.lock().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: ProductId, update: UpdateProduct) -> Result<Product, RepositoryError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.name = update.name;
        row.description = update.description;
        row.price = update.price;
        row.in_stock = update.in_stock;
        if let Some(img) = update.img {
            row.img = img;
        }
        row.product_type_id = update.product_type_id;
        Ok(row.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        if rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// In-memory [`ProductTypeRepo`] counting source-of-truth reads.
#[derive(Default)]
pub struct InMemoryProductTypeRepo {
    rows: Mutex<Vec<ProductType>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
}

impl InMemoryProductTypeRepo {
    /// Seed a type by name.
    pub async fn seed(&self, name: &str) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.lock().await.push(ProductType {
            id: ProductTypeId::new(i32::try_from(id).unwrap_or(i32::MAX)),
            name: name.to_owned(),
        });
    }

    /// How many times `list` hit this repository.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductTypeRepo for InMemoryProductTypeRepo {
    async fn list(&self, query: &ProductTypeQuery) -> Result<ProductTypePage, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let filtered: Vec<ProductType> = rows
            .iter()
            .filter(|t| {
                query
                    .search
                    .as_ref()
                    .is_none_or(|s| t.name.to_lowercase().contains(&s.to_lowercase()))
            })
            .cloned()
            .collect();
        Ok(ProductTypePage {
            count: i64::try_from(filtered.len()).unwrap_or(0),
            rows: filtered,
        })
    }

    async fn create(&self, name: &str) -> Result<ProductType, RepositoryError> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|t| t.name == name) {
            return Err(RepositoryError::Conflict(format!(
                "type {name} already exists"
            )));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = ProductType {
            id: ProductTypeId::new(i32::try_from(id).unwrap_or(i32::MAX)),
            name: name.to_owned(),
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn rename(&self, id: ProductTypeId, name: &str) -> Result<ProductType, RepositoryError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.name = name.to_owned();
        Ok(row.clone())
    }

    async fn delete(&self, id: ProductTypeId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|t| t.id != id);
        if rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// In-memory [`OrderRepo`] counting source-of-truth reads, with an
/// unavailability switch for degraded-mode tests.
#[derive(Default)]
pub struct InMemoryOrderRepo {
    rows: Mutex<Vec<OrderWithItems>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
    unavailable: Mutex<bool>,
}

impl InMemoryOrderRepo {
    /// How many times `list` hit this repository.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent mutation fail like a dead database.
    pub async fn go_offline(&self) {
        *self.unavailable.lock().await = true;
    }

    /// All orders currently stored.
    pub async fn all(&self) -> Vec<OrderWithItems> {
        self.rows.lock().await.clone()
    }

    async fn ensure_online(&self) -> Result<(), RepositoryError> {
        if *self.unavailable.lock().await {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepo for InMemoryOrderRepo {
    async fn list(&self, query: &OrderQuery) -> Result<OrderPage, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let id_filter: Option<i32> = query.search.as_ref().and_then(|s| s.parse().ok());
        let filtered: Vec<OrderWithItems> = rows
            .iter()
            .filter(|o| query.status.is_none_or(|s| o.order.status == s))
            .filter(|o| query.user_id.is_none_or(|u| o.order.user_id == Some(u)))
            .filter(|o| id_filter.is_none_or(|id| o.order.id.as_i32() == id))
            .cloned()
            .collect();
        let total_count = i64::try_from(filtered.len()).unwrap_or(0);
        Ok(OrderPage {
            orders: page_slice(&filtered, query.page, query.limit),
            total_pages: (total_count as u64).div_ceil(query.limit.max(1) as u64) as i64,
            current_page: query.page,
            total_count,
        })
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderWithItems>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|o| o.order.id == id)
            .cloned())
    }

    async fn create(&self, order: NewOrder) -> Result<OrderWithItems, RepositoryError> {
        self.ensure_online().await?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let order_id = OrderId::new(i32::try_from(id).unwrap_or(i32::MAX));
        let items = order
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| OrderItem {
                id: OrderItemId::new(i32::try_from(index).unwrap_or(0) + 1),
                order_id,
                product_id: item.product_id,
                quantity: i32::try_from(item.quantity).unwrap_or(0),
                price: item.price,
                product_name: format!("product {}", item.product_id),
            })
            .collect();
        let created = OrderWithItems {
            order: Order {
                id: order_id,
                date: Utc::now(),
                status: OrderStatus::Pending,
                total_amount: order.total_amount,
                shipping_address: order.shipping_address,
                user_id: order.user_id,
                qr_code_file_name: None,
            },
            items,
        };
        self.rows.lock().await.push(created.clone());
        Ok(created)
    }

    async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.ensure_online().await?;
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|o| o.order.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.order.status = status;
        Ok(row.order.clone())
    }

    async fn update_shipping_address(
        &self,
        id: OrderId,
        address: &str,
    ) -> Result<(), RepositoryError> {
        self.ensure_online().await?;
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|o| o.order.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.order.shipping_address = address.to_owned();
        Ok(())
    }
}

/// In-memory [`UserRepo`] counting source-of-truth reads.
#[derive(Default)]
pub struct InMemoryUserRepo {
    rows: Mutex<Vec<User>>,
    next_id: AtomicUsize,
    list_calls: AtomicUsize,
}

impl InMemoryUserRepo {
    /// How many times `list` hit this repository.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn list(&self, query: &UserQuery) -> Result<UserPage, RepositoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        let filtered: Vec<PublicUser> = rows
            .iter()
            .filter(|u| {
                query.search.as_ref().is_none_or(|s| {
                    u.username.to_lowercase().contains(&s.to_lowercase())
                        || u.email.to_lowercase().contains(&s.to_lowercase())
                })
            })
            .cloned()
            .map(PublicUser::from)
            .collect();
        Ok(UserPage {
            count: i64::try_from(filtered.len()).unwrap_or(0),
            rows: filtered,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut rows = self.rows.lock().await;
        if rows
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RepositoryError::Conflict("user already exists".to_owned()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let created = User {
            id: UserId::new(i32::try_from(id).unwrap_or(i32::MAX)),
            username: user.username,
            password_hash: user.password_hash,
            address: user.address,
            email: user.email,
            role: user.role,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> Result<PublicUser, RepositoryError> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.role = role;
        Ok(PublicUser::from(row.clone()))
    }
}
