//! Durable client-local cart storage.
//!
//! A [`CartSession`] hydrates once when opened and writes the whole cart back
//! after every mutation. Unreadable stored state is logged and replaced by an
//! empty cart rather than failing the session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use caliope_core::domain::cart::{Cart, CartLine};
use caliope_core::domain::catalog::{Product, ProductId};
use caliope_core::domain::order::{Order, OrderId};
use caliope_core::domain::user::UserId;
use caliope_core::errors::DomainError;

use crate::repositories::{OrderRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("cart storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cart could not be encoded: {0}")]
    Encode(String),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cannot check out an empty cart")]
    EmptyCart,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Store(#[from] CartStoreError),
}

/// Raw snapshot storage for one client's cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, CartStoreError>;
    async fn persist(&self, snapshot: &str) -> Result<(), CartStoreError>;
}

/// One JSON file per client session.
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CartStore for FileCartStore {
    async fn load(&self) -> Result<Option<String>, CartStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn persist(&self, snapshot: &str) -> Result<(), CartStoreError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write-then-rename so a crash never leaves a half-written cart.
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, snapshot).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCartStore {
    snapshot: RwLock<Option<String>>,
}

impl InMemoryCartStore {
    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self { snapshot: RwLock::new(Some(snapshot.into())) }
    }

    pub async fn snapshot(&self) -> Option<String> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self) -> Result<Option<String>, CartStoreError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn persist(&self, snapshot: &str) -> Result<(), CartStoreError> {
        *self.snapshot.write().await = Some(snapshot.to_string());
        Ok(())
    }
}

pub struct CartSession<S: CartStore> {
    store: S,
    cart: Cart,
}

impl<S: CartStore> CartSession<S> {
    pub async fn open(store: S) -> Self {
        let cart = match store.load().await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => Cart::from_lines(lines),
                Err(error) => {
                    warn!(
                        event_name = "cart.hydrate.corrupt",
                        error = %error,
                        "stored cart could not be parsed; starting empty"
                    );
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(error) => {
                warn!(
                    event_name = "cart.hydrate.unavailable",
                    error = %error,
                    "cart storage unreadable; starting empty"
                );
                Cart::new()
            }
        };

        Self { store, cart }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn add_item(&mut self, product: Product, quantity: u32) -> Result<(), CartStoreError> {
        self.cart.add_item(product, quantity);
        self.persist().await
    }

    pub async fn remove_item(&mut self, product_id: &ProductId) -> Result<(), CartStoreError> {
        self.cart.remove_item(product_id);
        self.persist().await
    }

    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<(), CartStoreError> {
        self.cart.update_quantity(product_id, quantity);
        self.persist().await
    }

    pub async fn clear(&mut self) -> Result<(), CartStoreError> {
        self.cart.clear();
        self.persist().await
    }

    /// Places a `pending_payment` order from the current lines, then empties the cart.
    pub async fn checkout(
        &mut self,
        orders: &dyn OrderRepository,
        order_id: OrderId,
        user_id: UserId,
        user_name: &str,
    ) -> Result<Order, CheckoutError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = Order::place(order_id, user_id, user_name, self.cart.order_items())?;
        orders.save(order.clone()).await?;
        self.clear().await?;

        tracing::info!(
            event_name = "cart.checkout.completed",
            order_id = %order.id.0,
            total = order.total,
            "cart checked out"
        );
        Ok(order)
    }

    async fn persist(&self) -> Result<(), CartStoreError> {
        let snapshot = serde_json::to_string(&self.cart)
            .map_err(|error| CartStoreError::Encode(error.to_string()))?;
        self.store.persist(&snapshot).await
    }
}
