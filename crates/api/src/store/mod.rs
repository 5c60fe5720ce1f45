//! Aggregate storage.
//!
//! Aggregates are read and written whole. Every versioned write is a
//! compare-and-swap on the aggregate's `version` counter; a mismatch
//! surfaces as [`StoreError::VersionConflict`] and the caller re-reads and
//! retries. Operations that span aggregates (cart + shoe, order + shoes)
//! go through the composite `commit_*` methods, which land completely or
//! not at all.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use laceup_core::{Email, OrderId, OrderStatus, ShoeId, UserId};

use crate::models::{AuthSession, Cart, Order, Shoe, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The aggregate was modified since it was read.
    #[error("version conflict writing {entity}")]
    VersionConflict {
        /// Human-readable aggregate name.
        entity: &'static str,
    },
    /// A uniqueness constraint was violated on insert.
    #[error("{entity} already exists")]
    AlreadyExists {
        /// Human-readable aggregate name.
        entity: &'static str,
    },
    /// A stored document could not be (de)serialized.
    #[error("corrupt document: {0}")]
    Corrupt(String),
    /// The underlying database failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias for [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for order queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    /// Restrict to one owner.
    pub user_id: Option<UserId>,
    /// Restrict to one status.
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    /// Whether an order passes the filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.is_none_or(|u| order.user_id == u)
            && self.status.is_none_or(|s| order.status == s)
    }
}

/// Aggregate store.
///
/// Insert semantics: the passed aggregate must have `version == 0`; the
/// store persists it at version 1. Update semantics: the stored version must
/// equal the passed aggregate's `version`; the store persists `version + 1`.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // Catalog ----------------------------------------------------------------

    async fn insert_shoe(&self, shoe: &Shoe) -> StoreResult<()>;
    async fn shoe(&self, id: ShoeId) -> StoreResult<Option<Shoe>>;
    /// All shoes, newest first. Filtering happens in the catalog service.
    async fn shoes(&self) -> StoreResult<Vec<Shoe>>;
    async fn shoe_by_brand_model(&self, brand: &str, model: &str) -> StoreResult<Option<Shoe>>;
    async fn update_shoe(&self, shoe: &Shoe) -> StoreResult<()>;
    async fn delete_shoe(&self, id: ShoeId) -> StoreResult<bool>;

    // Carts ------------------------------------------------------------------

    async fn cart_for_user(&self, user_id: UserId) -> StoreResult<Option<Cart>>;
    /// Cart-only versioned write, for mutations with no stock side effect
    /// (the backing catalog entry may be gone). Version 0 inserts.
    async fn write_cart(&self, cart: &Cart) -> StoreResult<()>;

    // Orders -----------------------------------------------------------------

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>>;
    /// Orders matching the filter, newest first.
    async fn orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>>;
    async fn update_order(&self, order: &Order) -> StoreResult<()>;

    // Users ------------------------------------------------------------------

    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>>;
    /// All users, ordered by email.
    async fn users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;

    // Sessions ---------------------------------------------------------------

    async fn insert_session(&self, session: &AuthSession) -> StoreResult<()>;
    async fn session_by_token(&self, token: &str) -> StoreResult<Option<AuthSession>>;
    async fn delete_session(&self, token: &str) -> StoreResult<bool>;

    // Composite atomic commits ----------------------------------------------

    /// Persist a shoe mutation and the cart mutation it belongs to as one
    /// unit. A cart at version 0 is inserted (enforcing cart-per-user
    /// uniqueness), otherwise updated.
    async fn commit_cart_mutation(&self, shoe: &Shoe, cart: &Cart) -> StoreResult<()>;

    /// Persist the cleared cart and the new order as one unit. Stock is not
    /// touched by checkout.
    async fn commit_checkout(&self, cart: &Cart, order: &Order) -> StoreResult<()>;

    /// Persist reservations across `shoes` and the new order as one unit.
    async fn commit_order_creation(&self, shoes: &[Shoe], order: &Order) -> StoreResult<()>;

    /// Persist releases across `shoes` and the order status write as one
    /// unit (cancel restock).
    async fn commit_order_update(&self, shoes: &[Shoe], order: &Order) -> StoreResult<()>;
}

/// Serialize an aggregate into a JSON document.
pub(crate) fn to_doc<T: serde::Serialize>(value: &T) -> StoreResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Deserialize an aggregate from a JSON document.
pub(crate) fn from_doc<T: serde::de::DeserializeOwned>(doc: serde_json::Value) -> StoreResult<T> {
    serde_json::from_value(doc).map_err(|e| StoreError::Corrupt(e.to_string()))
}
