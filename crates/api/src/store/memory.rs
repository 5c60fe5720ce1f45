//! In-memory store.
//!
//! Backs the test suites and local development without a database. All
//! writes for one call happen under a single lock, which trivially gives
//! the composite commits their all-or-nothing guarantee: versions are
//! validated first, mutations applied only after every check passed.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use async_trait::async_trait;

use laceup_core::{CartId, Email, OrderId, ShoeId, UserId};

use crate::models::{AuthSession, Cart, Order, Shoe, User};

use super::{OrderFilter, Store, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    shoes: HashMap<ShoeId, Shoe>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
    users: HashMap<UserId, User>,
    sessions: HashMap<String, AuthSession>,
}

/// Thread-safe in-memory aggregate store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Validate a compare-and-swap write against the stored copy.
fn check_version(stored: Option<u64>, incoming: u64, entity: &'static str) -> StoreResult<()> {
    match stored {
        Some(v) if v == incoming => Ok(()),
        _ => Err(StoreError::VersionConflict { entity }),
    }
}

fn stage_shoe(inner: &Inner, shoe: &Shoe) -> StoreResult<Shoe> {
    check_version(
        inner.shoes.get(&shoe.id).map(|s| s.version),
        shoe.version,
        "shoe",
    )?;
    let mut next = shoe.clone();
    next.version += 1;
    Ok(next)
}

fn stage_order(inner: &Inner, order: &Order) -> StoreResult<Order> {
    check_version(
        inner.orders.get(&order.id).map(|o| o.version),
        order.version,
        "order",
    )?;
    let mut next = order.clone();
    next.version += 1;
    Ok(next)
}

/// Stage a cart write: version 0 means insert (cart-per-user uniqueness
/// enforced here), anything else is a compare-and-swap update.
fn stage_cart(inner: &Inner, cart: &Cart) -> StoreResult<Cart> {
    if cart.version == 0 {
        if inner.carts.values().any(|c| c.user_id == cart.user_id) {
            return Err(StoreError::AlreadyExists { entity: "cart" });
        }
    } else {
        check_version(
            inner.carts.get(&cart.id).map(|c| c.version),
            cart.version,
            "cart",
        )?;
    }
    let mut next = cart.clone();
    next.version += 1;
    Ok(next)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_shoe(&self, shoe: &Shoe) -> StoreResult<()> {
        let mut inner = self.write();
        let taken = inner.shoes.values().any(|s| {
            s.id == shoe.id
                || (s.brand.eq_ignore_ascii_case(&shoe.brand)
                    && s.model.eq_ignore_ascii_case(&shoe.model))
        });
        if taken {
            return Err(StoreError::AlreadyExists { entity: "shoe" });
        }
        let mut next = shoe.clone();
        next.version = 1;
        inner.shoes.insert(next.id, next);
        Ok(())
    }

    async fn shoe(&self, id: ShoeId) -> StoreResult<Option<Shoe>> {
        Ok(self.read().shoes.get(&id).cloned())
    }

    async fn shoes(&self) -> StoreResult<Vec<Shoe>> {
        let mut shoes: Vec<Shoe> = self.read().shoes.values().cloned().collect();
        shoes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shoes)
    }

    async fn shoe_by_brand_model(&self, brand: &str, model: &str) -> StoreResult<Option<Shoe>> {
        Ok(self
            .read()
            .shoes
            .values()
            .find(|s| s.brand.eq_ignore_ascii_case(brand) && s.model.eq_ignore_ascii_case(model))
            .cloned())
    }

    async fn update_shoe(&self, shoe: &Shoe) -> StoreResult<()> {
        let mut inner = self.write();
        let next = stage_shoe(&inner, shoe)?;
        inner.shoes.insert(next.id, next);
        Ok(())
    }

    async fn delete_shoe(&self, id: ShoeId) -> StoreResult<bool> {
        Ok(self.write().shoes.remove(&id).is_some())
    }

    async fn cart_for_user(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        Ok(self
            .read()
            .carts
            .values()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn write_cart(&self, cart: &Cart) -> StoreResult<()> {
        let mut inner = self.write();
        let next = stage_cart(&inner, cart)?;
        inner.carts.insert(next.id, next);
        Ok(())
    }

    async fn order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read().orders.get(&id).cloned())
    }

    async fn orders(&self, filter: OrderFilter) -> StoreResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read()
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let mut inner = self.write();
        let next = stage_order(&inner, order)?;
        inner.orders.insert(next.id, next);
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut inner = self.write();
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::AlreadyExists { entity: "user" });
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read().users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &Email) -> StoreResult<Option<User>> {
        Ok(self
            .read()
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.email.as_str().cmp(b.email.as_str()));
        Ok(users)
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.write().users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        Ok(self.write().users.remove(&id).is_some())
    }

    async fn insert_session(&self, session: &AuthSession) -> StoreResult<()> {
        self.write()
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn session_by_token(&self, token: &str) -> StoreResult<Option<AuthSession>> {
        Ok(self.read().sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> StoreResult<bool> {
        Ok(self.write().sessions.remove(token).is_some())
    }

    async fn commit_cart_mutation(&self, shoe: &Shoe, cart: &Cart) -> StoreResult<()> {
        let mut inner = self.write();
        let next_shoe = stage_shoe(&inner, shoe)?;
        let next_cart = stage_cart(&inner, cart)?;
        inner.shoes.insert(next_shoe.id, next_shoe);
        inner.carts.insert(next_cart.id, next_cart);
        Ok(())
    }

    async fn commit_checkout(&self, cart: &Cart, order: &Order) -> StoreResult<()> {
        let mut inner = self.write();
        let next_cart = stage_cart(&inner, cart)?;
        if inner.orders.contains_key(&order.id) {
            return Err(StoreError::AlreadyExists { entity: "order" });
        }
        let mut next_order = order.clone();
        next_order.version = 1;
        inner.carts.insert(next_cart.id, next_cart);
        inner.orders.insert(next_order.id, next_order);
        Ok(())
    }

    async fn commit_order_creation(&self, shoes: &[Shoe], order: &Order) -> StoreResult<()> {
        let mut inner = self.write();
        let staged: Vec<Shoe> = shoes
            .iter()
            .map(|s| stage_shoe(&inner, s))
            .collect::<StoreResult<_>>()?;
        if inner.orders.contains_key(&order.id) {
            return Err(StoreError::AlreadyExists { entity: "order" });
        }
        let mut next_order = order.clone();
        next_order.version = 1;
        for shoe in staged {
            inner.shoes.insert(shoe.id, shoe);
        }
        inner.orders.insert(next_order.id, next_order);
        Ok(())
    }

    async fn commit_order_update(&self, shoes: &[Shoe], order: &Order) -> StoreResult<()> {
        let mut inner = self.write();
        let staged: Vec<Shoe> = shoes
            .iter()
            .map(|s| stage_shoe(&inner, s))
            .collect::<StoreResult<_>>()?;
        let next_order = stage_order(&inner, order)?;
        for shoe in staged {
            inner.shoes.insert(shoe.id, shoe);
        }
        inner.orders.insert(next_order.id, next_order);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use laceup_core::Price;

    #[tokio::test]
    async fn versioned_update_detects_conflict() {
        let store = MemoryStore::new();
        let shoe = Shoe::new("Apex", "Runner 2", Price::from_cents(12999));
        store.insert_shoe(&shoe).await.unwrap();

        // First writer wins.
        let mut first = store.shoe(shoe.id).await.unwrap().unwrap();
        let second = first.clone();
        first.touch();
        store.update_shoe(&first).await.unwrap();

        // Second writer holds a stale version.
        let err = store.update_shoe(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { entity: "shoe" }));
    }

    #[tokio::test]
    async fn one_cart_per_user() {
        let store = MemoryStore::new();
        let shoe = Shoe::new("Apex", "Runner 2", Price::from_cents(12999));
        store.insert_shoe(&shoe).await.unwrap();
        let shoe = store.shoe(shoe.id).await.unwrap().unwrap();

        let user = UserId::generate();
        let cart = Cart::new(user);
        store.commit_cart_mutation(&shoe, &cart).await.unwrap();

        let shoe = store.shoe(shoe.id).await.unwrap().unwrap();
        let duplicate = Cart::new(user);
        let err = store
            .commit_cart_mutation(&shoe, &duplicate)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { entity: "cart" }));
    }

    #[tokio::test]
    async fn composite_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        let good = Shoe::new("Apex", "Runner 2", Price::from_cents(12999));
        store.insert_shoe(&good).await.unwrap();
        let good = store.shoe(good.id).await.unwrap().unwrap();

        // A shoe that was never inserted fails its version check.
        let missing = Shoe::new("Apex", "Ghost", Price::from_cents(9999));
        let order = Order::new(UserId::generate(), Vec::new());

        let err = store
            .commit_order_creation(&[good.clone(), missing], &order)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));

        // Nothing landed: the good shoe kept its version, no order exists.
        let reread = store.shoe(good.id).await.unwrap().unwrap();
        assert_eq!(reread.version, good.version);
        assert!(store.order(order.id).await.unwrap().is_none());
    }
}
