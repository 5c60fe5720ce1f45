//! Cart operations.
//!
//! Adding to a cart reserves stock immediately; the cart line and the
//! decremented shelf land in one composite commit. Checkout carves the cart
//! into a Pending order without touching stock, because the units were
//! already reserved at add time.

use serde::Deserialize;
use tracing::warn;

use laceup_core::{CartItemId, ColorId, ShoeId, ShoeSize, UserId};

use crate::error::{ApiError, Result};
use crate::models::{Cart, CartItem, Order};
use crate::store::{Store, StoreError};

use super::{item_context, stock, stock_error, MAX_RETRIES};

/// Request body for adding units to the cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItem {
    pub shoe_id: ShoeId,
    pub color_id: ColorId,
    pub size: ShoeSize,
    pub quantity: u32,
}

/// Cart business logic over a [`Store`].
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's cart, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.store.cart_for_user(user_id).await?)
    }

    /// Add units of a `(shoe, color, size)` choice, reserving stock.
    ///
    /// # Errors
    ///
    /// Rejects zero quantities, unknown catalog references and requests
    /// exceeding available stock.
    pub async fn add_item(&self, user_id: UserId, req: &AddCartItem) -> Result<Cart> {
        if req.quantity == 0 {
            return Err(ApiError::InvalidQuantity(
                "quantity must be at least 1".to_owned(),
            ));
        }
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_add_item(user_id, req).await {
                // A lost race on the shoe, or on concurrent cart creation,
                // is retried against fresh reads.
                Err(ApiError::Store(
                    StoreError::VersionConflict { .. } | StoreError::AlreadyExists { entity: "cart" },
                )) if attempts < MAX_RETRIES => {}
                other => return other,
            }
        }
    }

    async fn try_add_item(&self, user_id: UserId, req: &AddCartItem) -> Result<Cart> {
        let mut shoe = self
            .store
            .shoe(req.shoe_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Shoe".to_owned()))?;
        let color = shoe
            .color(req.color_id)
            .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))?;

        let snapshot = CartItem {
            id: CartItemId::generate(),
            shoe_id: shoe.id,
            color_id: color.id,
            color: color.name.clone(),
            shoe_brand: shoe.brand.clone(),
            shoe_model: shoe.model.clone(),
            size: req.size,
            quantity: req.quantity,
            price: shoe.price,
        };
        let context = item_context(&shoe, &snapshot.color, req.size);

        stock::reserve(&mut shoe, req.color_id, req.size, req.quantity)
            .map_err(|e| stock_error(e, &context))?;

        let mut cart = self
            .store
            .cart_for_user(user_id)
            .await?
            .unwrap_or_else(|| Cart::new(user_id));
        cart.add(snapshot);

        self.store.commit_cart_mutation(&shoe, &cart).await?;
        Ok(cart)
    }

    /// Set a cart line to a new quantity, rebalancing the reservation.
    ///
    /// # Errors
    ///
    /// Rejects zero quantities (removal is a separate operation), unknown
    /// lines and growth beyond `shelf + held` units.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(ApiError::InvalidQuantity(
                "quantity must be at least 1; remove the item instead".to_owned(),
            ));
        }
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_update_item(user_id, item_id, quantity).await {
                Err(ApiError::Store(StoreError::VersionConflict { .. }))
                    if attempts < MAX_RETRIES => {}
                other => return other,
            }
        }
    }

    async fn try_update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart> {
        let mut cart = self
            .store
            .cart_for_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Cart".to_owned()))?;
        let line = cart
            .item(item_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Cart item".to_owned()))?;

        let mut shoe = self
            .store
            .shoe(line.shoe_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Shoe".to_owned()))?;
        let context = item_context(&shoe, &line.color, line.size);

        // Units already held count toward availability, so shrinking a line
        // never fails for lack of stock.
        stock::rebalance(&mut shoe, line.color_id, line.size, line.quantity, quantity)
            .map_err(|e| stock_error(e, &context))?;

        if let Some(line) = cart.item_mut(item_id) {
            line.quantity = quantity;
        }

        self.store.commit_cart_mutation(&shoe, &cart).await?;
        Ok(cart)
    }

    /// Remove a cart line, releasing its reservation.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the cart or line is absent.
    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<Cart> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_remove_item(user_id, item_id).await {
                Err(ApiError::Store(StoreError::VersionConflict { .. }))
                    if attempts < MAX_RETRIES => {}
                other => return other,
            }
        }
    }

    async fn try_remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<Cart> {
        let mut cart = self
            .store
            .cart_for_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Cart".to_owned()))?;
        let line = cart
            .remove(item_id)
            .ok_or_else(|| ApiError::NotFound("Cart item".to_owned()))?;

        // The catalog entry may have been deleted since the line was added.
        // The line still comes out of the cart; only the restock is skipped.
        match self.store.shoe(line.shoe_id).await? {
            Some(mut shoe) => {
                if let Err(err) = stock::release(&mut shoe, line.color_id, line.size, line.quantity)
                {
                    warn!(shoe_id = %line.shoe_id, %err, "Skipping restock for removed cart line");
                }
                self.store.commit_cart_mutation(&shoe, &cart).await?;
            }
            None => {
                warn!(shoe_id = %line.shoe_id, "Shoe gone from catalog; skipping restock");
                self.store.write_cart(&cart).await?;
            }
        }
        Ok(cart)
    }

    /// Convert the cart into a Pending order and empty it. Stock is not
    /// touched; the units were reserved when each line was added.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::EmptyCart`] when there is nothing to check out.
    pub async fn checkout(&self, user_id: UserId) -> Result<Order> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_checkout(user_id).await {
                Err(ApiError::Store(StoreError::VersionConflict { .. }))
                    if attempts < MAX_RETRIES => {}
                other => return other,
            }
        }
    }

    async fn try_checkout(&self, user_id: UserId) -> Result<Order> {
        let mut cart = self
            .store
            .cart_for_user(user_id)
            .await?
            .ok_or(ApiError::EmptyCart)?;
        if cart.items.is_empty() {
            return Err(ApiError::EmptyCart);
        }

        let order = Order::from_cart(user_id, cart.drain_items());
        self.store.commit_checkout(&cart, &order).await?;
        Ok(order)
    }
}
