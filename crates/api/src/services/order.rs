//! Order operations and the order lifecycle.
//!
//! Direct creation reserves stock for every line and lands all reservations
//! plus the order in one composite commit. Cancellation releases exactly the
//! reserved units, once, in the same commit as the status write, so a crash
//! can never release without canceling or cancel without releasing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use laceup_core::{ColorId, OrderId, OrderStatus, ShoeId, ShoeSize, UserId};

use crate::error::{ApiError, Result};
use crate::models::{CurrentUser, Order, OrderItem, PaymentConfirmation, Shoe};
use crate::services::payment::{CheckoutSession, PaymentGateway, WebhookEvent};
use crate::store::{OrderFilter, Store, StoreError};

use super::{item_context, stock, stock_error, MAX_RETRIES};

/// One line of a directly created order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub shoe_id: ShoeId,
    pub color_id: ColorId,
    pub size: ShoeSize,
    pub quantity: u32,
}

/// Page selection for order lists, straight from the query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number.
    pub page: Option<usize>,
    /// Page size.
    pub length: Option<usize>,
}

const DEFAULT_PAGE_LENGTH: usize = 20;

/// One page of order results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Matching orders before pagination.
    pub total: usize,
    pub page: usize,
    pub length: usize,
}

fn paginate(mut orders: Vec<Order>, params: PageParams) -> OrderPage {
    let total = orders.len();
    let length = params.length.unwrap_or(DEFAULT_PAGE_LENGTH).max(1);
    let page = params.page.unwrap_or(1).max(1);
    let start = (page - 1).saturating_mul(length).min(total);
    let end = start.saturating_add(length).min(total);
    let orders = orders.drain(start..end).collect();
    OrderPage {
        orders,
        total,
        page,
        length,
    }
}

/// Order business logic over a [`Store`].
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create a Pending order directly from item choices, reserving stock
    /// for every line. All lines reserve or none do.
    ///
    /// # Errors
    ///
    /// Rejects empty orders, zero quantities, unknown catalog references and
    /// any line exceeding available stock.
    pub async fn create(&self, user_id: UserId, items: &[NewOrderItem]) -> Result<Order> {
        if items.is_empty() {
            return Err(ApiError::BadRequest(
                "Order must contain at least one item".to_owned(),
            ));
        }
        if let Some(bad) = items.iter().find(|i| i.quantity == 0) {
            return Err(ApiError::InvalidQuantity(format!(
                "quantity must be at least 1 for shoe {}",
                bad.shoe_id
            )));
        }
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_create(user_id, items).await {
                Err(ApiError::Store(StoreError::VersionConflict { .. }))
                    if attempts < MAX_RETRIES => {}
                other => return other,
            }
        }
    }

    async fn try_create(&self, user_id: UserId, items: &[NewOrderItem]) -> Result<Order> {
        // Shoes are loaded once and mutated in memory; nothing persists
        // until every line has reserved successfully.
        let mut shoes: HashMap<ShoeId, Shoe> = HashMap::new();
        let mut lines = Vec::with_capacity(items.len());

        for item in items {
            if !shoes.contains_key(&item.shoe_id) {
                let shoe = self
                    .store
                    .shoe(item.shoe_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Shoe".to_owned()))?;
                shoes.insert(item.shoe_id, shoe);
            }
            let shoe = shoes
                .get_mut(&item.shoe_id)
                .ok_or_else(|| ApiError::NotFound("Shoe".to_owned()))?;
            let color = shoe
                .color(item.color_id)
                .ok_or_else(|| ApiError::NotFound("Color variant".to_owned()))?;

            let line = OrderItem {
                shoe_id: shoe.id,
                color_id: color.id,
                color: color.name.clone(),
                shoe_brand: shoe.brand.clone(),
                shoe_model: shoe.model.clone(),
                size: item.size,
                quantity: item.quantity,
                price: shoe.price,
            };
            let context = item_context(shoe, &line.color, item.size);
            stock::reserve(shoe, item.color_id, item.size, item.quantity)
                .map_err(|e| stock_error(e, &context))?;
            lines.push(line);
        }

        let order = Order::new(user_id, lines);
        let shoes: Vec<Shoe> = shoes.into_values().collect();
        self.store.commit_order_creation(&shoes, &order).await?;
        info!(order_id = %order.id, items = order.items.len(), "Order created");
        Ok(order)
    }

    /// Fetch one order. Owners see their own; admins see any.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for absent orders and `Forbidden` for orders the
    /// caller does not own.
    pub async fn get(&self, order_id: OrderId, caller: &CurrentUser) -> Result<Order> {
        let order = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Order".to_owned()))?;
        if !caller.is_admin && order.user_id != caller.id {
            return Err(ApiError::Forbidden(
                "You can only view your own orders".to_owned(),
            ));
        }
        Ok(order)
    }

    /// The caller's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub async fn list_own(&self, user_id: UserId, params: PageParams) -> Result<OrderPage> {
        let orders = self
            .store
            .orders(OrderFilter {
                user_id: Some(user_id),
                status: None,
            })
            .await?;
        Ok(paginate(orders, params))
    }

    /// Every order, optionally restricted to one status. Admin only; the
    /// route layer gates access.
    ///
    /// # Errors
    ///
    /// Returns an error when the store fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        params: PageParams,
    ) -> Result<OrderPage> {
        let orders = self
            .store
            .orders(OrderFilter {
                user_id: None,
                status,
            })
            .await?;
        Ok(paginate(orders, params))
    }

    /// Apply a status transition.
    ///
    /// Admins may apply any transition the state machine allows. Other
    /// callers may only cancel their own orders. Cancellation releases the
    /// order's reserved stock in the same commit as the status write.
    ///
    /// # Errors
    ///
    /// Rejects unknown orders, foreign orders, non-cancel transitions by
    /// non-admins and transitions the state machine does not define.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        caller: &CurrentUser,
    ) -> Result<Order> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_update_status(order_id, next, caller).await {
                Err(ApiError::Store(StoreError::VersionConflict { .. }))
                    if attempts < MAX_RETRIES => {}
                other => return other,
            }
        }
    }

    async fn try_update_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        caller: &CurrentUser,
    ) -> Result<Order> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Order".to_owned()))?;

        if !caller.is_admin {
            if order.user_id != caller.id {
                return Err(ApiError::Forbidden(
                    "You can only modify your own orders".to_owned(),
                ));
            }
            if next != OrderStatus::Canceled {
                return Err(ApiError::Forbidden(
                    "Only administrators can change order status".to_owned(),
                ));
            }
        }

        order.transition(next)?;

        if next == OrderStatus::Canceled {
            let shoes = self.restock(&order).await?;
            self.store.commit_order_update(&shoes, &order).await?;
            info!(order_id = %order.id, "Order canceled, stock released");
        } else {
            self.store.update_order(&order).await?;
            info!(order_id = %order.id, status = %next, "Order status updated");
        }
        Ok(order)
    }

    /// Release every reserved unit of a canceling order back to the shelf.
    /// Lines whose catalog entry has since been deleted are skipped with a
    /// warning; the cancellation itself still proceeds.
    async fn restock(&self, order: &Order) -> Result<Vec<Shoe>> {
        let mut shoes: HashMap<ShoeId, Shoe> = HashMap::new();
        for item in &order.items {
            if !shoes.contains_key(&item.shoe_id) {
                match self.store.shoe(item.shoe_id).await? {
                    Some(shoe) => {
                        shoes.insert(item.shoe_id, shoe);
                    }
                    None => {
                        warn!(shoe_id = %item.shoe_id, "Shoe gone from catalog; skipping restock");
                        continue;
                    }
                }
            }
            if let Some(shoe) = shoes.get_mut(&item.shoe_id) {
                if let Err(err) = stock::release(shoe, item.color_id, item.size, item.quantity) {
                    warn!(shoe_id = %item.shoe_id, %err, "Skipping restock for canceled line");
                }
            }
        }
        Ok(shoes.into_values().collect())
    }

    /// Start a hosted payment session for a Pending order.
    ///
    /// # Errors
    ///
    /// Rejects unknown or foreign orders and orders past Pending.
    pub async fn checkout_session(
        &self,
        order_id: OrderId,
        caller: &CurrentUser,
        gateway: &dyn PaymentGateway,
    ) -> Result<CheckoutSession> {
        let order = self.get(order_id, caller).await?;
        if order.status != OrderStatus::Pending {
            return Err(ApiError::BadRequest(
                "Only pending orders can start payment".to_owned(),
            ));
        }
        Ok(gateway.create_checkout_session(&order).await?)
    }

    /// Apply a payment provider webhook event.
    ///
    /// Only `checkout.session.completed` does anything; other event types
    /// are acknowledged and ignored. A completed session moves its order
    /// Pending to Processing and records the shipping address. Replays of an
    /// already-processed session are no-ops.
    ///
    /// # Errors
    ///
    /// Rejects events without usable order metadata and events whose order
    /// no longer accepts confirmation.
    pub async fn handle_webhook(&self, event: &WebhookEvent) -> Result<()> {
        if event.event_type != "checkout.session.completed" {
            info!(event_type = %event.event_type, "Ignoring webhook event");
            return Ok(());
        }

        let session = &event.data.object;
        let order_id: OrderId = session
            .metadata
            .get("orderId")
            .ok_or_else(|| ApiError::BadRequest("Missing orderId metadata".to_owned()))?
            .parse()
            .map_err(|_| ApiError::BadRequest("Invalid orderId metadata".to_owned()))?;
        let address = session.shipping_address();

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.try_confirm(order_id, &session.id, address.clone()).await {
                Err(ApiError::Store(StoreError::VersionConflict { .. }))
                    if attempts < MAX_RETRIES => {}
                other => return other,
            }
        }
    }

    async fn try_confirm(
        &self,
        order_id: OrderId,
        session_id: &str,
        address: Option<crate::models::Address>,
    ) -> Result<()> {
        let mut order = self
            .store
            .order(order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Order".to_owned()))?;

        match order.confirm_payment(session_id, address)? {
            PaymentConfirmation::Applied => {
                self.store.update_order(&order).await?;
                info!(order_id = %order.id, "Payment confirmed, order processing");
            }
            PaymentConfirmation::Replay => {
                info!(order_id = %order.id, "Duplicate payment event ignored");
            }
        }
        Ok(())
    }
}
