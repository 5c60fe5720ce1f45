//! Order aggregate and its lifecycle.
//!
//! An order is an immutable-at-creation snapshot of items carved from a cart
//! (or built directly). After creation only `status`, `address` and the
//! payment-session marker mutate, and only through the methods here. Stock
//! for the items was reserved when they entered the cart (or at direct
//! creation); the only remaining stock side effect is the cancel restock,
//! orchestrated by the order service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laceup_core::{ColorId, OrderId, OrderStatus, Price, ShoeId, ShoeSize, TransitionError, UserId};

use super::cart::CartItem;
use super::user::Address;

/// One order line: same snapshot shape as a cart line, minus cart identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub shoe_id: ShoeId,
    pub color_id: ColorId,
    pub color: String,
    pub shoe_brand: String,
    pub shoe_model: String,
    pub size: ShoeSize,
    pub quantity: u32,
    /// Price at reservation time, per unit.
    pub price: Price,
}

impl OrderItem {
    /// Line total at the captured price.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.price.line_total(self.quantity)
    }
}

impl From<CartItem> for OrderItem {
    fn from(item: CartItem) -> Self {
        Self {
            shoe_id: item.shoe_id,
            color_id: item.color_id,
            color: item.color,
            shoe_brand: item.shoe_brand,
            shoe_model: item.shoe_model,
            size: item.size,
            quantity: item.quantity,
            price: item.price,
        }
    }
}

/// Outcome of applying a payment-confirmation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentConfirmation {
    /// The Pending → Processing transition was applied; persist the order.
    Applied,
    /// The same session was already processed; nothing to persist.
    Replay,
}

/// The order aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    /// Shipping address recorded on payment confirmation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Processed payment-session marker; makes webhook confirmation
    /// idempotent under provider retries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, managed by the store.
    #[serde(default)]
    pub version: u64,
}

impl Order {
    /// Create a Pending order from item snapshots.
    #[must_use]
    pub fn new(user_id: UserId, items: Vec<OrderItem>) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::generate(),
            user_id,
            items,
            status: OrderStatus::Pending,
            address: None,
            payment_session_id: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Create a Pending order from cart lines.
    #[must_use]
    pub fn from_cart(user_id: UserId, items: Vec<CartItem>) -> Self {
        Self::new(user_id, items.into_iter().map(OrderItem::from).collect())
    }

    /// Sum of line totals at captured prices.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items
            .iter()
            .fold(Price::ZERO, |acc, i| acc + i.line_total())
    }

    /// Apply an explicit status transition.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when the state machine rejects the move.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), TransitionError> {
        self.status.validate_transition(next)?;
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Apply a payment-confirmation event for `session_id`.
    ///
    /// A replay of the session already recorded is acknowledged without
    /// mutating anything. A different session on an order past Pending is
    /// rejected as an invalid transition.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] when the order is not Pending and the
    /// event is not a replay.
    pub fn confirm_payment(
        &mut self,
        session_id: &str,
        address: Option<Address>,
    ) -> Result<PaymentConfirmation, TransitionError> {
        if self
            .payment_session_id
            .as_deref()
            .is_some_and(|processed| processed == session_id)
        {
            return Ok(PaymentConfirmation::Replay);
        }

        self.status.validate_transition(OrderStatus::Processing)?;
        self.status = OrderStatus::Processing;
        self.payment_session_id = Some(session_id.to_owned());
        self.address = address;
        self.updated_at = Utc::now();
        Ok(PaymentConfirmation::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(quantity: u32, cents: i64) -> OrderItem {
        OrderItem {
            shoe_id: ShoeId::generate(),
            color_id: ColorId::generate(),
            color: "Midnight Blue".to_owned(),
            shoe_brand: "Apex".to_owned(),
            shoe_model: "Runner 2".to_owned(),
            size: ShoeSize::parse(9.0).unwrap(),
            quantity,
            price: Price::from_cents(cents),
        }
    }

    fn test_address() -> Address {
        Address {
            line1: "1 Main St".to_owned(),
            line2: None,
            city: "Bangkok".to_owned(),
            postal_code: "10110".to_owned(),
            country: "TH".to_owned(),
        }
    }

    #[test]
    fn new_orders_are_pending() {
        let order = Order::new(UserId::generate(), vec![item(2, 10000)]);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.payment_session_id.is_none());
    }

    #[test]
    fn total_price_sums_lines() {
        let order = Order::new(UserId::generate(), vec![item(2, 10000), item(1, 5500)]);
        assert_eq!(order.total_price(), Price::from_cents(25500));
    }

    #[test]
    fn confirm_payment_moves_to_processing_and_records_address() {
        let mut order = Order::new(UserId::generate(), vec![item(1, 10000)]);
        let outcome = order
            .confirm_payment("cs_test_1", Some(test_address()))
            .unwrap();
        assert_eq!(outcome, PaymentConfirmation::Applied);
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.address.as_ref().unwrap().city, "Bangkok");
        assert_eq!(order.payment_session_id.as_deref(), Some("cs_test_1"));
    }

    #[test]
    fn confirm_payment_replay_is_a_no_op() {
        let mut order = Order::new(UserId::generate(), vec![item(1, 10000)]);
        order
            .confirm_payment("cs_test_1", Some(test_address()))
            .unwrap();
        let before = order.clone();

        let outcome = order.confirm_payment("cs_test_1", None).unwrap();
        assert_eq!(outcome, PaymentConfirmation::Replay);
        assert_eq!(order, before);
    }

    #[test]
    fn confirm_payment_with_new_session_after_processing_is_rejected() {
        let mut order = Order::new(UserId::generate(), vec![item(1, 10000)]);
        order.confirm_payment("cs_test_1", None).unwrap();
        assert!(order.confirm_payment("cs_test_2", None).is_err());
    }

    #[test]
    fn confirm_payment_on_canceled_order_reports_the_cancellation() {
        let mut order = Order::new(UserId::generate(), vec![item(1, 10000)]);
        order.transition(OrderStatus::Canceled).unwrap();
        assert_eq!(
            order.confirm_payment("cs_test_1", None),
            Err(TransitionError::AlreadyCanceled)
        );
    }

    #[test]
    fn transition_rejects_undefined_moves() {
        let mut order = Order::new(UserId::generate(), vec![item(1, 10000)]);
        order.transition(OrderStatus::Processing).unwrap();
        assert!(order.transition(OrderStatus::Pending).is_err());
        order.transition(OrderStatus::Canceled).unwrap();
        assert_eq!(
            order.transition(OrderStatus::Canceled),
            Err(TransitionError::AlreadyCanceled)
        );
    }
}
