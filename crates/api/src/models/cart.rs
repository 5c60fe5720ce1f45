//! Cart aggregate: a user's working set of prospective purchases.
//!
//! Cart lines are denormalized snapshots. Price, brand, model and color name
//! are captured when the line is added and do not change if the catalog
//! changes afterwards. Stock is reserved the moment a line is added, so a
//! cart line always corresponds to units already taken off the shelf.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use laceup_core::{CartId, CartItemId, ColorId, Price, ShoeId, ShoeSize, UserId};

/// One cart line: a denormalized snapshot of a (shoe, color, size) choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub shoe_id: ShoeId,
    pub color_id: ColorId,
    pub color: String,
    pub shoe_brand: String,
    pub shoe_model: String,
    pub size: ShoeSize,
    pub quantity: u32,
    /// Price at add time, per unit.
    pub price: Price,
}

impl CartItem {
    /// Line total at the captured price.
    #[must_use]
    pub const fn line_total(&self) -> Price {
        self.price.line_total(self.quantity)
    }
}

/// The cart aggregate. One live cart per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency counter, managed by the store.
    #[serde(default)]
    pub version: u64,
}

impl Cart {
    /// Create an empty cart for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::generate(),
            user_id,
            items: Vec::new(),
            updated_at: Utc::now(),
            version: 0,
        }
    }

    /// Look up a line by id.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Mutable lookup of a line by id.
    pub fn item_mut(&mut self, id: CartItemId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Add units of a (shoe, color, size) choice. An existing line for the
    /// exact tuple is incremented; otherwise a new line is appended with the
    /// snapshot taken now.
    pub fn add(&mut self, snapshot: CartItem) {
        let existing = self.items.iter_mut().find(|i| {
            i.shoe_id == snapshot.shoe_id
                && i.color_id == snapshot.color_id
                && i.size == snapshot.size
        });
        match existing {
            Some(line) => line.quantity += snapshot.quantity,
            None => self.items.push(snapshot),
        }
        self.touch();
    }

    /// Remove a line, returning it so the caller can release its stock.
    pub fn remove(&mut self, id: CartItemId) -> Option<CartItem> {
        let idx = self.items.iter().position(|i| i.id == id)?;
        let item = self.items.remove(idx);
        self.touch();
        Some(item)
    }

    /// Take every line out of the cart, leaving it empty. Used by checkout.
    pub fn drain_items(&mut self) -> Vec<CartItem> {
        self.touch();
        std::mem::take(&mut self.items)
    }

    /// Sum of line totals at captured prices.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items
            .iter()
            .fold(Price::ZERO, |acc, i| acc + i.line_total())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn snapshot(shoe: ShoeId, color: ColorId, size: f64, quantity: u32) -> CartItem {
        CartItem {
            id: CartItemId::generate(),
            shoe_id: shoe,
            color_id: color,
            color: "Midnight Blue".to_owned(),
            shoe_brand: "Apex".to_owned(),
            shoe_model: "Runner 2".to_owned(),
            size: ShoeSize::parse(size).unwrap(),
            quantity,
            price: Price::from_cents(12999),
        }
    }

    #[test]
    fn add_merges_lines_for_same_tuple() {
        let mut cart = Cart::new(UserId::generate());
        let shoe = ShoeId::generate();
        let color = ColorId::generate();

        cart.add(snapshot(shoe, color, 9.0, 3));
        cart.add(snapshot(shoe, color, 9.0, 2));
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);

        // Different size is a different line.
        cart.add(snapshot(shoe, color, 9.5, 1));
        assert_eq!(cart.items.len(), 2);
    }

    #[test]
    fn remove_returns_the_line() {
        let mut cart = Cart::new(UserId::generate());
        cart.add(snapshot(ShoeId::generate(), ColorId::generate(), 9.0, 3));
        let id = cart.items[0].id;

        let removed = cart.remove(id).unwrap();
        assert_eq!(removed.quantity, 3);
        assert!(cart.items.is_empty());
        assert!(cart.remove(id).is_none());
    }

    #[test]
    fn drain_empties_the_cart() {
        let mut cart = Cart::new(UserId::generate());
        cart.add(snapshot(ShoeId::generate(), ColorId::generate(), 9.0, 3));
        cart.add(snapshot(ShoeId::generate(), ColorId::generate(), 8.0, 1));

        let items = cart.drain_items();
        assert_eq!(items.len(), 2);
        assert!(cart.items.is_empty());
    }

    #[test]
    fn total_price_sums_line_totals() {
        let mut cart = Cart::new(UserId::generate());
        cart.add(snapshot(ShoeId::generate(), ColorId::generate(), 9.0, 3));
        assert_eq!(cart.total_price(), Price::from_cents(38997));
    }
}
