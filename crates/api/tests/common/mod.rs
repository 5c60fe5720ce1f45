//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use laceup_core::{ColorId, Email, Price, ShoeId, ShoeSize, UserId};

use laceup_api::models::{ColorVariant, CurrentUser, Shoe, SizeStock};
use laceup_api::store::{MemoryStore, Store};

pub fn size(v: f64) -> ShoeSize {
    ShoeSize::parse(v).expect("valid size")
}

/// Insert a shoe with one color and the given `(size, quantity)` entries,
/// returning it as stored (version 1).
pub async fn seed_shoe(
    store: &MemoryStore,
    brand: &str,
    model: &str,
    sizes: &[(f64, u32)],
) -> Shoe {
    let mut shoe = Shoe::new(brand, model, Price::from_cents(12999));
    shoe.colors.push(ColorVariant::new(
        "Midnight Blue",
        "#191970",
        sizes
            .iter()
            .map(|&(s, q)| SizeStock::new(size(s), q))
            .collect(),
    ));
    store.insert_shoe(&shoe).await.expect("insert shoe");
    store
        .shoe(shoe.id)
        .await
        .expect("load shoe")
        .expect("shoe present")
}

pub fn customer() -> CurrentUser {
    CurrentUser {
        id: UserId::generate(),
        email: Email::parse("jane@example.com").expect("valid email"),
        is_admin: false,
        display_name: "jane".to_owned(),
    }
}

pub fn admin() -> CurrentUser {
    CurrentUser {
        id: UserId::generate(),
        email: Email::parse("ops@laceup.store").expect("valid email"),
        is_admin: true,
        display_name: "ops".to_owned(),
    }
}

/// Units on the shelf for the shoe's first color at `size_value`, re-read
/// from the store.
pub async fn shelf_quantity(store: &MemoryStore, shoe_id: ShoeId, size_value: f64) -> u32 {
    let shoe = store
        .shoe(shoe_id)
        .await
        .expect("load shoe")
        .expect("shoe present");
    shoe.colors[0]
        .size_entry(size(size_value))
        .map_or(0, |e| e.quantity)
}

pub fn first_color(shoe: &Shoe) -> ColorId {
    shoe.colors[0].id
}
