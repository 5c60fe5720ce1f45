//! Inventory reservation through the cart: stock moves when lines are
//! added, updated or removed, and checkout carves the cart into an order
//! without touching the shelf again.

#![allow(clippy::unwrap_used)]

mod common;

use laceup_core::{OrderStatus, UserId};

use laceup_api::error::ApiError;
use laceup_api::services::cart::{AddCartItem, CartService};
use laceup_api::services::order::{NewOrderItem, OrderService};
use laceup_api::store::{MemoryStore, Store};

use common::{first_color, seed_shoe, shelf_quantity, size};

fn add_request(shoe: &laceup_api::models::Shoe, size_value: f64, quantity: u32) -> AddCartItem {
    AddCartItem {
        shoe_id: shoe.id,
        color_id: first_color(shoe),
        size: size(size_value),
        quantity,
    }
}

#[tokio::test]
async fn adding_to_cart_reserves_stock() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    let cart = carts.add_item(user, &add_request(&shoe, 9.0, 3)).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 2);
}

#[tokio::test]
async fn oversized_add_reserves_nothing() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    let err = carts
        .add_item(user, &add_request(&shoe, 9.0, 6))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InsufficientStock(_)));

    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 5);
    assert!(store.cart_for_user(user).await.unwrap().is_none());
}

#[tokio::test]
async fn repeated_adds_merge_and_reserve_cumulatively() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    carts.add_item(user, &add_request(&shoe, 9.0, 2)).await.unwrap();
    let cart = carts.add_item(user, &add_request(&shoe, 9.0, 2)).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 4);
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 1);

    // The shelf, not the cart, is the limit for further adds.
    let err = carts
        .add_item(user, &add_request(&shoe, 9.0, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InsufficientStock(_)));
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 1);
}

#[tokio::test]
async fn updating_quantity_rebalances_the_reservation() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    let cart = carts.add_item(user, &add_request(&shoe, 9.0, 3)).await.unwrap();
    let item_id = cart.items[0].id;

    // Held units count toward availability: 2 on the shelf + 3 held.
    carts.update_item(user, item_id, 5).await.unwrap();
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 0);

    // Shrinking returns the difference.
    carts.update_item(user, item_id, 1).await.unwrap();
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 4);

    // Growing past shelf + held fails and changes nothing.
    let err = carts.update_item(user, item_id, 6).await.unwrap_err();
    assert!(matches!(err, ApiError::InsufficientStock(_)));
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 4);
    let cart = carts.get(user).await.unwrap().unwrap();
    assert_eq!(cart.items[0].quantity, 1);
}

#[tokio::test]
async fn removing_a_line_releases_its_units() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    let cart = carts.add_item(user, &add_request(&shoe, 9.0, 3)).await.unwrap();
    let item_id = cart.items[0].id;

    let cart = carts.remove_item(user, item_id).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 5);

    // Same line again is gone.
    let err = carts.remove_item(user, item_id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn removal_survives_catalog_deletion() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    let cart = carts.add_item(user, &add_request(&shoe, 9.0, 3)).await.unwrap();
    let item_id = cart.items[0].id;

    assert!(store.delete_shoe(shoe.id).await.unwrap());

    // The restock is skipped but the line still comes out.
    let cart = carts.remove_item(user, item_id).await.unwrap();
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn zero_quantities_are_rejected() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    let err = carts
        .add_item(user, &add_request(&shoe, 9.0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidQuantity(_)));

    let cart = carts.add_item(user, &add_request(&shoe, 9.0, 1)).await.unwrap();
    let err = carts.update_item(user, cart.items[0].id, 0).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidQuantity(_)));
}

#[tokio::test]
async fn checkout_carves_the_cart_without_touching_stock() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    carts.add_item(user, &add_request(&shoe, 9.0, 3)).await.unwrap();
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 2);

    let order = carts.checkout(user).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 3);

    // Stock was reserved at add time; checkout must not decrement again.
    assert_eq!(shelf_quantity(&store, shoe.id, 9.0).await, 2);

    let cart = carts.get(user).await.unwrap().unwrap();
    assert!(cart.items.is_empty());

    // An emptied cart cannot be checked out again.
    let err = carts.checkout(user).await.unwrap_err();
    assert!(matches!(err, ApiError::EmptyCart));
}

#[tokio::test]
async fn snapshot_prices_survive_catalog_changes() {
    let store = MemoryStore::new();
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let user = UserId::generate();
    let carts = CartService::new(&store);

    carts.add_item(user, &add_request(&shoe, 9.0, 2)).await.unwrap();

    // Reprice the shoe after the line was added.
    let mut repriced = store.shoe(shoe.id).await.unwrap().unwrap();
    repriced.price = laceup_core::Price::from_cents(19999);
    store.update_shoe(&repriced).await.unwrap();

    let order = carts.checkout(user).await.unwrap();
    assert_eq!(order.items[0].price, laceup_core::Price::from_cents(12999));
    assert_eq!(order.total_price(), laceup_core::Price::from_cents(25998));
}

#[tokio::test]
async fn direct_order_creation_is_all_or_nothing() {
    let store = MemoryStore::new();
    let plenty = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    let scarce = seed_shoe(&store, "Apex", "Trail Pro", &[(10.0, 1)]).await;
    let user = UserId::generate();
    let orders = OrderService::new(&store);

    let items = vec![
        NewOrderItem {
            shoe_id: plenty.id,
            color_id: first_color(&plenty),
            size: size(9.0),
            quantity: 2,
        },
        NewOrderItem {
            shoe_id: scarce.id,
            color_id: first_color(&scarce),
            size: size(10.0),
            quantity: 2,
        },
    ];

    let err = orders.create(user, &items).await.unwrap_err();
    assert!(matches!(err, ApiError::InsufficientStock(_)));

    // The satisfiable line must not have reserved either.
    assert_eq!(shelf_quantity(&store, plenty.id, 9.0).await, 5);
    assert_eq!(shelf_quantity(&store, scarce.id, 10.0).await, 1);
    let page = orders
        .list_own(user, laceup_api::services::order::PageParams::default())
        .await
        .unwrap();
    assert!(page.orders.is_empty());
}

#[tokio::test]
async fn direct_order_creation_reserves_every_line() {
    let store = MemoryStore::new();
    let runner = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5), (9.5, 2)]).await;
    let user = UserId::generate();
    let orders = OrderService::new(&store);

    let items = vec![
        NewOrderItem {
            shoe_id: runner.id,
            color_id: first_color(&runner),
            size: size(9.0),
            quantity: 2,
        },
        NewOrderItem {
            shoe_id: runner.id,
            color_id: first_color(&runner),
            size: size(9.5),
            quantity: 2,
        },
    ];

    let order = orders.create(user, &items).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(shelf_quantity(&store, runner.id, 9.0).await, 3);
    assert_eq!(shelf_quantity(&store, runner.id, 9.5).await, 0);
}
