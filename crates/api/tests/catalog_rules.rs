//! Catalog CRUD and its uniqueness rules.

#![allow(clippy::unwrap_used)]

mod common;

use rust_decimal::Decimal;

use laceup_api::error::ApiError;
use laceup_api::services::catalog::{
    CatalogService, NewColor, NewShoe, NewSizeStock, ShoeQuery, UpdateShoe, UpdateSizeStock,
};
use laceup_api::store::MemoryStore;

use common::{seed_shoe, size};

fn new_shoe(brand: &str, model: &str) -> NewShoe {
    NewShoe {
        brand: brand.to_owned(),
        model: model.to_owned(),
        description: None,
        gender: laceup_api::models::Gender::Male,
        shoe_type: laceup_api::models::ShoeType::Running,
        price: Decimal::new(12999, 2),
        colors: Vec::new(),
    }
}

fn new_color(name: &str, sizes: &[(f64, u32)]) -> NewColor {
    NewColor {
        name: name.to_owned(),
        hex: "#191970".to_owned(),
        image_url: None,
        sizes: sizes
            .iter()
            .map(|&(s, q)| NewSizeStock {
                size: size(s),
                quantity: q,
            })
            .collect(),
    }
}

#[tokio::test]
async fn brand_model_pairs_are_unique_case_insensitively() {
    let store = MemoryStore::new();
    let catalog = CatalogService::new(&store);

    catalog.create_shoe(&new_shoe("Apex", "Runner 2")).await.unwrap();
    let err = catalog
        .create_shoe(&new_shoe("APEX", "runner 2"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // Same brand, different model is fine.
    catalog.create_shoe(&new_shoe("Apex", "Trail Pro")).await.unwrap();
}

#[tokio::test]
async fn renaming_onto_an_existing_pair_is_a_conflict() {
    let store = MemoryStore::new();
    let catalog = CatalogService::new(&store);

    catalog.create_shoe(&new_shoe("Apex", "Runner 2")).await.unwrap();
    let other = catalog.create_shoe(&new_shoe("Apex", "Trail Pro")).await.unwrap();

    let err = catalog
        .update_shoe(
            other.id,
            &UpdateShoe {
                model: Some("Runner 2".to_owned()),
                ..UpdateShoe::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // Re-saving its own pair is not a conflict.
    catalog
        .update_shoe(
            other.id,
            &UpdateShoe {
                model: Some("Trail Pro".to_owned()),
                price: Some(Decimal::new(14999, 2)),
                ..UpdateShoe::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn color_names_are_unique_within_a_shoe() {
    let store = MemoryStore::new();
    let catalog = CatalogService::new(&store);
    let shoe = catalog.create_shoe(&new_shoe("Apex", "Runner 2")).await.unwrap();

    catalog
        .add_color(shoe.id, &new_color("Midnight Blue", &[(9.0, 5)]))
        .await
        .unwrap();
    let err = catalog
        .add_color(shoe.id, &new_color("MIDNIGHT BLUE", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn size_values_are_unique_within_a_color() {
    let store = MemoryStore::new();
    let catalog = CatalogService::new(&store);
    let shoe = catalog.create_shoe(&new_shoe("Apex", "Runner 2")).await.unwrap();
    let shoe = catalog
        .add_color(shoe.id, &new_color("Midnight Blue", &[(9.0, 5), (9.5, 2)]))
        .await
        .unwrap();
    let color_id = shoe.colors[0].id;

    let err = catalog
        .add_size(
            shoe.id,
            color_id,
            &NewSizeStock {
                size: size(9.0),
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // Moving an entry onto a sibling's value is also a conflict.
    let entry_id = shoe.colors[0].sizes[1].id;
    let err = catalog
        .update_size(
            shoe.id,
            color_id,
            entry_id,
            &UpdateSizeStock {
                size: Some(size(9.0)),
                quantity: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // Restocking in place is fine.
    let shoe = catalog
        .update_size(
            shoe.id,
            color_id,
            entry_id,
            &UpdateSizeStock {
                size: None,
                quantity: Some(10),
            },
        )
        .await
        .unwrap();
    assert_eq!(shoe.colors[0].sizes[1].quantity, 10);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let store = MemoryStore::new();
    let catalog = CatalogService::new(&store);

    seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;
    seed_shoe(&store, "Apex", "Trail Pro", &[(10.0, 0)]).await;
    seed_shoe(&store, "Strider", "Daily", &[(9.0, 2)]).await;

    let page = catalog
        .list(&ShoeQuery {
            brand: Some("apex".to_owned()),
            ..ShoeQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    // Size filter means in stock, not merely listed.
    let page = catalog
        .list(&ShoeQuery {
            size: Some(size(10.0)),
            ..ShoeQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let page = catalog
        .list(&ShoeQuery {
            size: Some(size(9.0)),
            ..ShoeQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let page = catalog
        .list(&ShoeQuery {
            length: Some(2),
            page: Some(2),
            ..ShoeQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.shoes.len(), 1);

    let brands = catalog.brands().await.unwrap();
    assert_eq!(brands.len(), 2);
    assert_eq!(brands[0].brand, "Apex");
    assert_eq!(brands[0].count, 2);
    assert_eq!(brands[1].brand, "Strider");
    assert_eq!(brands[1].count, 1);
}

#[tokio::test]
async fn inactive_shoes_are_hidden_from_listings() {
    let store = MemoryStore::new();
    let catalog = CatalogService::new(&store);
    let shoe = seed_shoe(&store, "Apex", "Runner 2", &[(9.0, 5)]).await;

    catalog
        .update_shoe(
            shoe.id,
            &UpdateShoe {
                is_active: Some(false),
                ..UpdateShoe::default()
            },
        )
        .await
        .unwrap();

    let page = catalog.list(&ShoeQuery::default()).await.unwrap();
    assert_eq!(page.total, 0);

    // Direct fetch still works.
    assert!(catalog.get(shoe.id).await.is_ok());
}
