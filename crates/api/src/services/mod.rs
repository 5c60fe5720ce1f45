//! Business logic, between the HTTP surface and the store.
//!
//! Services load aggregates, apply domain rules and persist through the
//! [`crate::store::Store`] trait. Writes race under optimistic concurrency,
//! so mutating operations run a small bounded retry loop around a
//! single-attempt body and re-read on [`StoreError::VersionConflict`].

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;
pub mod stock;

use crate::error::ApiError;
use crate::models::Shoe;

use laceup_core::ShoeSize;

/// Attempts per mutating operation before a version conflict is surfaced.
pub(crate) const MAX_RETRIES: usize = 3;

/// Item context used in stock error messages, e.g.
/// `Apex Runner 2, color Midnight Blue, size 9.5`.
pub(crate) fn item_context(shoe: &Shoe, color_name: &str, size: ShoeSize) -> String {
    format!("{}, color {color_name}, size {size}", shoe.display_name())
}

/// Map a stock ledger rejection onto the API error taxonomy, attaching the
/// item context for insufficiency.
pub(crate) fn stock_error(err: stock::StockError, context: &str) -> ApiError {
    match err {
        stock::StockError::ColorNotFound => ApiError::NotFound("Color variant".to_owned()),
        stock::StockError::SizeNotFound => ApiError::NotFound(format!("Size for {context}")),
        stock::StockError::Insufficient { .. } => ApiError::InsufficientStock(context.to_owned()),
    }
}
