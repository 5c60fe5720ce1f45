//! Stock ledger operations.
//!
//! The only place in the crate that arithmetic on `SizeStock::quantity` is
//! allowed. Reservations happen when units enter a cart or a directly
//! created order, releases when they leave one. Everything operates on an
//! in-memory [`Shoe`]; persistence and retry are the caller's concern.

use laceup_core::{ColorId, ShoeSize};

use crate::models::Shoe;

/// Rejections from the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    /// The color variant does not exist on this shoe.
    #[error("color variant not found")]
    ColorNotFound,
    /// The size entry does not exist on this variant.
    #[error("size not found")]
    SizeNotFound,
    /// Not enough units on the shelf.
    #[error("requested {requested}, only {available} available")]
    Insufficient { requested: u32, available: u32 },
}

/// Units currently on the shelf for a `(color, size)` pair.
///
/// # Errors
///
/// Returns [`StockError`] when the color or size entry is absent.
pub fn available(shoe: &Shoe, color_id: ColorId, size: ShoeSize) -> Result<u32, StockError> {
    let color = shoe.color(color_id).ok_or(StockError::ColorNotFound)?;
    let entry = color.size_entry(size).ok_or(StockError::SizeNotFound)?;
    Ok(entry.quantity)
}

/// Take `quantity` units off the shelf.
///
/// # Errors
///
/// Returns [`StockError::Insufficient`] when fewer units remain than
/// requested; the shoe is left untouched on any error.
pub fn reserve(
    shoe: &mut Shoe,
    color_id: ColorId,
    size: ShoeSize,
    quantity: u32,
) -> Result<(), StockError> {
    let color = shoe.color_mut(color_id).ok_or(StockError::ColorNotFound)?;
    let entry = color.size_entry_mut(size).ok_or(StockError::SizeNotFound)?;
    entry.quantity = entry
        .quantity
        .checked_sub(quantity)
        .ok_or(StockError::Insufficient {
            requested: quantity,
            available: entry.quantity,
        })?;
    shoe.touch();
    Ok(())
}

/// Put `quantity` units back on the shelf.
///
/// # Errors
///
/// Returns [`StockError`] when the color or size entry is absent; the
/// caller decides whether a missing entry is fatal (cart updates) or
/// skippable (cancel restock after catalog deletions).
pub fn release(
    shoe: &mut Shoe,
    color_id: ColorId,
    size: ShoeSize,
    quantity: u32,
) -> Result<(), StockError> {
    let color = shoe.color_mut(color_id).ok_or(StockError::ColorNotFound)?;
    let entry = color.size_entry_mut(size).ok_or(StockError::SizeNotFound)?;
    entry.quantity = entry.quantity.saturating_add(quantity);
    shoe.touch();
    Ok(())
}

/// Move a reservation from `old_quantity` to `new_quantity` units in one
/// step. The units the caller already holds count toward availability, so
/// shrinking a line can never fail for lack of stock.
///
/// # Errors
///
/// Returns [`StockError::Insufficient`] when `new_quantity` exceeds the
/// shelf quantity plus the units already held.
pub fn rebalance(
    shoe: &mut Shoe,
    color_id: ColorId,
    size: ShoeSize,
    old_quantity: u32,
    new_quantity: u32,
) -> Result<(), StockError> {
    let color = shoe.color_mut(color_id).ok_or(StockError::ColorNotFound)?;
    let entry = color.size_entry_mut(size).ok_or(StockError::SizeNotFound)?;
    let available = entry.quantity.saturating_add(old_quantity);
    if new_quantity > available {
        return Err(StockError::Insufficient {
            requested: new_quantity,
            available,
        });
    }
    entry.quantity = available - new_quantity;
    shoe.touch();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{ColorVariant, SizeStock};
    use laceup_core::Price;

    fn size(v: f64) -> ShoeSize {
        ShoeSize::parse(v).unwrap()
    }

    fn shoe_with_stock(quantity: u32) -> (Shoe, ColorId) {
        let mut shoe = Shoe::new("Apex", "Runner 2", Price::from_cents(12999));
        shoe.colors.push(ColorVariant::new(
            "Midnight Blue",
            "#191970",
            vec![SizeStock::new(size(9.0), quantity)],
        ));
        let color_id = shoe.colors[0].id;
        (shoe, color_id)
    }

    #[test]
    fn reserve_decrements_and_respects_the_floor() {
        let (mut shoe, color) = shoe_with_stock(5);

        reserve(&mut shoe, color, size(9.0), 3).unwrap();
        assert_eq!(available(&shoe, color, size(9.0)).unwrap(), 2);

        let err = reserve(&mut shoe, color, size(9.0), 3).unwrap_err();
        assert_eq!(
            err,
            StockError::Insufficient {
                requested: 3,
                available: 2
            }
        );
        // Failed reserve leaves the shelf untouched.
        assert_eq!(available(&shoe, color, size(9.0)).unwrap(), 2);
    }

    #[test]
    fn reserve_to_exactly_zero_succeeds() {
        let (mut shoe, color) = shoe_with_stock(5);
        reserve(&mut shoe, color, size(9.0), 5).unwrap();
        assert_eq!(available(&shoe, color, size(9.0)).unwrap(), 0);
    }

    #[test]
    fn release_restores_reserved_units() {
        let (mut shoe, color) = shoe_with_stock(5);
        reserve(&mut shoe, color, size(9.0), 4).unwrap();
        release(&mut shoe, color, size(9.0), 4).unwrap();
        assert_eq!(available(&shoe, color, size(9.0)).unwrap(), 5);
    }

    #[test]
    fn rebalance_counts_held_units_as_available() {
        let (mut shoe, color) = shoe_with_stock(5);
        reserve(&mut shoe, color, size(9.0), 4).unwrap();

        // Shelf has 1, caller holds 4: growing to 5 is fine.
        rebalance(&mut shoe, color, size(9.0), 4, 5).unwrap();
        assert_eq!(available(&shoe, color, size(9.0)).unwrap(), 0);

        // Growing to 6 is not.
        let err = rebalance(&mut shoe, color, size(9.0), 5, 6).unwrap_err();
        assert_eq!(
            err,
            StockError::Insufficient {
                requested: 6,
                available: 5
            }
        );

        // Shrinking always succeeds and restores the difference.
        rebalance(&mut shoe, color, size(9.0), 5, 2).unwrap();
        assert_eq!(available(&shoe, color, size(9.0)).unwrap(), 3);
    }

    #[test]
    fn unknown_color_or_size_is_reported() {
        let (mut shoe, color) = shoe_with_stock(5);
        assert_eq!(
            reserve(&mut shoe, ColorId::generate(), size(9.0), 1),
            Err(StockError::ColorNotFound)
        );
        assert_eq!(
            reserve(&mut shoe, color, size(13.0), 1),
            Err(StockError::SizeNotFound)
        );
    }
}
