//! Domain aggregates.
//!
//! Each aggregate is one consistency unit: the shoe owns its color variants
//! and their per-size stock entries, the cart and the order own denormalized
//! item snapshots. Aggregates carry a `version` counter checked and bumped
//! by the store on every write (optimistic concurrency).

pub mod cart;
pub mod order;
pub mod shoe;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem, PaymentConfirmation};
pub use shoe::{ColorVariant, Gender, Shoe, ShoeType, SizeStock};
pub use user::{Address, AuthSession, CurrentUser, User};
