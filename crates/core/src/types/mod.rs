//! Core types for Laceup.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod size;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use size::{ShoeSize, SizeError};
pub use status::{OrderStatus, TransitionError};
