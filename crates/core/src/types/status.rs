//! Order status state machine.
//!
//! The lifecycle is `Pending → Processing → Shipping → Completed`, with
//! `Canceled` reachable from any non-terminal state. `Completed` and
//! `Canceled` are terminal: no transition leaves them. Stock is only ever
//! touched by the Pending-side reservation (cart/direct order) and by the
//! cancel restock; forward moves have no stock side effects.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when a status transition is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The order is already canceled; canceling again must not re-release
    /// stock.
    #[error("order is already canceled")]
    AlreadyCanceled,
    /// The transition is not defined by the state machine.
    #[error("cannot transition order from {from} to {to}")]
    Invalid {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },
}

/// Status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Created, awaiting payment confirmation.
    #[default]
    Pending,
    /// Payment confirmed, being prepared.
    Processing,
    /// Handed to the carrier.
    Shipping,
    /// Delivered; terminal.
    Completed,
    /// Canceled and restocked; terminal.
    Canceled,
}

impl OrderStatus {
    /// Position in the forward fulfilment chain. `Canceled` sits outside it.
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Processing => 1,
            Self::Shipping => 2,
            Self::Completed => 3,
            Self::Canceled => u8::MAX,
        }
    }

    /// Whether no transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    /// Whether the state machine defines a transition from `self` to `next`.
    ///
    /// Forward moves must strictly advance the fulfilment chain; `Canceled`
    /// is reachable from any non-terminal state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Canceled => true,
            _ => next.rank() > self.rank(),
        }
    }

    /// Validate a transition, distinguishing the canceled case so callers
    /// can keep cancellation idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::AlreadyCanceled`] for any transition
    /// attempted out of `Canceled` (re-cancels and late payment
    /// confirmations alike) and [`TransitionError::Invalid`] for any other
    /// undefined transition.
    pub const fn validate_transition(self, next: Self) -> Result<(), TransitionError> {
        if matches!(self, Self::Canceled) {
            return Err(TransitionError::AlreadyCanceled);
        }
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(TransitionError::Invalid {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipping => "Shipping",
            Self::Completed => "Completed",
            Self::Canceled => "Canceled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipping" => Ok(Self::Shipping),
            "completed" => Ok(Self::Completed),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
