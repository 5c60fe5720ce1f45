//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. IDs are UUIDv4 so
//! that embedded entities (color variants, size entries, cart lines) can be
//! assigned an identity application-side, before any storage round trip.

use uuid::Uuid;

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`Uuid`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - `generate()` for a fresh random ID and `as_uuid()` for the inner value
/// - `From<Uuid>` / `Into<Uuid>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use laceup_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget_id = WidgetId::generate();
///
/// // These are different types, so this won't compile:
/// // let _: GadgetId = widget_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Create an ID from an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse::<::uuid::Uuid>()?))
            }
        }
    };
}

// Standard entity IDs
define_id!(UserId);
define_id!(ShoeId);
define_id!(ColorId);
define_id!(SizeStockId);
define_id!(CartId);
define_id!(CartItemId);
define_id!(OrderId);

/// Parse an ID from a path or payload string, preserving the raw input for
/// error reporting.
///
/// # Errors
///
/// Returns the unparseable input so callers can surface a 400 with it.
pub fn parse_id<T: From<Uuid>>(raw: &str) -> Result<T, String> {
    raw.parse::<Uuid>()
        .map(T::from)
        .map_err(|_| raw.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let shoe = ShoeId::generate();
        let uuid: Uuid = shoe.into();
        assert_eq!(ShoeId::new(uuid), shoe);
    }

    #[test]
    fn display_and_from_str_round_trip() {
        let id = OrderId::generate();
        let parsed: OrderId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        let err = parse_id::<ShoeId>("not-a-uuid").unwrap_err();
        assert_eq!(err, "not-a-uuid");
    }
}
