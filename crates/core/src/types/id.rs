//! Newtype IDs for type-safe entity references.
//!
//! The commerce API hands out opaque, globally unique string identifiers.
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
///
/// # Example
///
/// ```rust
/// # use bramble_core::define_id;
/// define_id!(CheckoutId);
/// define_id!(OrderId);
///
/// let checkout_id = CheckoutId::new("Q2hlY2tvdXQ6MQ==");
/// let order_id = OrderId::new("T3JkZXI6MQ==");
///
/// // These are different types, so this won't compile:
/// // let _: CheckoutId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(CheckoutId);
define_id!(OrderId);
define_id!(VariantId);
define_id!(ShippingMethodId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = CheckoutId::new("Q2hlY2tvdXQ6MQ==");
        assert_eq!(id.as_str(), "Q2hlY2tvdXQ6MQ==");
        assert_eq!(id.to_string(), "Q2hlY2tvdXQ6MQ==");
        assert_eq!(String::from(id), "Q2hlY2tvdXQ6MQ==");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = OrderId::new("T3JkZXI6MQ==");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"T3JkZXI6MQ==\"");

        let back: OrderId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
