use serde::{Deserialize, Serialize};

macro_rules! i64_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw value.
            pub fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the underlying value.
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

i64_id! {
    /// Unique identifier for an order.
    ///
    /// Wraps the numeric order id carried by inbound order events to prevent
    /// mixing it up with other numeric identifiers.
    OrderId
}

i64_id! {
    /// Unique identifier for a user (the order's customer account).
    UserId
}

i64_id! {
    /// Unique identifier for a store.
    StoreId
}

i64_id! {
    /// Unique identifier for a product in the catalog.
    ProductId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_id_preserves_value() {
        let id = OrderId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn ids_of_different_values_are_not_equal() {
        assert_ne!(ProductId::new(1), ProductId::new(2));
        assert_eq!(StoreId::new(7), StoreId::from(7));
    }

    #[test]
    fn display_matches_raw_value() {
        assert_eq!(OrderId::new(1001).to_string(), "1001");
        assert_eq!(UserId::new(-3).to_string(), "-3");
    }

    #[test]
    fn serializes_as_transparent_number() {
        let id = ProductId::new(55);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "55");

        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
