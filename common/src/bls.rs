//! Opaque BLS12-381 elements.
//!
//! The evaluator never interprets these bytes itself: group arithmetic is
//! delegated to an external primitives backend, which owns the encoding.

use serde_with::{hex::Hex, serde_as};

macro_rules! opaque_element {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[serde_as]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(#[serde_as(as = "Hex")] Vec<u8>);

        impl $name {
            pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
                Self(bytes.into())
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

opaque_element!(
    /// A point on the G1 curve
    G1Element
);
opaque_element!(
    /// A point on the G2 curve
    G2Element
);
opaque_element!(
    /// An intermediate Miller loop result
    MlResult
);
