//! Identifiers for network objects.
//!
//! Ids are dense indexes into a [`Network`](super::Network). They are only
//! meaningful for the network that issued them.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! index_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Creates an id from a raw index.
            #[must_use]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw index.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

index_id!(
    /// Identifies a terminal.
    TerminalId,
    "terminal"
);

index_id!(
    /// Identifies a piece of conducting equipment.
    EquipmentId,
    "equipment"
);

index_id!(
    /// Identifies a connectivity node.
    NodeId,
    "node"
);

/// Generates a fresh mRID for objects created without one.
#[must_use]
pub fn generate_mrid() -> String {
    uuid::Uuid::new_v4().to_string()
}
