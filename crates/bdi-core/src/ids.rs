//! Strongly typed identifier wrappers.
//!
//! Graph indices (`TileId`, `EdgeId`) are zero-cost `Copy` integers used to
//! index the belief graph's parallel `Vec`s.  Entity ids (`AgentId`,
//! `ParcelId`) are opaque strings assigned by the game server.

use std::fmt;

/// Index newtype over `u32`.  `MAX` is reserved as the "none" marker used by
/// routing predecessor tables.
macro_rules! index_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(u32::MAX);

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

/// Generate an opaque string id wrapper.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

index_id! {
    /// Index of a tile in the belief graph.
    pub struct TileId;
}

index_id! {
    /// Index of a directed adjacency edge in the belief graph.
    pub struct EdgeId;
}

string_id! {
    /// Server-assigned id of an agent (self, peer, or any other player).
    pub struct AgentId;
}

string_id! {
    /// Server-assigned id of a parcel.
    pub struct ParcelId;
}
