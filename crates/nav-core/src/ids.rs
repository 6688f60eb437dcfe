//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into `Vec`s via `id.0 as usize`, but callers should prefer
//! the `.index()` helpers for clarity.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID": the inner type's `MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of an agent in the world's agent slots.
    pub struct AgentId(u32);
}

typed_id! {
    /// Identity of one path request.  Issued sequentially by a path service
    /// and never reused, so a stale completion can be told apart from the
    /// request an agent is currently waiting for.
    pub struct PathId(u32);
}

typed_id! {
    /// Index of a waypoint-graph node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed waypoint-graph edge.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Index of a named world marker (e.g. the player position) that
    /// destination controllers may follow.
    pub struct MarkerId(u16);
}

impl PathId {
    /// The id issued after `self`.  Skips the `INVALID` sentinel on wrap.
    #[inline]
    pub fn next(self) -> PathId {
        match self.0.wrapping_add(1) {
            u32::MAX => PathId(0),
            n => PathId(n),
        }
    }
}
