//! Identifiers for everything the engine hands out.
//!
//! States, observers, computed values and effects all draw from one
//! process-wide counter, so an id is never reused for the lifetime of the
//! process, across kinds and across store instances.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

fn next_raw_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

macro_rules! engine_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub(crate) fn next() -> Self {
                Self(next_raw_id())
            }

            /// Rebuild an id from its raw value, e.g. one received from a
            /// diff consumer. Ids that were never issued simply miss on lookup.
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw id value.
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

engine_id! {
    /// Identity of a state cell.
    StateId
}

engine_id! {
    /// Identity of an observer subscription.
    ObserverId
}

engine_id! {
    /// Identity of a computed value.
    ComputedId
}

engine_id! {
    /// Identity of an effect.
    EffectId
}

/// Opaque reference to a state cell. Copy it freely; it is only an id.
pub type StateHandle = StateId;
