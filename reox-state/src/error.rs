//! Error types for the state engine.
//!
//! Most accessors never surface these: the unchecked `get_*`/`set_*` family
//! degrades to type defaults and no-ops. The checked `try_*` variants return
//! them so callers can tell a miss from a real value.

use std::collections::TryReserveError;

use crate::reactive::{ComputedId, EffectId, StateId, StateType};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("state #{0} not found")]
    NotFound(StateId),

    #[error("computed value #{0} not found")]
    ComputedNotFound(ComputedId),

    #[error("effect #{0} not found")]
    EffectNotFound(EffectId),

    #[error("state #{id} holds {found} but was accessed as {expected}")]
    TypeMismatch {
        id: StateId,
        expected: StateType,
        found: StateType,
    },

    #[error("string of {len} bytes exceeds the {max}-byte limit")]
    StringTooLong { len: usize, max: usize },

    #[error("allocation failed while growing engine storage")]
    OutOfMemory,

    #[error("the process-wide store is already initialized")]
    AlreadyInitialized,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<TryReserveError> for StateError {
    fn from(_: TryReserveError) -> Self {
        StateError::OutOfMemory
    }
}

impl From<indexmap::TryReserveError> for StateError {
    fn from(_: indexmap::TryReserveError) -> Self {
        StateError::OutOfMemory
    }
}
