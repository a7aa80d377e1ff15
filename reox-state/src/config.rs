//! Engine Configuration
//!
//! A [`Store`](crate::reactive::Store) is parameterized by a small set of
//! policies. The defaults keep the forgiving behavior UI code expects,
//! except for computed values, which track their dependencies live.
//!
//! Configuration can be built in code or loaded from JSON:
//!
//! ```rust
//! use reox_state::config::{StoreConfig, StringPolicy};
//!
//! let config = StoreConfig::from_json(r#"{ "string_policy": "reject" }"#).unwrap();
//! assert_eq!(config.string_policy, StringPolicy::Reject);
//! assert_eq!(config.max_string_len, 255);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};

/// Default byte limit for string cells (the old fixed buffer minus its terminator).
pub const DEFAULT_MAX_STRING_LEN: usize = 255;

/// Default starting capacity of a diff batch.
pub const DEFAULT_DIFF_CAPACITY: usize = 16;

/// Largest accepted starting capacity of a diff batch. Batches still grow
/// past it; this only bounds the up-front reservation.
pub const MAX_INITIAL_DIFF_CAPACITY: usize = 1 << 16;

/// What happens when a string longer than `max_string_len` is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringPolicy {
    /// Cut the string at the last UTF-8 boundary within the limit.
    #[default]
    Truncate,
    /// Refuse the write with [`StateError::StringTooLong`].
    Reject,
}

/// When observers hear about writes made inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverMode {
    /// Observers fire synchronously at every changing write, batch or not.
    #[default]
    Immediate,
    /// Inside a batch, observers fire once per changed cell at commit with
    /// the value from batch start and the value at commit.
    Deferred,
}

/// How computed values react to dependency changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputedMode {
    /// A changing write re-arms every dependent computed value.
    #[default]
    Live,
    /// Computed values are evaluated once at creation and only re-evaluate
    /// after an explicit invalidation.
    Snapshot,
}

/// Policies for a [`Store`](crate::reactive::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub max_string_len: usize,
    pub string_policy: StringPolicy,
    pub observer_mode: ObserverMode,
    pub computed_mode: ComputedMode,
    pub initial_diff_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
            string_policy: StringPolicy::default(),
            observer_mode: ObserverMode::default(),
            computed_mode: ComputedMode::default(),
            initial_diff_capacity: DEFAULT_DIFF_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_string_len == 0 {
            return Err(StateError::Config(
                "max_string_len must be at least 1".to_string(),
            ));
        }
        if self.initial_diff_capacity > MAX_INITIAL_DIFF_CAPACITY {
            return Err(StateError::Config(format!(
                "initial_diff_capacity must be at most {MAX_INITIAL_DIFF_CAPACITY}, got {}",
                self.initial_diff_capacity
            )));
        }
        Ok(())
    }

    pub fn with_max_string_len(mut self, max: usize) -> Self {
        self.max_string_len = max;
        self
    }

    pub fn with_string_policy(mut self, policy: StringPolicy) -> Self {
        self.string_policy = policy;
        self
    }

    pub fn with_observer_mode(mut self, mode: ObserverMode) -> Self {
        self.observer_mode = mode;
        self
    }

    pub fn with_computed_mode(mut self, mode: ComputedMode) -> Self {
        self.computed_mode = mode;
        self
    }

    pub fn with_initial_diff_capacity(mut self, capacity: usize) -> Self {
        self.initial_diff_capacity = capacity;
        self
    }
}
