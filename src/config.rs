//! Tuning knobs for the primitives.
//!
//! # Configuration Precedence
//!
//! 1. **Programmatic**: values set via `with_*` methods
//! 2. **Environment variables**: `TOKENSYNC_*`, applied by [`SyncConfig::from_env`]
//! 3. **Defaults**: [`SyncConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `TOKENSYNC_RWLOCK_POLL_US` | `u64` (µs) | `rwlock_poll_interval` |
//! | `TOKENSYNC_SEMAPHORE_POLL_US` | `u64` (µs) | `semaphore_poll_interval` |
//! | `TOKENSYNC_THREAD_PREFIX` | `String` | `thread_name_prefix` |
//! | `TOKENSYNC_ACTOR_STACK_SIZE` | `usize` | `actor_stack_size` |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable name for the read-write lock poll interval.
pub const ENV_RWLOCK_POLL_US: &str = "TOKENSYNC_RWLOCK_POLL_US";
/// Environment variable name for the semaphore poll interval.
pub const ENV_SEMAPHORE_POLL_US: &str = "TOKENSYNC_SEMAPHORE_POLL_US";
/// Environment variable name for the actor thread name prefix.
pub const ENV_THREAD_PREFIX: &str = "TOKENSYNC_THREAD_PREFIX";
/// Environment variable name for the actor thread stack size.
pub const ENV_ACTOR_STACK_SIZE: &str = "TOKENSYNC_ACTOR_STACK_SIZE";

/// Default bounded wait of a writer (or promoting reader) on the release
/// notifier before it rechecks the reader count.
pub const DEFAULT_RWLOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Default bounded wait of `Semaphore::acquire` on its wake-up event.
pub const DEFAULT_SEMAPHORE_POLL_INTERVAL: Duration = Duration::from_micros(1);

/// Configuration shared by the primitives and their actor threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long a waiting writer sleeps on the release notifier between
    /// reader-count checks.
    pub rwlock_poll_interval: Duration,
    /// How long `Semaphore::acquire` waits on its event between attempts.
    pub semaphore_poll_interval: Duration,
    /// Actor threads are named `<prefix>-<kind>`.
    pub thread_name_prefix: String,
    /// Stack size for actor threads; `None` uses the platform default.
    pub actor_stack_size: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rwlock_poll_interval: DEFAULT_RWLOCK_POLL_INTERVAL,
            semaphore_poll_interval: DEFAULT_SEMAPHORE_POLL_INTERVAL,
            thread_name_prefix: "tokensync".to_owned(),
            actor_stack_size: None,
        }
    }
}

impl SyncConfig {
    /// Defaults overlaid with any `TOKENSYNC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applies the environment variables that are set; unset ones are left
    /// alone.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(val) = read_env(ENV_RWLOCK_POLL_US) {
            self.rwlock_poll_interval = parse_micros(ENV_RWLOCK_POLL_US, &val)?;
        }
        if let Some(val) = read_env(ENV_SEMAPHORE_POLL_US) {
            self.semaphore_poll_interval = parse_micros(ENV_SEMAPHORE_POLL_US, &val)?;
        }
        if let Some(val) = read_env(ENV_THREAD_PREFIX) {
            self.thread_name_prefix = val;
        }
        if let Some(val) = read_env(ENV_ACTOR_STACK_SIZE) {
            self.actor_stack_size = Some(parse_usize(ENV_ACTOR_STACK_SIZE, &val)?);
        }
        self.validate()
    }

    /// Checks that the intervals are non-zero and the prefix non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rwlock_poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "rwlock_poll_interval",
                interval: self.rwlock_poll_interval,
            });
        }
        if self.semaphore_poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "semaphore_poll_interval",
                interval: self.semaphore_poll_interval,
            });
        }
        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::EmptyThreadPrefix);
        }
        Ok(())
    }

    /// Sets the read-write lock poll interval.
    #[must_use]
    pub fn with_rwlock_poll_interval(mut self, interval: Duration) -> Self {
        self.rwlock_poll_interval = interval;
        self
    }

    /// Sets the semaphore poll interval.
    #[must_use]
    pub fn with_semaphore_poll_interval(mut self, interval: Duration) -> Self {
        self.semaphore_poll_interval = interval;
        self
    }

    /// Sets the actor thread name prefix.
    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the actor thread stack size.
    #[must_use]
    pub fn with_actor_stack_size(mut self, bytes: usize) -> Self {
        self.actor_stack_size = Some(bytes);
        self
    }

    pub(crate) fn thread_name(&self, kind: &str) -> String {
        format!("{}-{kind}", self.thread_name_prefix)
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_usize(key: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidEnv {
            key,
            value: val.to_owned(),
            reason: e.to_string(),
        })
}

fn parse_micros(key: &'static str, val: &str) -> Result<Duration, ConfigError> {
    val.trim()
        .parse::<u64>()
        .map(Duration::from_micros)
        .map_err(|e| ConfigError::InvalidEnv {
            key,
            value: val.to_owned(),
            reason: e.to_string(),
        })
}
