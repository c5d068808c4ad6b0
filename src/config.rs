use serde::Deserialize;

use crate::{Error, Result};

/// Number of workers started when nothing else is configured.
pub const DEFAULT_WORKER_COUNT: usize = 3;

/// Runtime configuration for the [`GerritHandler`](crate::GerritHandler).
///
/// Use the builder methods to customize, or [`Default`] for the usual
/// setup: three workers over an unbounded queue.
///
/// # Examples
///
/// ```rust
/// use gerrit_events::Config;
///
/// let config = Config::default()
///     .with_worker_count(5)
///     .with_queue_capacity(1024);
/// assert_eq!(config.worker_count, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Number of worker tasks draining the work queue.
    /// Only read at construction time.
    /// Default: 3
    pub worker_count: usize,

    /// Capacity of the work queue. `None` means unbounded, in which case
    /// submitting never waits.
    /// Default: None
    pub queue_capacity: Option<usize>,

    /// Prefix of worker names used in log output; workers are named
    /// `<prefix>-<index>`.
    /// Default: "gerrit-worker"
    pub worker_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            worker_count: DEFAULT_WORKER_COUNT,
            queue_capacity: None,
            worker_name_prefix: "gerrit-worker".to_string(),
        }
    }
}

impl Config {
    /// Set the number of workers started by the handler.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Bound the work queue. Producers wait for free capacity once the
    /// queue holds `capacity` items.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Make the work queue unbounded (the default).
    pub fn with_unbounded_queue(mut self) -> Self {
        self.queue_capacity = None;
        self
    }

    pub fn with_worker_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.worker_name_prefix = prefix.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.queue_capacity == Some(0) {
            return Err(Error::InvalidConfig("queue capacity must be greater than zero"));
        }
        Ok(())
    }
}
