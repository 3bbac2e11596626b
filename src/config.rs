//! Pool configuration.
//!
//! [`PoolConfig`] is a plain value with defaults matching the runtime's
//! contract: 10 workers, 25 queued tasks per queue, a 10 ms dispatch sweep,
//! and a 100 ms wait-poll slice. Setters chain, so a customized pool reads
//! as one expression:
//!
//! ```
//! use threadmill::PoolConfig;
//!
//! let config = PoolConfig::new().max_threads(4).max_tasks(64);
//! assert_eq!(config.max_threads, 4);
//! ```

use std::time::Duration;

/// Advisory platform identifier.
///
/// Platform binding is compile-selected from the actual target OS; this value
/// is carried for API compatibility and diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformId {
    /// Windows platform hint.
    Windows,
    /// No platform hint.
    #[default]
    None,
}

/// Configuration for [`crate::Pool`].
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Advisory platform identifier. Never consulted for platform selection.
    pub platform: PlatformId,
    /// Number of worker threads to create.
    pub max_threads: usize,
    /// Capacity of each submission queue.
    pub max_tasks: usize,
    /// Period of the dispatcher sweep.
    pub dispatch_interval: Duration,
    /// Granularity of the polling loop in `wait_for_object`.
    pub wait_poll_interval: Duration,
    /// Stack size for worker threads; `None` uses the platform default.
    pub worker_stack_size: Option<usize>,
    /// Prefix for worker and dispatcher thread names.
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            platform: PlatformId::default(),
            max_threads: 10,
            max_tasks: 25,
            dispatch_interval: Duration::from_millis(10),
            wait_poll_interval: Duration::from_millis(100),
            worker_stack_size: None,
            thread_name_prefix: "threadmill".to_string(),
        }
    }
}

impl PoolConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the advisory platform identifier.
    #[must_use]
    pub fn platform(mut self, platform: PlatformId) -> Self {
        self.platform = platform;
        self
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Sets the per-queue capacity.
    #[must_use]
    pub fn max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    /// Sets the dispatcher sweep period.
    #[must_use]
    pub fn dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    /// Sets the wait-poll granularity.
    #[must_use]
    pub fn wait_poll_interval(mut self, interval: Duration) -> Self {
        self.wait_poll_interval = interval;
        self
    }

    /// Sets the worker thread stack size.
    #[must_use]
    pub fn worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }

    /// Sets the thread-name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}
