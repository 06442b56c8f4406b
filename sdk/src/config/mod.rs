//! Configuration presets for the bridge
//!
//! Reply timeouts bound how long an outward call waits for its counterpart;
//! the dispatch settings bound the inbound worker pool.

use std::time::Duration;

/// Configuration for a [`Bridge`](crate::Bridge)
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Timeout for signal, query, stop and disconnect calls
    pub reply_timeout: Duration,
    /// Timeout for workflow invocations; `None` waits for the reply indefinitely
    pub workflow_reply_timeout: Option<Duration>,
    /// Timeout for activity invocations; `None` waits for the reply indefinitely
    pub activity_reply_timeout: Option<Duration>,
    /// Maximum number of inbound envelopes dispatched concurrently
    pub max_concurrent_dispatch: usize,
    /// Capacity of the inbound frame queue
    pub inbound_queue_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BridgeConfig {
    /// Default configuration suitable for most use cases
    pub const DEFAULT: Self = Self {
        reply_timeout: Duration::from_secs(30),
        workflow_reply_timeout: None,
        activity_reply_timeout: None,
        max_concurrent_dispatch: 64,
        inbound_queue_size: 1024,
    };

    /// High-throughput configuration for busy workers
    pub const HIGH_THROUGHPUT: Self = Self {
        reply_timeout: Duration::from_secs(15),
        workflow_reply_timeout: None,
        activity_reply_timeout: None,
        max_concurrent_dispatch: 512,
        inbound_queue_size: 8192,
    };

    /// Low-resource configuration for constrained environments
    pub const LOW_RESOURCE: Self = Self {
        reply_timeout: Duration::from_secs(60),
        workflow_reply_timeout: None,
        activity_reply_timeout: None,
        max_concurrent_dispatch: 4,
        inbound_queue_size: 64,
    };

    /// Create a new configuration with validation
    pub fn new(
        reply_timeout: Duration,
        max_concurrent_dispatch: usize,
        inbound_queue_size: usize,
    ) -> Result<Self, ConfigError> {
        if reply_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "reply_timeout must be positive".to_string(),
            ));
        }
        if max_concurrent_dispatch == 0 {
            return Err(ConfigError::InvalidValue(
                "max_concurrent_dispatch must be positive".to_string(),
            ));
        }
        if inbound_queue_size == 0 {
            return Err(ConfigError::InvalidValue(
                "inbound_queue_size must be positive".to_string(),
            ));
        }

        Ok(Self {
            reply_timeout,
            max_concurrent_dispatch,
            inbound_queue_size,
            ..Self::DEFAULT
        })
    }

    /// Set the timeout for signal, query, stop and disconnect calls
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Bound workflow invocations
    pub fn with_workflow_reply_timeout(mut self, timeout: Duration) -> Self {
        self.workflow_reply_timeout = Some(timeout);
        self
    }

    /// Bound activity invocations
    pub fn with_activity_reply_timeout(mut self, timeout: Duration) -> Self {
        self.activity_reply_timeout = Some(timeout);
        self
    }

    /// Set the inbound dispatch concurrency
    pub fn with_max_concurrent_dispatch(mut self, max: usize) -> Self {
        self.max_concurrent_dispatch = max;
        self
    }

    /// Check a configuration assembled through the `with_*` setters
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(
            self.reply_timeout,
            self.max_concurrent_dispatch,
            self.inbound_queue_size,
        )
        .map(|_| ())
    }
}

/// Configuration error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
