//! Layer configuration
//!
//! Compile-time defaults with runtime environment overrides. Every thread
//! created through the layer gets the configured stack size, priority, and
//! name prefix; per-create overrides are out of scope, matching the rejected
//! thread attributes.
//!
//! # Example
//!
//! ```ignore
//! use xpthread::ThreadConfig;
//!
//! // Defaults with env overrides
//! let config = ThreadConfig::from_env();
//!
//! // Or customize programmatically
//! let config = ThreadConfig::new().stack_size(128 * 1024).priority(10);
//! ```

use xpthread_core::env::env_get;
use xpthread_core::{xprintln, ThreadError};

/// Compile-time defaults
pub mod defaults {
    /// Stack size per thread
    pub const STACK_SIZE: usize = 64 * 1024;

    /// Task priority (advisory; RTOS-style backends enforce it)
    pub const PRIORITY: u8 = 5;

    /// Task name prefix
    pub const TASK_NAME: &str = "pthread";

    /// Registry capacity (live threads)
    pub const MAX_THREADS: u32 = 1024;
}

/// Thread-creation configuration with builder pattern.
///
/// Use `from_env()` to start with compile-time defaults and apply any
/// environment variable overrides.
#[derive(Debug, Clone)]
pub struct ThreadConfig {
    /// Stack size per thread in bytes
    pub stack_size: usize,
    /// Task priority handed to the backend
    pub priority: u8,
    /// Task name prefix
    pub task_name: String,
    /// Maximum live threads (registry capacity)
    pub max_threads: u32,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ThreadConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `XPT_STACK_SIZE` - Stack size per thread in bytes
    /// - `XPT_TASK_PRIORITY` - Task priority
    /// - `XPT_TASK_NAME` - Task name prefix
    /// - `XPT_MAX_THREADS` - Registry capacity
    pub fn from_env() -> Self {
        Self {
            stack_size: env_get("XPT_STACK_SIZE", defaults::STACK_SIZE),
            priority: env_get("XPT_TASK_PRIORITY", defaults::PRIORITY),
            task_name: env_get("XPT_TASK_NAME", defaults::TASK_NAME.to_string()),
            max_threads: env_get("XPT_MAX_THREADS", defaults::MAX_THREADS),
        }
    }

    /// Create config with explicit defaults (no env override).
    /// Useful for testing or when you want full control.
    pub fn new() -> Self {
        Self {
            stack_size: defaults::STACK_SIZE,
            priority: defaults::PRIORITY,
            task_name: defaults::TASK_NAME.to_string(),
            max_threads: defaults::MAX_THREADS,
        }
    }

    // Builder methods

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }

    pub fn max_threads(mut self, n: u32) -> Self {
        self.max_threads = n;
        self
    }

    /// Validate configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_size < 16 * 1024 {
            return Err(ConfigError::InvalidValue("stack_size must be >= 16KB"));
        }
        if self.priority > 31 {
            return Err(ConfigError::InvalidValue("priority must be <= 31"));
        }
        if self.task_name.is_empty() {
            return Err(ConfigError::InvalidValue("task_name must not be empty"));
        }
        if self.max_threads == 0 {
            return Err(ConfigError::InvalidValue("max_threads must be > 0"));
        }
        if self.max_threads > 65536 {
            return Err(ConfigError::InvalidValue("max_threads must be <= 65536"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        xprintln!("xpthread configuration:");
        xprintln!("  stack_size:   {}", self.stack_size);
        xprintln!("  priority:     {}", self.priority);
        xprintln!("  task_name:    {}", self.task_name);
        xprintln!("  max_threads:  {}", self.max_threads);
    }
}

/// Configuration error
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ThreadError {
    fn from(_: ConfigError) -> Self {
        ThreadError::InvalidArgument
    }
}
