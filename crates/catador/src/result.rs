//! Result and error types for Catador.

use thiserror::Error;

/// Result type for Catador operations
pub type CatadorResult<T> = Result<T, CatadorError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum CatadorError {
    /// A required UI element was absent after the bounded wait
    #[error("Element not found: {description}")]
    ElementNotFound {
        /// What the caller was looking for
        description: String,
    },

    /// A flow-level assertion failed (an entity that should exist does not,
    /// or the other way around)
    #[error("Assertion failed: {message}")]
    Assertion {
        /// What was asserted
        message: String,
    },

    /// A driver-level interaction fault (native click, stale handle, lost session)
    #[error("Driver fault: {message}")]
    Driver {
        /// Error message from the driver
        message: String,
    },

    /// Browser session could not be opened
    #[error("Failed to launch browser session: {message}")]
    SessionLaunch {
        /// Error message
        message: String,
    },

    /// Navigation to a URL failed
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A bounded wait ran out of time
    #[error("Timed out after {ms}ms waiting for {waiting_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        waiting_for: String,
    },

    /// The wizard-completion control never became available within the
    /// outer attempt budget. Distinct from [`CatadorError::ElementNotFound`].
    #[error("Completion control never became available after {attempts} attempts")]
    CompletionExhausted {
        /// Outer polling attempts performed
        attempts: u32,
    },

    /// The operation was cancelled cooperatively
    #[error("Operation cancelled")]
    Cancelled,

    /// The admin tool exited non-zero
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit status (or -1 when killed by signal)
        status: i32,
        /// Captured standard error
        stderr: String,
    },

    /// The admin tool produced output the tabular decoder cannot read
    #[error("Malformed tool output at line {line}: {message}")]
    OutputParse {
        /// 1-based line number in stdout
        line: usize,
        /// What went wrong
        message: String,
    },

    /// A symbolic manifest name did not resolve to a file
    #[error("Manifest {name:?} not found in the manifest store")]
    ManifestMissing {
        /// Symbolic manifest name
        name: String,
    },

    /// Suite configuration is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A locator template was malformed
    #[error("Invalid locator template: {message}")]
    Template {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl CatadorError {
    /// Create an element-not-found error
    #[must_use]
    pub fn not_found(description: impl Into<String>) -> Self {
        Self::ElementNotFound {
            description: description.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a driver-fault error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this failure is the exhausted-retry outcome of the
    /// wizard-completion loop rather than an ordinary lookup failure
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::CompletionExhausted { .. })
    }
}
