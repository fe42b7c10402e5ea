//! Suite configuration.
//!
//! One YAML file describes the instance under test: where it is, who logs
//! in, which admin-tool binary to invoke, where manifests live, and the
//! wait/completion budgets. Secrets can be left out of the file and
//! supplied through the environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::DriverConfig;
use crate::result::{CatadorError, CatadorResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PROBE_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS};
use crate::wizard::CompletionPolicy;

/// Login credentials for the web UI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name
    pub username: String,
    /// Account password
    pub password: String,
}

/// Admin-tool binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminToolConfig {
    /// Binary name on PATH or an absolute path
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Organization every content subcommand is scoped to
    pub organization_id: String,
}

fn default_binary() -> String {
    "martillo".to_string()
}

impl Default for AdminToolConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            organization_id: String::new(),
        }
    }
}

/// Wait budgets for element lookups
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Timeout for required elements, in milliseconds
    pub element_ms: u64,
    /// Timeout for optional-element probes, in milliseconds
    pub probe_ms: u64,
    /// Polling interval, in milliseconds
    pub poll_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            element_ms: DEFAULT_WAIT_TIMEOUT_MS,
            probe_ms: DEFAULT_PROBE_TIMEOUT_MS,
            poll_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitConfig {
    /// Options for required elements
    #[must_use]
    pub const fn element(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.element_ms,
            poll_interval_ms: self.poll_ms,
        }
    }

    /// Options for optional-element probes
    #[must_use]
    pub const fn probe(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.probe_ms,
            poll_interval_ms: self.poll_ms,
        }
    }
}

/// Everything the suite needs to run against one instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Base URL of the instance, e.g. `https://server.example`
    pub base_url: String,
    /// UI credentials
    #[serde(default)]
    pub credentials: Credentials,
    /// Admin-tool binding
    #[serde(default)]
    pub admin_tool: AdminToolConfig,
    /// Directory holding subscription manifests
    #[serde(default)]
    pub manifest_dir: PathBuf,
    /// Wait budgets
    #[serde(default)]
    pub wait: WaitConfig,
    /// Wizard-completion budgets
    #[serde(default)]
    pub completion: CompletionPolicy,
    /// Browser session settings
    #[serde(default)]
    pub driver: DriverConfig,
}

impl SuiteConfig {
    /// Load from a YAML file
    pub fn load(path: &Path) -> CatadorResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_ng::from_str(&raw)?;
        debug!(path = %path.display(), base_url = %config.base_url, "loaded suite config");
        Ok(config)
    }

    /// Overlay values from the environment: `CATADOR_BASE_URL`,
    /// `CATADOR_USERNAME`, `CATADOR_PASSWORD`, `CATADOR_TOOL`.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Ok(value) = std::env::var("CATADOR_BASE_URL") {
            self.base_url = value;
        }
        if let Ok(value) = std::env::var("CATADOR_USERNAME") {
            self.credentials.username = value;
        }
        if let Ok(value) = std::env::var("CATADOR_PASSWORD") {
            self.credentials.password = value;
        }
        if let Ok(value) = std::env::var("CATADOR_TOOL") {
            self.admin_tool.binary = value;
        }
        self
    }

    /// Reject configs that cannot possibly drive an instance
    pub fn validate(&self) -> CatadorResult<()> {
        if self.base_url.is_empty() {
            return Err(CatadorError::config("base_url is required"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CatadorError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.admin_tool.organization_id.is_empty() {
            return Err(CatadorError::config("admin_tool.organization_id is required"));
        }
        Ok(())
    }

    /// Absolute URL for a path under the instance
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
