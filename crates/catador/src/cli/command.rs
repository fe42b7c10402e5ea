//! Building and executing admin-tool invocations.
//!
//! An invocation is `<tool> <family> <action> [--flag=value ...]`. Options
//! are a typed map keyed by [`OptionKey`] — a closed enumeration with the
//! canonical flag spellings — so a misspelled flag cannot be constructed.

use std::collections::BTreeMap;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, trace};

use crate::result::{CatadorError, CatadorResult};

use super::table::{parse_table, Record};

/// The closed set of options the suite passes to the admin tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    /// Page size for list actions
    PerPage,
    /// Organization scope (required by content subcommands)
    OrganizationId,
    /// Server-side search filter, `field:"value"`
    Search,
    /// Entity name
    Name,
    /// Replacement name for update actions
    NewName,
    /// Entity id
    Id,
    /// Path to a key file for create actions
    KeyPath,
    /// Entity description
    Description,
}

impl OptionKey {
    /// Canonical long-flag spelling
    #[must_use]
    pub const fn flag(&self) -> &'static str {
        match self {
            Self::PerPage => "per-page",
            Self::OrganizationId => "organization-id",
            Self::Search => "search",
            Self::Name => "name",
            Self::NewName => "new-name",
            Self::Id => "id",
            Self::KeyPath => "key",
            Self::Description => "description",
        }
    }
}

/// Typed option map, serialized one flag per entry in a fixed order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    values: BTreeMap<OptionKey, String>,
}

impl CommandOptions {
    /// Create an empty option map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option
    #[must_use]
    pub fn set(mut self, key: OptionKey, value: impl Into<String>) -> Self {
        let _ = self.values.insert(key, value.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn per_page(self, size: u32) -> Self {
        self.set(OptionKey::PerPage, size.to_string())
    }

    /// Scope to an organization
    #[must_use]
    pub fn organization_id(self, id: impl Into<String>) -> Self {
        self.set(OptionKey::OrganizationId, id)
    }

    /// Set a server-side search filter on one field
    #[must_use]
    pub fn search(self, field: &str, value: &str) -> Self {
        self.set(OptionKey::Search, format!("{field}:\"{value}\""))
    }

    /// Whether a key is set
    #[must_use]
    pub fn contains(&self, key: OptionKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Read an option back
    #[must_use]
    pub fn get(&self, key: OptionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    /// Serialize to `--flag=value` arguments
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|(key, value)| format!("--{}={value}", key.flag()))
            .collect()
    }
}

/// A fully specified invocation: subcommand family, action, options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    family: String,
    action: String,
    options: CommandOptions,
}

impl CommandSpec {
    /// Create a spec for `<family> <action>`
    #[must_use]
    pub fn new(family: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            action: action.into(),
            options: CommandOptions::new(),
        }
    }

    /// Attach options
    #[must_use]
    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    /// The argument vector, without the tool binary.
    ///
    /// `structured` appends the flag that switches the tool to delimited
    /// tabular output.
    #[must_use]
    pub fn to_args(&self, structured: bool) -> Vec<String> {
        let mut args = vec![self.family.clone(), self.action.clone()];
        args.extend(self.options.to_args());
        if structured {
            args.push("--format=csv".to_string());
        }
        args
    }

    /// Rendered command line for error messages and logs
    #[must_use]
    pub fn render(&self, binary: &str) -> String {
        let mut line = binary.to_string();
        for arg in self.to_args(false) {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

/// Captured outcome of one tool invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit status (-1 when terminated by signal)
    pub status: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the tool exited zero
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Handle to the external admin tool
#[derive(Debug, Clone)]
pub struct AdminTool {
    binary: String,
}

impl AdminTool {
    /// Create a handle for the given binary (name on PATH or absolute path)
    #[must_use]
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The configured binary
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    async fn run(&self, spec: &CommandSpec, structured: bool) -> CatadorResult<CommandOutput> {
        let args = spec.to_args(structured);
        debug!(binary = %self.binary, ?args, "invoking admin tool");
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;
        let captured = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!(status = captured.status, stdout_bytes = captured.stdout.len(), "admin tool finished");
        Ok(captured)
    }

    /// Execute and capture, whatever the exit status
    pub async fn execute(&self, spec: &CommandSpec) -> CatadorResult<CommandOutput> {
        self.run(spec, false).await
    }

    /// Execute; a non-zero exit becomes a [`CatadorError::CommandFailed`]
    pub async fn execute_checked(&self, spec: &CommandSpec) -> CatadorResult<CommandOutput> {
        let output = self.run(spec, false).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(CatadorError::CommandFailed {
                command: spec.render(&self.binary),
                status: output.status,
                stderr: output.stderr,
            })
        }
    }

    /// Execute with structured output requested and decode stdout into
    /// records. Zero data rows decode to an empty vector, never an error.
    pub async fn execute_parsed(&self, spec: &CommandSpec) -> CatadorResult<Vec<Record>> {
        let output = self.run(spec, true).await?;
        if !output.success() {
            return Err(CatadorError::CommandFailed {
                command: spec.render(&self.binary),
                status: output.status,
                stderr: output.stderr,
            });
        }
        parse_table(&output.stdout)
    }
}
