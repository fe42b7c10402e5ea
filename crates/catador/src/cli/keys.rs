//! Signing-key management through the admin tool.
//!
//! Content subcommands are always organization-scoped, so the wrapper binds
//! an organization id once and threads it into every invocation.

use std::path::Path;

use tracing::debug;

use crate::result::CatadorResult;

use super::command::{AdminTool, CommandOptions, CommandOutput, CommandSpec, OptionKey};
use super::table::Record;

const FAMILY: &str = "signing-key";

/// Page size large enough to make list actions effectively unpaginated
const LIST_PER_PAGE: u32 = 10_000;

/// Wrapper for the tool's signing-key subcommand family
#[derive(Debug, Clone)]
pub struct SigningKeys {
    tool: AdminTool,
    organization_id: String,
}

impl SigningKeys {
    /// Bind the wrapper to a tool handle and an organization
    #[must_use]
    pub fn new(tool: AdminTool, organization_id: impl Into<String>) -> Self {
        Self {
            tool,
            organization_id: organization_id.into(),
        }
    }

    fn scoped(&self, options: CommandOptions) -> CommandOptions {
        options.organization_id(self.organization_id.clone())
    }

    /// List signing keys in the organization.
    ///
    /// With no options, lists everything (page size raised so pagination
    /// does not truncate the result).
    pub async fn list(&self, options: Option<CommandOptions>) -> CatadorResult<Vec<Record>> {
        let options = options.unwrap_or_else(|| CommandOptions::new().per_page(LIST_PER_PAGE));
        let spec = CommandSpec::new(FAMILY, "list").with_options(self.scoped(options));
        self.tool.execute_parsed(&spec).await
    }

    /// Show one signing key by id; absent id decodes to `None`
    pub async fn info(&self, id: &str) -> CatadorResult<Option<Record>> {
        let spec = CommandSpec::new(FAMILY, "info")
            .with_options(self.scoped(CommandOptions::new().set(OptionKey::Id, id)));
        let mut records = self.tool.execute_parsed(&spec).await?;
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.remove(0))
        })
    }

    /// Create a signing key from a key file
    pub async fn create(&self, name: &str, key_path: &Path) -> CatadorResult<CommandOutput> {
        let options = CommandOptions::new()
            .set(OptionKey::Name, name)
            .set(OptionKey::KeyPath, key_path.to_string_lossy());
        let spec = CommandSpec::new(FAMILY, "create").with_options(self.scoped(options));
        self.tool.execute_checked(&spec).await
    }

    /// Rename a signing key
    pub async fn update(&self, name: &str, new_name: &str) -> CatadorResult<CommandOutput> {
        let options = CommandOptions::new()
            .set(OptionKey::Name, name)
            .set(OptionKey::NewName, new_name);
        let spec = CommandSpec::new(FAMILY, "update").with_options(self.scoped(options));
        self.tool.execute_checked(&spec).await
    }

    /// Delete a signing key by name
    pub async fn delete(&self, name: &str) -> CatadorResult<CommandOutput> {
        let spec = CommandSpec::new(FAMILY, "delete")
            .with_options(self.scoped(CommandOptions::new().set(OptionKey::Name, name)));
        self.tool.execute_checked(&spec).await
    }

    /// Search for a signing key by one field, returning at most one record —
    /// the head of the filtered result set, `None` when nothing matches.
    pub async fn exists(&self, field: &str, value: &str) -> CatadorResult<Option<Record>> {
        let options = CommandOptions::new()
            .per_page(LIST_PER_PAGE)
            .search(field, value);
        let mut records = self.list(Some(options)).await?;
        if records.len() > 1 {
            debug!(
                field,
                value,
                surplus = records.len() - 1,
                "search matched more than one record, taking the head"
            );
        }
        Ok(if records.is_empty() {
            None
        } else {
            Some(records.remove(0))
        })
    }
}
