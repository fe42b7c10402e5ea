//! Catador: end-to-end automation suite for the content-server management
//! application.
//!
//! Two thin layers over the system under test:
//!
//! - **UI**: typed page objects ([`pages`]) over an abstract browser driver
//!   ([`UiDriver`]), with bounded waits, guarded interactions, and a
//!   deterministic bounded-retry engine for the long-running deployment
//!   wizard ([`wizard`]).
//! - **Admin CLI**: typed invocations of the server's command-line tool and
//!   a decoder for its tabular output ([`cli`]).
//!
//! ```text
//! ┌────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │ Flow /     │────►│ Page objects │────►│ UiDriver seam    │
//! │ runner     │     │ + wizard     │     │ (CDP or mock)    │
//! │            │────►│ cli wrappers │────►│ admin subprocess │
//! └────────────┘     └──────────────┘     └──────────────────┘
//! ```
//!
//! The suite owns no persistent state; everything it asserts on lives in the
//! remote application, the browser session, or the tool's output.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod cli;
pub mod config;
pub mod data;
mod driver;
mod interact;
mod locator;
pub mod manifest;
pub mod pages;
mod result;
mod wait;
pub mod wizard;

/// Real CDP-backed driver (requires chromium)
#[cfg(feature = "browser")]
pub mod browser;

pub use driver::{DriverConfig, ElementHandle, MockDriver, UiDriver};
pub use interact::{
    click_optional, click_or_navigate, click_required, fill_field, fill_field_optional,
    ClickOutcome,
};
pub use locator::{Locator, LocatorTemplate, Strategy};
pub use result::{CatadorError, CatadorResult};
pub use wait::{
    require_clickable, require_present, wait_until_clickable, wait_until_present, WaitOptions,
};

#[cfg(feature = "browser")]
pub use browser::ChromiumSession;
