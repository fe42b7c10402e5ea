//! Abstract browser-driver seam.
//!
//! The suite consumes a small capability set — find, click, type, refresh,
//! read URL — through the [`UiDriver`] trait and owns no browser itself.
//! Implementations plug in at this seam: `ChromiumSession` behind the
//! `browser` feature, [`MockDriver`] for unit tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::locator::Locator;
use crate::result::{CatadorError, CatadorResult};

/// Handle to a located DOM element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Text content, if any
    pub text: Option<String>,
    /// Whether the element accepts interaction
    pub enabled: bool,
    /// Whether the element is rendered
    pub displayed: bool,
    /// Attributes the suite reads back (entity ids ride on these)
    pub attributes: HashMap<String, String>,
}

impl ElementHandle {
    /// Create a visible, enabled element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text: None,
            enabled: true,
            displayed: true,
            attributes: HashMap::new(),
        }
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark the element disabled (present but not clickable)
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the element can be clicked right now
    #[must_use]
    pub const fn is_clickable(&self) -> bool {
        self.enabled && self.displayed
    }

    /// Read an attribute value
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Browser session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to the browser binary (None = auto-detect)
    pub browser_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            browser_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set the browser binary path
    #[must_use]
    pub fn browser_path(mut self, path: impl Into<String>) -> Self {
        self.browser_path = Some(path.into());
        self
    }

    /// Disable the sandbox (for containers/CI)
    #[must_use]
    pub const fn no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// The abstract capability set the suite consumes from a browser session.
///
/// One session drives one logical flow at a time; every method takes
/// `&mut self` and the suite never shares a session across flows.
#[async_trait]
pub trait UiDriver: Send {
    /// Navigate to an absolute URL
    async fn navigate(&mut self, url: &str) -> CatadorResult<()>;

    /// Look the element up once; absence is `Ok(None)`, not an error
    async fn find(&mut self, locator: &Locator) -> CatadorResult<Option<ElementHandle>>;

    /// Click the element
    async fn click(&mut self, locator: &Locator) -> CatadorResult<()>;

    /// Type text into the element
    async fn type_text(&mut self, locator: &Locator, text: &str) -> CatadorResult<()>;

    /// Clear the element's current value
    async fn clear(&mut self, locator: &Locator) -> CatadorResult<()>;

    /// Reload the current view
    async fn refresh(&mut self) -> CatadorResult<()>;

    /// Read the current URL
    async fn current_url(&mut self) -> CatadorResult<String>;

    /// Close the session
    async fn close(&mut self) -> CatadorResult<()>;
}

/// Scriptable driver for unit tests.
///
/// Elements can be installed as always-present, or scripted as a per-locator
/// sequence of lookup outcomes consumed one per [`UiDriver::find`] call —
/// which is how the wizard-completion properties stage "absent, absent,
/// absent, present". Refresh outcomes and click faults script the same way,
/// and every call lands in an interaction history so tests can assert what
/// was — and was not — performed.
#[derive(Debug, Default)]
pub struct MockDriver {
    url: String,
    elements: HashMap<String, ElementHandle>,
    scripted_finds: HashMap<String, VecDeque<Option<ElementHandle>>>,
    refresh_faults: VecDeque<bool>,
    click_faults: HashMap<String, u32>,
    history: Vec<String>,
}

impl MockDriver {
    /// Create an empty mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an always-present element for a locator
    pub fn install(&mut self, locator: &Locator, element: ElementHandle) {
        let _ = self.elements.insert(locator.query_key(), element);
    }

    /// Install an always-present default element for a locator
    pub fn install_default(&mut self, locator: &Locator) {
        self.install(locator, ElementHandle::new(locator.query_key(), "div"));
    }

    /// Script a sequence of lookup outcomes for a locator, consumed one per
    /// `find` call; when the sequence drains, lookups fall back to the
    /// installed elements
    pub fn script_find(&mut self, locator: &Locator, outcomes: Vec<Option<ElementHandle>>) {
        let _ = self
            .scripted_finds
            .insert(locator.query_key(), outcomes.into());
    }

    /// Script presence as booleans; `true` yields a default clickable element
    pub fn script_presence(&mut self, locator: &Locator, present: &[bool]) {
        let outcomes = present
            .iter()
            .map(|&p| p.then(|| ElementHandle::new(locator.query_key(), "button")))
            .collect();
        self.script_find(locator, outcomes);
    }

    /// Script refresh outcomes, consumed one per `refresh` call; `false`
    /// fails with a driver fault. When drained, refresh succeeds.
    pub fn script_refresh(&mut self, outcomes: &[bool]) {
        self.refresh_faults = outcomes.iter().copied().collect();
    }

    /// Make the next `count` clicks on a locator fail with a driver fault
    pub fn fail_clicks(&mut self, locator: &Locator, count: u32) {
        let _ = self.click_faults.insert(locator.query_key(), count);
    }

    /// Full interaction history, entries like `click:css:#save`
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Whether any call matching the prefix was made
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.history.iter().any(|c| c.starts_with(prefix))
    }

    /// Count of calls matching the prefix
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.history.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn lookup(&mut self, locator: &Locator) -> Option<ElementHandle> {
        let key = locator.query_key();
        if let Some(queue) = self.scripted_finds.get_mut(&key) {
            if let Some(outcome) = queue.pop_front() {
                return outcome;
            }
        }
        self.elements.get(&key).cloned()
    }
}

#[async_trait]
impl UiDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> CatadorResult<()> {
        self.history.push(format!("navigate:{url}"));
        self.url = url.to_string();
        Ok(())
    }

    async fn find(&mut self, locator: &Locator) -> CatadorResult<Option<ElementHandle>> {
        self.history.push(format!("find:{}", locator.query_key()));
        Ok(self.lookup(locator))
    }

    async fn click(&mut self, locator: &Locator) -> CatadorResult<()> {
        let key = locator.query_key();
        self.history.push(format!("click:{key}"));
        if let Some(remaining) = self.click_faults.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CatadorError::driver(format!(
                    "cannot perform native interaction on {locator}"
                )));
            }
        }
        Ok(())
    }

    async fn type_text(&mut self, locator: &Locator, text: &str) -> CatadorResult<()> {
        self.history
            .push(format!("type:{}:{text}", locator.query_key()));
        Ok(())
    }

    async fn clear(&mut self, locator: &Locator) -> CatadorResult<()> {
        self.history.push(format!("clear:{}", locator.query_key()));
        Ok(())
    }

    async fn refresh(&mut self) -> CatadorResult<()> {
        self.history.push("refresh".to_string());
        match self.refresh_faults.pop_front() {
            Some(false) => Err(CatadorError::driver("connection dropped during refresh")),
            _ => Ok(()),
        }
    }

    async fn current_url(&mut self) -> CatadorResult<String> {
        Ok(self.url.clone())
    }

    async fn close(&mut self) -> CatadorResult<()> {
        self.history.push("close".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save_button() -> Locator {
        Locator::css("#save", "the Save button")
    }

    #[tokio::test]
    async fn installed_elements_are_always_found() {
        let mut mock = MockDriver::new();
        mock.install_default(&save_button());
        assert!(mock.find(&save_button()).await.unwrap().is_some());
        assert!(mock.find(&save_button()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn scripted_finds_are_consumed_in_order() {
        let mut mock = MockDriver::new();
        mock.script_presence(&save_button(), &[false, false, true]);
        assert!(mock.find(&save_button()).await.unwrap().is_none());
        assert!(mock.find(&save_button()).await.unwrap().is_none());
        assert!(mock.find(&save_button()).await.unwrap().is_some());
        // Drained with nothing installed: absent again.
        assert!(mock.find(&save_button()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scripted_refresh_faults_then_recovers() {
        let mut mock = MockDriver::new();
        mock.script_refresh(&[false, true]);
        assert!(mock.refresh().await.is_err());
        assert!(mock.refresh().await.is_ok());
        assert!(mock.refresh().await.is_ok());
        assert_eq!(mock.call_count("refresh"), 3);
    }

    #[tokio::test]
    async fn click_faults_are_bounded() {
        let mut mock = MockDriver::new();
        mock.fail_clicks(&save_button(), 1);
        assert!(mock.click(&save_button()).await.is_err());
        assert!(mock.click(&save_button()).await.is_ok());
    }

    #[tokio::test]
    async fn history_records_calls_with_arguments() {
        let mut mock = MockDriver::new();
        mock.navigate("https://server.example/content").await.unwrap();
        let name = Locator::css("#provider_name", "the provider Name field");
        mock.type_text(&name, "acme").await.unwrap();
        assert!(mock.was_called("navigate:https://server.example/content"));
        assert!(mock.was_called("type:css:#provider_name:acme"));
        assert!(!mock.was_called("click"));
    }

    #[test]
    fn disabled_elements_are_not_clickable() {
        let handle = ElementHandle::new("e1", "button").disabled();
        assert!(!handle.is_clickable());
    }
}
