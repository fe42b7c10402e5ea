//! Bounded-poll element waits.
//!
//! Two variants, deliberately distinct:
//!
//! - [`wait_until_present`] / [`wait_until_clickable`] are **non-fatal**:
//!   absence after the bound is `Ok(None)`. Conditional UI steps (a
//!   confirmation field only some server versions render) branch on this.
//! - [`require_present`] / [`require_clickable`] are **fatal**: absence is a
//!   named [`ElementNotFound`](crate::CatadorError::ElementNotFound) carrying
//!   the element's description, raised before any interaction is attempted.
//!
//! Driver-level faults always propagate; a fault is not absence.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::driver::{ElementHandle, UiDriver};
use crate::locator::Locator;
use crate::result::{CatadorError, CatadorResult};

/// Default timeout for element waits (12 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 12_000;

/// Default timeout for optional-element probes (3 seconds)
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Options for a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Short-bound options for probing optional elements
    #[must_use]
    pub const fn probe() -> Self {
        Self {
            timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Set the timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as a Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

async fn poll<D, F>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
    accept: F,
) -> CatadorResult<Option<ElementHandle>>
where
    D: UiDriver + ?Sized,
    F: Fn(&ElementHandle) -> bool,
{
    let start = Instant::now();
    loop {
        if let Some(element) = driver.find(locator).await? {
            if accept(&element) {
                trace!(element = %locator, elapsed_ms = start.elapsed().as_millis() as u64, "element ready");
                return Ok(Some(element));
            }
        }
        if start.elapsed() >= options.timeout() {
            debug!(element = %locator, timeout_ms = options.timeout_ms, "element did not appear");
            return Ok(None);
        }
        sleep(options.poll_interval()).await;
    }
}

/// Poll until the element exists. Absence after the bound is `Ok(None)`.
pub async fn wait_until_present<D>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
) -> CatadorResult<Option<ElementHandle>>
where
    D: UiDriver + ?Sized,
{
    poll(driver, locator, options, |_| true).await
}

/// Poll until the element exists and accepts interaction.
pub async fn wait_until_clickable<D>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
) -> CatadorResult<Option<ElementHandle>>
where
    D: UiDriver + ?Sized,
{
    poll(driver, locator, options, ElementHandle::is_clickable).await
}

/// Like [`wait_until_present`], but absence is fatal and descriptive.
pub async fn require_present<D>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
) -> CatadorResult<ElementHandle>
where
    D: UiDriver + ?Sized,
{
    wait_until_present(driver, locator, options)
        .await?
        .ok_or_else(|| CatadorError::not_found(locator.description()))
}

/// Like [`wait_until_clickable`], but absence is fatal and descriptive.
pub async fn require_clickable<D>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
) -> CatadorResult<ElementHandle>
where
    D: UiDriver + ?Sized,
{
    wait_until_clickable(driver, locator, options)
        .await?
        .ok_or_else(|| CatadorError::not_found(locator.description()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    fn next_button() -> Locator {
        Locator::css("#next", "the Next button")
    }

    fn short() -> WaitOptions {
        WaitOptions::new().with_timeout(2_000).with_poll_interval(100)
    }

    #[tokio::test(start_paused = true)]
    async fn present_element_returns_immediately() {
        let mut mock = MockDriver::new();
        mock.install_default(&next_button());
        let found = wait_until_present(&mut mock, &next_button(), &short())
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(mock.call_count("find"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_element_is_none_not_error() {
        let mut mock = MockDriver::new();
        let found = wait_until_present(&mut mock, &next_button(), &short())
            .await
            .unwrap();
        assert!(found.is_none());
        // Polled more than once before giving up.
        assert!(mock.call_count("find") > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn element_appearing_mid_wait_is_found() {
        let mut mock = MockDriver::new();
        mock.script_presence(&next_button(), &[false, false, true]);
        let found = wait_until_present(&mut mock, &next_button(), &short())
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(mock.call_count("find"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn clickable_skips_disabled_elements() {
        let mut mock = MockDriver::new();
        mock.script_find(
            &next_button(),
            vec![
                Some(crate::driver::ElementHandle::new("n", "button").disabled()),
                Some(crate::driver::ElementHandle::new("n", "button")),
            ],
        );
        let found = wait_until_clickable(&mut mock, &next_button(), &short())
            .await
            .unwrap();
        assert!(found.unwrap().is_clickable());
        assert_eq!(mock.call_count("find"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn require_names_the_missing_element() {
        let mut mock = MockDriver::new();
        let err = require_present(&mut mock, &next_button(), &short())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Element not found: the Next button");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_checks_exactly_once() {
        let mut mock = MockDriver::new();
        let options = WaitOptions::new().with_timeout(0);
        let found = wait_until_present(&mut mock, &next_button(), &options)
            .await
            .unwrap();
        assert!(found.is_none());
        assert_eq!(mock.call_count("find"), 1);
    }
}
