//! Higher-level interaction helpers shared by the page objects.
//!
//! Every helper asserts presence *before* touching the element, so a missing
//! required field surfaces as a named failure with zero interactions
//! performed after it.

use tracing::{debug, warn};

use crate::driver::UiDriver;
use crate::locator::Locator;
use crate::result::{CatadorError, CatadorResult};
use crate::wait::{require_clickable, require_present, wait_until_present, WaitOptions};

/// How a guarded click was carried out.
///
/// The one seam where a native driver fault is recovered rather than
/// propagated: hover-menu navigation, where direct URL navigation is a
/// known-equivalent action. Callers see which branch ran instead of
/// inspecting exception types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The element was clicked natively
    Clicked,
    /// The click faulted at the driver level; the session navigated to the
    /// equivalent URL instead
    FallbackNavigated {
        /// URL the session navigated to
        url: String,
    },
}

/// Require the field, clear it, and type the value.
pub async fn fill_field<D>(
    driver: &mut D,
    locator: &Locator,
    value: &str,
    options: &WaitOptions,
) -> CatadorResult<()>
where
    D: UiDriver + ?Sized,
{
    let _ = require_present(driver, locator, options).await?;
    driver.clear(locator).await?;
    driver.type_text(locator, value).await
}

/// Fill the field only if it exists; returns whether it did.
///
/// For fields some server versions render and others do not (confirmation
/// inputs). Uses the non-fatal wait, then branches.
pub async fn fill_field_optional<D>(
    driver: &mut D,
    locator: &Locator,
    value: &str,
    options: &WaitOptions,
) -> CatadorResult<bool>
where
    D: UiDriver + ?Sized,
{
    match wait_until_present(driver, locator, options).await? {
        Some(_) => {
            driver.clear(locator).await?;
            driver.type_text(locator, value).await?;
            Ok(true)
        }
        None => {
            debug!(element = %locator, "optional field absent, skipping");
            Ok(false)
        }
    }
}

/// Require the element clickable, then click it. Click faults propagate.
pub async fn click_required<D>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
) -> CatadorResult<()>
where
    D: UiDriver + ?Sized,
{
    let _ = require_clickable(driver, locator, options).await?;
    driver.click(locator).await
}

/// Click the element only if it exists and is clickable; returns whether it
/// was clicked.
pub async fn click_optional<D>(
    driver: &mut D,
    locator: &Locator,
    options: &WaitOptions,
) -> CatadorResult<bool>
where
    D: UiDriver + ?Sized,
{
    match crate::wait::wait_until_clickable(driver, locator, options).await? {
        Some(_) => {
            driver.click(locator).await?;
            Ok(true)
        }
        None => {
            debug!(element = %locator, "optional control absent, skipping");
            Ok(false)
        }
    }
}

/// Click the element, falling back to direct navigation on a driver fault.
///
/// Absence of the element is still fatal — the fallback covers interaction
/// faults only, and only because `fallback_url` is known-equivalent for this
/// action.
pub async fn click_or_navigate<D>(
    driver: &mut D,
    locator: &Locator,
    fallback_url: &str,
    options: &WaitOptions,
) -> CatadorResult<ClickOutcome>
where
    D: UiDriver + ?Sized,
{
    let _ = require_clickable(driver, locator, options).await?;
    match driver.click(locator).await {
        Ok(()) => Ok(ClickOutcome::Clicked),
        Err(CatadorError::Driver { message }) => {
            warn!(element = %locator, %message, url = fallback_url, "native click faulted, navigating directly");
            driver.navigate(fallback_url).await?;
            Ok(ClickOutcome::FallbackNavigated {
                url: fallback_url.to_string(),
            })
        }
        Err(other) => Err(other),
    }
}
