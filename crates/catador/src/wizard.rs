//! Bounded-retry completion protocol for long-running wizard actions.
//!
//! After the deployment wizard's final submit, the server may take hours to
//! finish. The suite polls for the continue control under two explicit
//! budgets: an outer attempt budget (one probe per fixed interval) and an
//! inner budget for retrying the view refresh itself, which can fail
//! transiently while the server is under load. Termination is deterministic:
//! the loop ends in success, cancellation, or
//! [`CompletionExhausted`](crate::CatadorError::CompletionExhausted) — never
//! by running forever.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::driver::UiDriver;
use crate::locator::Locator;
use crate::result::{CatadorError, CatadorResult};

/// Default outer polling attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 240;

/// Default pause between outer attempts (90 seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 90;

/// Default inner refresh retries per outer attempt
pub const DEFAULT_REFRESH_ATTEMPTS: u32 = 40;

/// Default backoff after a failed refresh (15 seconds)
pub const DEFAULT_REFRESH_BACKOFF_SECS: u64 = 15;

/// Budgets for the completion loop.
///
/// Defaults give a wall-clock ceiling of roughly six hours: 240 attempts,
/// 90 seconds apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionPolicy {
    /// Outer polling attempts before giving up
    pub max_attempts: u32,
    /// Pause before each outer attempt, in seconds
    pub poll_interval_secs: u64,
    /// Refresh retries per outer attempt
    pub refresh_attempts: u32,
    /// Pause after a failed refresh, in seconds
    pub refresh_backoff_secs: u64,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            refresh_attempts: DEFAULT_REFRESH_ATTEMPTS,
            refresh_backoff_secs: DEFAULT_REFRESH_BACKOFF_SECS,
        }
    }
}

impl CompletionPolicy {
    /// Create a policy with the default budgets
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outer attempt budget
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the outer polling interval in seconds
    #[must_use]
    pub const fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Set the inner refresh retry budget
    #[must_use]
    pub const fn with_refresh_attempts(mut self, attempts: u32) -> Self {
        self.refresh_attempts = attempts;
        self
    }

    /// Set the refresh backoff in seconds
    #[must_use]
    pub const fn with_refresh_backoff_secs(mut self, secs: u64) -> Self {
        self.refresh_backoff_secs = secs;
        self
    }

    /// Outer polling interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Refresh backoff as a Duration
    #[must_use]
    pub const fn refresh_backoff(&self) -> Duration {
        Duration::from_secs(self.refresh_backoff_secs)
    }

    /// Upper bound on time spent polling (excludes refresh backoffs)
    #[must_use]
    pub const fn wall_clock_ceiling(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs * self.max_attempts as u64)
    }
}

/// Phase of the completion protocol, for logging and progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    /// The long-running action has been submitted
    Submitted,
    /// The loop is probing for the continue control
    Polling,
    /// The continue control was clicked
    Completed,
    /// The outer attempt budget ran out
    Exhausted,
}

impl std::fmt::Display for WizardPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
        };
        write!(f, "{name}")
    }
}

/// What the completion loop did before terminating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStats {
    /// Outer polling attempts performed, including the successful one
    pub attempts: u32,
    /// Failed view refreshes across the whole wait (each one cost a backoff
    /// sleep); successful refreshes are not counted
    pub refresh_retries: u32,
}

async fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> CatadorResult<()> {
    tokio::select! {
        () = cancel.cancelled() => Err(CatadorError::Cancelled),
        () = sleep(duration) => Ok(()),
    }
}

/// Poll until the continue control becomes clickable, then click it.
///
/// Each outer attempt sleeps the polling interval and probes the control
/// once. An absent or disabled control refreshes the view, itself retried
/// under the inner budget; running out of inner budget is non-fatal (the
/// outer budget still bounds the loop). Cancellation is cooperative and
/// checked during every sleep.
pub async fn await_completion<D>(
    driver: &mut D,
    continue_control: &Locator,
    policy: &CompletionPolicy,
    cancel: &CancellationToken,
) -> CatadorResult<CompletionStats>
where
    D: UiDriver + ?Sized,
{
    let mut phase = WizardPhase::Submitted;
    let mut refresh_retries: u32 = 0;

    info!(
        %phase,
        control = %continue_control,
        max_attempts = policy.max_attempts,
        interval_secs = policy.poll_interval_secs,
        ceiling_secs = policy.wall_clock_ceiling().as_secs(),
        "waiting for wizard completion"
    );

    for attempt in 1..=policy.max_attempts {
        sleep_cancellable(policy.poll_interval(), cancel).await?;
        phase = WizardPhase::Polling;

        match driver.find(continue_control).await? {
            Some(element) if element.is_clickable() => {
                driver.click(continue_control).await?;
                phase = WizardPhase::Completed;
                info!(%phase, attempt, refresh_retries, "wizard completed");
                return Ok(CompletionStats {
                    attempts: attempt,
                    refresh_retries,
                });
            }
            _ => {
                debug!(%phase, attempt, "continue control not yet available, refreshing view");
                let mut refreshed = false;
                for _ in 0..policy.refresh_attempts {
                    if cancel.is_cancelled() {
                        return Err(CatadorError::Cancelled);
                    }
                    match driver.refresh().await {
                        Ok(()) => {
                            refreshed = true;
                            break;
                        }
                        Err(fault) => {
                            refresh_retries += 1;
                            debug!(%fault, refresh_retries, "view refresh failed, backing off");
                            sleep_cancellable(policy.refresh_backoff(), cancel).await?;
                        }
                    }
                }
                if !refreshed {
                    warn!(attempt, budget = policy.refresh_attempts, "refresh budget exhausted, continuing to poll");
                }
            }
        }
    }

    phase = WizardPhase::Exhausted;
    warn!(%phase, attempts = policy.max_attempts, refresh_retries, "completion control never became available");
    Err(CatadorError::CompletionExhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    fn continue_control() -> Locator {
        Locator::css("#wizard_next", "the deployment Continue button")
    }

    fn fast_policy() -> CompletionPolicy {
        // Real budgets, short sleeps; paused tokio time makes even the real
        // intervals instant, but short ones keep intent obvious.
        CompletionPolicy::new()
            .with_poll_interval_secs(1)
            .with_refresh_backoff_secs(1)
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_fourth_attempt_with_no_refresh_retries() {
        let mut mock = MockDriver::new();
        mock.script_presence(&continue_control(), &[false, false, false, true]);
        let stats = await_completion(
            &mut mock,
            &continue_control(),
            &fast_policy(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(stats.attempts, 4);
        assert_eq!(stats.refresh_retries, 0);
        assert_eq!(mock.call_count("click"), 1);
        // One successful refresh per absent attempt, none of them retried.
        assert_eq!(mock.call_count("refresh"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_failed_refreshes_then_keeps_polling() {
        let mut mock = MockDriver::new();
        mock.script_presence(&continue_control(), &[false, true]);
        mock.script_refresh(&[false, false, false, false, false, true]);
        let stats = await_completion(
            &mut mock,
            &continue_control(),
            &fast_policy(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(stats.refresh_retries, 5);
        assert_eq!(stats.attempts, 2);
        assert_eq!(mock.call_count("refresh"), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_exactly_the_outer_budget() {
        let mut mock = MockDriver::new();
        // Control never appears; refresh always succeeds.
        let err = await_completion(
            &mut mock,
            &continue_control(),
            &fast_policy(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            CatadorError::CompletionExhausted { attempts: 240 }
        ));
        assert_eq!(mock.call_count("find"), 240);
        assert!(!mock.was_called("click"));
    }

    #[tokio::test(start_paused = true)]
    async fn inner_budget_exhaustion_is_not_fatal() {
        let mut mock = MockDriver::new();
        // Refresh never succeeds; with 2 outer attempts and an inner budget
        // of 3, the loop must still terminate through the outer budget.
        let policy = fast_policy().with_max_attempts(2).with_refresh_attempts(3);
        mock.script_refresh(&[false; 6]);
        let err = await_completion(
            &mut mock,
            &continue_control(),
            &policy,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(mock.call_count("refresh"), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_control_does_not_count_as_available() {
        let mut mock = MockDriver::new();
        mock.script_find(
            &continue_control(),
            vec![
                Some(crate::driver::ElementHandle::new("n", "button").disabled()),
                Some(crate::driver::ElementHandle::new("n", "button")),
            ],
        );
        let stats = await_completion(
            &mut mock,
            &continue_control(),
            &fast_policy(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(stats.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_wins_over_polling() {
        let mut mock = MockDriver::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = await_completion(&mut mock, &continue_control(), &fast_policy(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, CatadorError::Cancelled));
        assert!(!mock.was_called("find"));
    }

    #[test]
    fn default_budgets_give_a_six_hour_ceiling() {
        let policy = CompletionPolicy::default();
        assert_eq!(policy.wall_clock_ceiling(), Duration::from_secs(240 * 90));
    }
}
