//! Eventual-consistency polling
//!
//! The single wait primitive every `then_` step goes through. A probe is
//! attempted repeatedly: an empty read sleeps a fixed interval and retries,
//! a positive read is returned to the caller for assertion. The loop is
//! bounded by an explicit deadline; expiry surfaces as a timeout error
//! naming the awaited operation instead of hanging the suite.
//!
//! State machine: WAITING → positive matching read → DONE; positive
//! non-matching read → assertion failure (no further retry); empty read →
//! WAITING.

use super::config::PollConfig;
use super::error::{HarnessError, HarnessResult};
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};

/// Poll pacing settings
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    /// Sleep between attempts
    pub interval: Duration,
    /// Overall deadline for the awaited state to appear
    pub deadline: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            deadline: Duration::from_secs(120),
        }
    }
}

impl From<&PollConfig> for PollSettings {
    fn from(config: &PollConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            deadline: Duration::from_millis(config.deadline_ms),
        }
    }
}

/// Await the first positive read from `probe`.
///
/// The probe returns `Ok(None)` while the downstream state has not
/// appeared yet; probe errors propagate immediately.
pub async fn await_value<T, F, Fut>(
    operation: &str,
    settings: PollSettings,
    mut probe: F,
) -> HarnessResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<Option<T>>>,
{
    let start = Instant::now();
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;
        if let Some(value) = probe().await? {
            log::debug!(
                "'{}' satisfied after {} attempt(s) in {:?}",
                operation,
                attempts,
                start.elapsed()
            );
            return Ok(value);
        }

        if start.elapsed() >= settings.deadline {
            return Err(HarnessError::TimeoutError {
                message: format!("no data after {} attempt(s)", attempts),
                operation: operation.to_string(),
                timeout_ms: settings.deadline.as_millis() as u64,
            });
        }

        log::debug!("'{}' not yet satisfied, retrying", operation);
        tokio::time::sleep(settings.interval).await;
    }
}

/// Assert a positive read against the expected state. A mismatch fails the
/// scenario immediately.
pub fn expect_eq<T: PartialEq + Debug>(
    assertion_type: &str,
    expected: &T,
    actual: &T,
) -> HarnessResult<()> {
    if expected == actual {
        log::info!("'{}' matched: {:?}", assertion_type, actual);
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            assertion_type: assertion_type.to_string(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
            message: "downstream state did not match expectation".to_string(),
        })
    }
}
