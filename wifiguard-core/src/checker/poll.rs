use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{DeviceError, RunError};

pub const RADIO_ENABLE_POLL: PollPolicy = PollPolicy::new(Duration::from_secs(1), 30);
pub const SCAN_RESULTS_POLL: PollPolicy = PollPolicy::new(Duration::from_secs(1), 30);
pub const ASSOCIATION_POLL: PollPolicy = PollPolicy::new(Duration::from_secs(5), 15);

/// A bounded poll: one initial probe, then up to `max_attempts` retries, each
/// after waiting `interval_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPollPolicy")]
pub struct PollPolicy {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

#[derive(Deserialize)]
struct RawPollPolicy {
    interval_ms: u64,
    max_attempts: u32,
}

impl TryFrom<RawPollPolicy> for PollPolicy {
    type Error = String;

    fn try_from(raw: RawPollPolicy) -> Result<Self, Self::Error> {
        if raw.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }

        Ok(Self {
            interval_ms: raw.interval_ms,
            max_attempts: raw.max_attempts,
        })
    }
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            max_attempts,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Total time a poll waits before giving up.
    pub fn budget(&self) -> Duration {
        self.interval() * self.max_attempts
    }

    /// Run `probe` until it yields a value or the budget runs out.
    ///
    /// Every wait is followed by a probe, so a value that shows up right at
    /// the end of the budget is still seen. Cancellation is observed before
    /// every probe and while sleeping. Device faults abort the poll
    /// immediately.
    pub async fn poll<T, F, Fut>(
        &self,
        phase: &'static str,
        cancel: &CancellationToken,
        mut probe: F,
    ) -> Result<Option<T>, RunError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, DeviceError>>,
    {
        let mut retries: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RunError::Cancelled);
            }

            if let Some(value) = probe().await? {
                debug!(phase, retries, "Poll satisfied");
                return Ok(Some(value));
            }

            if retries >= self.max_attempts {
                return Ok(None);
            }

            retries += 1;
            debug!(phase, retries, max_attempts = self.max_attempts, "Still waiting");
            sleep(cancel, self.interval()).await?;
        }
    }
}

/// Timer wait that ends early with [`RunError::Cancelled`].
pub async fn sleep(cancel: &CancellationToken, duration: Duration) -> Result<(), RunError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(RunError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Poll budgets for every phase of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub radio_enable: PollPolicy,
    pub scan_results: PollPolicy,
    pub association: PollPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            radio_enable: RADIO_ENABLE_POLL,
            scan_results: SCAN_RESULTS_POLL,
            association: ASSOCIATION_POLL,
        }
    }
}
