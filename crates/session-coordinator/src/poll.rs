//! Bounded polling with a delay schedule.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Delay schedule for a bounded retry loop.
#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    /// Delay before the first attempt.
    pub initial_delay: Duration,
    /// Delay between subsequent attempts.
    pub interval: Duration,
    /// Total number of attempts.
    pub max_attempts: u32,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            interval: Duration::from_millis(800),
            max_attempts: 5,
        }
    }
}

/// Poll `attempt` until it yields a value or the schedule is exhausted.
///
/// Each attempt is preceded by a delay, so the target has time to settle
/// before the first probe. Returns `None` when all attempts come up empty.
pub async fn poll_until<T, F, Fut>(schedule: PollSchedule, mut attempt: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for i in 0..schedule.max_attempts {
        let delay = if i == 0 {
            schedule.initial_delay
        } else {
            schedule.interval
        };
        tokio::time::sleep(delay).await;

        if let Some(value) = attempt().await {
            return Some(value);
        }
        debug!(attempt = i + 1, max = schedule.max_attempts, "Poll attempt came up empty");
    }
    None
}
