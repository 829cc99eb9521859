use std::time::Duration;
use tokio::time::sleep;

/// Delay schedule between losing the push channel and the next attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay before every attempt; never backs off
    Fixed(Duration),
    /// Backoff steps; the last step repeats once exhausted
    Stepped(Vec<Duration>),
}

impl ReconnectPolicy {
    pub fn fixed_millis(millis: u64) -> Self {
        Self::Fixed(Duration::from_millis(millis))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed_millis(crate::types::DEFAULT_RECONNECT_DELAY)
    }
}

/// Timer for reconnection attempts. Lives inside the connection supervisor task,
/// so aborting that task cancels any pending wait.
pub struct ReconnectTimer {
    attempts: u32,
    policy: ReconnectPolicy,
}

impl ReconnectTimer {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            attempts: 0,
            policy,
        }
    }

    /// Get the next delay duration
    pub fn next_delay(&mut self) -> Duration {
        let delay = match &self.policy {
            ReconnectPolicy::Fixed(delay) => *delay,
            ReconnectPolicy::Stepped(steps) => steps
                .get(self.attempts as usize)
                .or(steps.last())
                .copied()
                .unwrap_or(Duration::from_millis(crate::types::DEFAULT_RECONNECT_DELAY)),
        };

        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Reset after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Wait out the next delay
    pub async fn schedule_timeout(&mut self) {
        let delay = self.next_delay();
        tracing::debug!(
            "Reconnect attempt {} scheduled in {:?}",
            self.attempts,
            delay
        );
        sleep(delay).await;
    }
}

impl Default for ReconnectTimer {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
