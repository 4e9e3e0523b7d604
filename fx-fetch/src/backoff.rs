//! Exponential backoff with cancellable sleeps.

use std::time::Duration;

use fx_types::{CancellationToken, FetchError};

/// Doubling delay sequence starting at a base delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    pub fn new(base: Duration) -> Self {
        Self { next: base }
    }

    /// Returns the current delay and doubles it for the next call.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2);
        delay
    }

    /// Sleeps for the next delay unless `cancel` fires first.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> Result<(), FetchError> {
        let delay = self.next_delay();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
