use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use super::ControlError;

/// Point in time after which a browse query is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Runs `work` to completion or until the deadline passes.
    ///
    /// An already expired deadline fails without polling `work`, so no query
    /// is issued. On expiry `work` is dropped, which releases any cursor it
    /// holds.
    ///
    /// # Errors
    /// Returns `ControlError::Timeout` on expiry, otherwise whatever `work` returns.
    pub async fn run<T, F>(self, work: F) -> Result<T, ControlError>
    where
        F: Future<Output = Result<T, ControlError>> + Send,
        T: Send,
    {
        if self.is_expired() {
            return Err(ControlError::Timeout);
        }
        tokio::time::timeout_at(self.at, work)
            .await
            .map_err(|_| ControlError::Timeout)?
    }
}
