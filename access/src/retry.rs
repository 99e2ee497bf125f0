// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Bounded exponential backoff for transient model failures.

use crate::AccessError;
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff: 1 s initial delay, doubling to a
/// 10 s cap, five attempts in total.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    delay: Duration,
}

impl Backoff {
    /// First delay between attempts.
    pub const INITIAL: Duration = Duration::from_secs(1);
    /// Ceiling for the doubled delay.
    pub const CAP: Duration = Duration::from_secs(10);
    /// Total attempts before giving up.
    pub const ATTEMPTS: u32 = 5;

    /// Fresh backoff state for one operation.
    #[must_use]
    pub fn new() -> Backoff {
        Backoff {
            attempt: 1,
            delay: Self::INITIAL,
        }
    }

    /// Returns the delay to sleep before the next attempt, or `None`
    /// once the attempt budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= Self::ATTEMPTS {
            return None;
        }
        self.attempt += 1;
        let delay = self.delay;
        self.delay = (delay * 2).min(Self::CAP);
        Some(delay)
    }

    /// Sleeps before the next attempt, or fails once the budget is
    /// spent.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::RetriesExhausted`] after the final
    /// attempt.
    pub async fn pause(&mut self, reason: &str) -> Result<(), AccessError> {
        match self.next_delay() {
            Some(delay) => {
                warn!(
                    reason,
                    attempt = self.attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient model failure, backing off"
                );
                tokio::time::sleep(delay).await;
                Ok(())
            }
            None => Err(AccessError::RetriesExhausted {
                attempts: Self::ATTEMPTS,
                reason: reason.to_string(),
            }),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delay_sequence_doubles_to_cap() {
        let mut backoff = Backoff::new();
        let mut delays = Vec::new();
        while let Some(delay) = backoff.next_delay() {
            delays.push(delay.as_secs());
        }
        // five attempts means four pauses
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[test]
    fn test_long_sequences_stay_capped() {
        let mut backoff = Backoff {
            attempt: 0,
            delay: Backoff::INITIAL,
        };
        let mut last = Duration::ZERO;
        while let Some(delay) = backoff.next_delay() {
            last = delay;
        }
        assert!(last <= Backoff::CAP);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_fails_after_budget() {
        let mut backoff = Backoff::new();
        for _ in 0..4 {
            backoff.pause("flaky").await.unwrap();
        }
        let err = backoff.pause("flaky").await.unwrap_err();
        assert!(matches!(
            err,
            AccessError::RetriesExhausted { attempts: 5, .. }
        ));
    }
}
