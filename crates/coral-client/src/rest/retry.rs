//! Retry state for transient WSAPI failures

use coral_core::config::RetryConfig;
use std::time::Duration;

/// Mutable retry state for one originating request.
///
/// The attempt budget starts at `tries`; after each retryable failure the
/// delay evolves as `delay = delay * backoff + 1s`. When the budget is
/// exhausted the last error is surfaced unchanged.
#[derive(Debug)]
pub struct RetryState {
    tries_left: u32,
    delay: Duration,
    backoff: u32,
}

impl RetryState {
    /// Fresh state from configuration
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            tries_left: config.tries,
            delay: config.initial_delay,
            backoff: config.backoff,
        }
    }

    /// Record a retryable failure.
    ///
    /// Returns the delay to sleep before the next attempt, or `None` when
    /// the attempt budget is exhausted and the error must surface.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.tries_left = self.tries_left.saturating_sub(1);
        if self.tries_left == 0 {
            return None;
        }

        let delay = self.delay;
        self.delay = self.delay * self.backoff + Duration::from_secs(1);
        Some(delay)
    }

    /// Attempts remaining before the error surfaces
    pub fn tries_left(&self) -> u32 {
        self.tries_left
    }

    /// Delay the next retryable failure would sleep
    pub fn current_delay(&self) -> Duration {
        self.delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_sequence() {
        let mut state = RetryState::new(&RetryConfig::default());

        let mut slept = Vec::new();
        while let Some(delay) = state.next_delay() {
            slept.push(delay.as_secs());
        }

        // Five attempts: four sleeps, then the budget is exhausted with the
        // next delay already evolved to 15s.
        assert_eq!(slept, vec![0, 1, 3, 7]);
        assert_eq!(state.current_delay(), Duration::from_secs(15));
        assert_eq!(state.tries_left(), 0);
    }

    #[test]
    fn test_tries_strictly_decrease() {
        let mut state = RetryState::new(&RetryConfig::default());
        let mut previous = state.tries_left();
        while state.next_delay().is_some() {
            assert!(state.tries_left() < previous);
            previous = state.tries_left();
        }
        assert_eq!(state.tries_left(), 0);
        // Exhausted state stays exhausted
        assert!(state.next_delay().is_none());
    }
}
