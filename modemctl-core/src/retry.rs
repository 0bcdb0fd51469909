//! Bounded poll-and-escalate retry policy.
//!
//! Power-off has a single readback signal and no acknowledgment protocol, so
//! it polls a condition, escalates while the condition is unmet, and gives up
//! after a fixed number of waits. Giving up is reported to the caller as
//! [`RetryOutcome::Exhausted`]; what that means is the caller's decision.

use core::time::Duration;

/// Retry budget and pacing for a poll loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Number of waits allowed before giving up.
    pub max_retries: u8,
    /// Wait between polls.
    pub interval: Duration,
}

/// How a retry loop ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryOutcome {
    /// The condition held after `retries` waits.
    Satisfied { retries: u8 },
    /// The condition never held; `retries` waits were spent.
    Exhausted { retries: u8 },
}

impl RetryOutcome {
    /// Returns `true` when the loop gave up.
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, RetryOutcome::Exhausted { .. })
    }

    /// Number of waits spent.
    #[must_use]
    pub const fn retries(self) -> u8 {
        match self {
            RetryOutcome::Satisfied { retries } | RetryOutcome::Exhausted { retries } => retries,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u8, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }

    /// Longest time [`run`](Self::run) spends waiting.
    #[must_use]
    pub fn worst_case(&self) -> Duration {
        self.interval * u32::from(self.max_retries)
    }

    /// Polls `satisfied` until it returns `true` or the budget runs out.
    ///
    /// Every unmet poll calls `escalate` with the number of waits spent so far,
    /// including the final poll that exhausts the budget. Between polls the loop
    /// calls `wait` with [`interval`](Self::interval). A policy with
    /// `max_retries = n` therefore polls at most `n + 1` times and waits at
    /// most `n` times.
    pub fn run<S, E, W>(&self, mut satisfied: S, mut escalate: E, mut wait: W) -> RetryOutcome
    where
        S: FnMut() -> bool,
        E: FnMut(u8),
        W: FnMut(Duration),
    {
        let mut retries = 0;
        loop {
            if satisfied() {
                return RetryOutcome::Satisfied { retries };
            }

            escalate(retries);
            if retries >= self.max_retries {
                return RetryOutcome::Exhausted { retries };
            }

            retries += 1;
            wait(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: RetryPolicy = RetryPolicy::new(11, Duration::from_millis(100));

    #[test]
    fn satisfied_on_first_poll_never_waits_or_escalates() {
        let mut escalations = 0;
        let mut waits = 0;
        let outcome = POLICY.run(|| true, |_| escalations += 1, |_| waits += 1);

        assert_eq!(outcome, RetryOutcome::Satisfied { retries: 0 });
        assert_eq!(escalations, 0);
        assert_eq!(waits, 0);
    }

    #[test]
    fn exhaustion_waits_exactly_max_retries_times() {
        let mut escalations = 0;
        let mut waited = Duration::ZERO;
        let mut waits = 0;
        let outcome = POLICY.run(
            || false,
            |_| escalations += 1,
            |interval| {
                waits += 1;
                waited += interval;
            },
        );

        assert_eq!(outcome, RetryOutcome::Exhausted { retries: 11 });
        assert!(outcome.is_exhausted());
        assert_eq!(waits, 11);
        assert_eq!(escalations, 12);
        assert_eq!(waited, POLICY.worst_case());
        assert_eq!(POLICY.worst_case(), Duration::from_millis(1_100));
    }

    #[test]
    fn satisfied_on_last_permitted_poll_is_not_exhausted() {
        let mut polls = 0;
        let outcome = POLICY.run(
            || {
                polls += 1;
                polls == 12
            },
            |_| {},
            |_| {},
        );

        assert_eq!(outcome, RetryOutcome::Satisfied { retries: 11 });
        assert!(!outcome.is_exhausted());
    }

    #[test]
    fn zero_budget_polls_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        let mut polls = 0;
        let mut waits = 0;
        let outcome = policy.run(
            || {
                polls += 1;
                false
            },
            |_| {},
            |_| waits += 1,
        );

        assert_eq!(outcome, RetryOutcome::Exhausted { retries: 0 });
        assert_eq!(polls, 1);
        assert_eq!(waits, 0);
    }
}
