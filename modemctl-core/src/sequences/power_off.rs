//! Power-off pacing.
//!
//! After `CP_ON` is dropped the sequencer polls `PHONE_ACTIVE`.
//! While it stays high, `CP_RESET` is forced low and the loop waits another
//! interval. The budget bounds the caller's latency to roughly 1.1 s against a
//! modem that never lets go of the line.

use core::time::Duration;

use crate::retry::RetryPolicy;

/// Wait between `PHONE_ACTIVE` polls.
pub const POWER_OFF_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Number of waits before giving up on a clean shutdown.
pub const POWER_OFF_MAX_RETRIES: u8 = 11;

pub const POWER_OFF_RETRY_POLICY: RetryPolicy =
    RetryPolicy::new(POWER_OFF_MAX_RETRIES, POWER_OFF_POLL_INTERVAL);

/// Returns the shared power-off retry policy.
#[must_use]
pub const fn power_off_retry_policy() -> RetryPolicy {
    POWER_OFF_RETRY_POLICY
}
