use core::time::Duration;

/// How a generator reacts when the clock reports a time earlier than the last
/// emitted ID.
///
/// A skew of at most [`max_backward_skew`] is waited out: the generator sleeps
/// for `wait_factor × skew` while holding its lock, then reads the clock again.
/// Anything larger fails the call with [`Error::ClockMovedBackward`] straight
/// away.
///
/// The right values depend on how the deployment keeps its clocks in sync (for
/// example the NTP slew bound), so both are tunable.
///
/// [`max_backward_skew`]: RegressionPolicy::max_backward_skew
/// [`Error::ClockMovedBackward`]: crate::Error::ClockMovedBackward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegressionPolicy {
    /// Largest backward jump, in milliseconds, that is waited out.
    pub max_backward_skew: u64,
    /// Multiplier applied to the observed skew to get the wait.
    pub wait_factor: u32,
}

impl RegressionPolicy {
    pub const DEFAULT_MAX_BACKWARD_SKEW: u64 = 5;
    pub const DEFAULT_WAIT_FACTOR: u32 = 2;

    pub const fn new(max_backward_skew: u64, wait_factor: u32) -> Self {
        Self {
            max_backward_skew,
            wait_factor,
        }
    }

    /// A policy that fails on any backward movement without waiting.
    pub const fn strict() -> Self {
        Self::new(0, 0)
    }

    /// Returns how long to wait out a backward jump of `offset_ms`, or `None`
    /// if the jump is too large to wait out.
    pub fn backoff_for(&self, offset_ms: u64) -> Option<Duration> {
        (offset_ms <= self.max_backward_skew)
            .then(|| Duration::from_millis(offset_ms.saturating_mul(u64::from(self.wait_factor))))
    }
}

impl Default for RegressionPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_BACKWARD_SKEW, Self::DEFAULT_WAIT_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_waits_twice_the_skew_up_to_five_ms() {
        let policy = RegressionPolicy::default();
        assert_eq!(policy.backoff_for(1), Some(Duration::from_millis(2)));
        assert_eq!(policy.backoff_for(5), Some(Duration::from_millis(10)));
        assert_eq!(policy.backoff_for(6), None);
    }

    #[test]
    fn strict_rejects_everything() {
        assert_eq!(RegressionPolicy::strict().backoff_for(1), None);
    }
}
