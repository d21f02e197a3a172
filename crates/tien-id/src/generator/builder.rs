use core::time::Duration;
use std::sync::Arc;

use crate::{
    NodeId, RegressionPolicy, SnowflakeGenerator, TIEN_EPOCH, TimeSource,
    generator::{Mutex, lock::State},
};

/// Stall timeout applied by [`SnowflakeGeneratorBuilder`] unless overridden.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(1);

/// Builder for a [`SnowflakeGenerator`] with non-default settings.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tien_id::{NodeId, RegressionPolicy, SnowflakeGenerator, SystemClock, TIEN_EPOCH};
///
/// let generator = SnowflakeGenerator::builder(NodeId::new(2, 5).unwrap(), SystemClock)
///     .epoch(TIEN_EPOCH)
///     .regression_policy(RegressionPolicy::new(10, 1))
///     .stall_timeout(Some(Duration::from_millis(50)))
///     .build();
///
/// assert_eq!(generator.regression_policy().max_backward_skew, 10);
/// ```
#[derive(Clone, Debug)]
pub struct SnowflakeGeneratorBuilder<T> {
    node: NodeId,
    time: T,
    epoch: Duration,
    policy: RegressionPolicy,
    stall_timeout: Option<Duration>,
}

impl<T> SnowflakeGeneratorBuilder<T>
where
    T: TimeSource,
{
    pub fn new(node: NodeId, time: T) -> Self {
        Self {
            node,
            time,
            epoch: TIEN_EPOCH,
            policy: RegressionPolicy::default(),
            stall_timeout: Some(DEFAULT_STALL_TIMEOUT),
        }
    }

    /// Sets the epoch subtracted from clock readings. Defaults to
    /// [`TIEN_EPOCH`].
    ///
    /// Every generator sharing an ID space must use the same epoch.
    pub fn epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn regression_policy(mut self, policy: RegressionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bounds the spin on an exhausted sequence. `None` spins until the clock
    /// advances, however long that takes.
    pub fn stall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stall_timeout = timeout;
        self
    }

    pub fn build(self) -> SnowflakeGenerator<T> {
        let state = Mutex::new(State::default());
        SnowflakeGenerator {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(state),
            node: self.node,
            epoch_millis: self.epoch.as_millis() as u64,
            policy: self.policy,
            stall_timeout: self.stall_timeout,
            time: self.time,
        }
    }
}
