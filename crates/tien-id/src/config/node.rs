use core::time::Duration;

use crate::{
    CachedClock, Clock, ConfigSnapshot, DEFAULT_REFRESH_PERIOD, DEFAULT_STALL_TIMEOUT, NodeId,
    RegressionPolicy, Result, SnowflakeGenerator, SystemClock,
};

/// Generator settings resolved from a [`ConfigSnapshot`].
///
/// Keys and defaults:
///
/// | key                  | default | meaning                                   |
/// |----------------------|---------|-------------------------------------------|
/// | `workerId`           | 24      | worker ID, `0..=31`                       |
/// | `dataCenterId`       | 24      | data center ID, `0..=31`                  |
/// | `isClock`            | false   | use the cached clock instead of direct    |
/// | `clockPeriodMs`      | 1       | refresh period of the cached clock        |
/// | `maxBackwardSkewMs`  | 5       | largest backward clock step waited out    |
/// | `backwardWaitFactor` | 2       | wait = factor × step                      |
/// | `stallTimeoutMs`     | 1000    | bound on the exhausted-sequence spin, 0 = none |
///
/// Node IDs are kept as read and only validated when a generator is built, so
/// that the error names the offending value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    pub worker_id: i64,
    pub data_center_id: i64,
    pub is_clock: bool,
    pub clock_period: Duration,
    pub regression_policy: RegressionPolicy,
    pub stall_timeout: Option<Duration>,
}

impl NodeConfig {
    pub const WORKER_ID_KEY: &'static str = "workerId";
    pub const DATA_CENTER_ID_KEY: &'static str = "dataCenterId";
    pub const IS_CLOCK_KEY: &'static str = "isClock";
    pub const CLOCK_PERIOD_KEY: &'static str = "clockPeriodMs";
    pub const MAX_BACKWARD_SKEW_KEY: &'static str = "maxBackwardSkewMs";
    pub const BACKWARD_WAIT_FACTOR_KEY: &'static str = "backwardWaitFactor";
    pub const STALL_TIMEOUT_KEY: &'static str = "stallTimeoutMs";

    pub const DEFAULT_WORKER_ID: i64 = 24;
    pub const DEFAULT_DATA_CENTER_ID: i64 = 24;

    /// Reads every setting from `config`, falling back to the defaults above.
    /// Negative durations and factors are treated as unset.
    pub fn from_snapshot(config: &ConfigSnapshot) -> Self {
        let defaults = Self::default();

        let clock_period = non_negative(config, Self::CLOCK_PERIOD_KEY)
            .map_or(defaults.clock_period, Duration::from_millis);

        let regression_policy = RegressionPolicy::new(
            non_negative(config, Self::MAX_BACKWARD_SKEW_KEY)
                .unwrap_or(defaults.regression_policy.max_backward_skew),
            non_negative(config, Self::BACKWARD_WAIT_FACTOR_KEY)
                .and_then(|f| u32::try_from(f).ok())
                .unwrap_or(defaults.regression_policy.wait_factor),
        );

        let stall_timeout = match non_negative(config, Self::STALL_TIMEOUT_KEY) {
            None => defaults.stall_timeout,
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        };

        Self {
            worker_id: config.get_long(Self::WORKER_ID_KEY, Self::DEFAULT_WORKER_ID),
            data_center_id: config.get_long(Self::DATA_CENTER_ID_KEY, Self::DEFAULT_DATA_CENTER_ID),
            is_clock: config.get_bool(Self::IS_CLOCK_KEY, false),
            clock_period,
            regression_policy,
            stall_timeout,
        }
    }

    /// Validates the configured node identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentity`] if either ID is outside `0..=31`.
    ///
    /// [`Error::InvalidNodeIdentity`]: crate::Error::InvalidNodeIdentity
    pub fn node_id(&self) -> Result<NodeId> {
        NodeId::new(self.data_center_id, self.worker_id)
    }

    /// Binds the configured clock strategy.
    ///
    /// The cached strategy with the default period shares the process-wide
    /// [`CachedClock::global`] ticker; any other period gets its own ticker.
    pub fn clock(&self) -> Clock {
        if !self.is_clock {
            return Clock::System(SystemClock);
        }
        if self.clock_period == DEFAULT_REFRESH_PERIOD {
            Clock::Cached(CachedClock::global())
        } else {
            Clock::Cached(CachedClock::with_period(self.clock_period))
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            worker_id: Self::DEFAULT_WORKER_ID,
            data_center_id: Self::DEFAULT_DATA_CENTER_ID,
            is_clock: false,
            clock_period: DEFAULT_REFRESH_PERIOD,
            regression_policy: RegressionPolicy::default(),
            stall_timeout: Some(DEFAULT_STALL_TIMEOUT),
        }
    }
}

fn non_negative(config: &ConfigSnapshot, key: &str) -> Option<u64> {
    if !config.contains_key(key) {
        return None;
    }
    u64::try_from(config.get_long(key, -1)).ok()
}

impl SnowflakeGenerator<Clock> {
    /// Builds a generator from a configuration snapshot.
    ///
    /// Node identity is validated before the clock is bound, so a bad identity
    /// never starts a ticker thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentity`] if `workerId` or `dataCenterId`
    /// is outside `0..=31`.
    ///
    /// # Example
    /// ```
    /// use tien_id::{ConfigSnapshot, SnowflakeGenerator};
    ///
    /// let config = ConfigSnapshot::new().with("workerId", 5).with("dataCenterId", 9);
    /// let generator = SnowflakeGenerator::from_config(&config).unwrap();
    ///
    /// let id = generator.next_id().unwrap();
    /// assert_eq!((id.data_center_id(), id.worker_id()), (9, 5));
    /// ```
    ///
    /// [`Error::InvalidNodeIdentity`]: crate::Error::InvalidNodeIdentity
    pub fn from_config(config: &ConfigSnapshot) -> Result<Self> {
        Self::from_node_config(&NodeConfig::from_snapshot(config))
    }

    /// Builds a generator from already resolved settings.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_config`].
    pub fn from_node_config(config: &NodeConfig) -> Result<Self> {
        let node = config.node_id()?;
        let clock = config.clock();

        #[cfg(feature = "tracing")]
        tracing::info!(
            worker_id = node.worker_id(),
            data_center_id = node.data_center_id(),
            cached_clock = clock.is_cached(),
            "snowflake generator initialized"
        );

        Ok(Self::builder(node, clock)
            .regression_policy(config.regression_policy)
            .stall_timeout(config.stall_timeout)
            .build())
    }
}
