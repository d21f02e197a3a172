use core::{cmp::Ordering, fmt, time::Duration};
use std::{sync::Arc, thread, time::Instant};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Clock, Error, NodeId, RegressionPolicy, Result, SnowflakeGeneratorBuilder, SnowflakeId,
    TimeSource, generator::Mutex,
};

/// Mutable generator state, guarded by the generator lock.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Unix millis of the last emitted ID, `None` before the first.
    pub(crate) last_timestamp: Option<u64>,
    pub(crate) sequence: u64,
}

/// A lock-based Snowflake ID generator, safe to share across threads.
///
/// Every call to [`next_id`] runs start to finish under one mutex, including
/// the waits it may perform:
///
/// - when the clock stepped back by a small amount, the generator sleeps per
///   its [`RegressionPolicy`] before reading the clock again;
/// - when 4096 IDs were already emitted in the current millisecond, it spins
///   until the clock moves on.
///
/// Holding the lock across those waits is what keeps two callers from ever
/// sharing a `(timestamp, sequence)` pair or reordering their timestamps.
///
/// The generator is a handle: clones share the same state and emit from the
/// same ID space.
///
/// [`next_id`]: SnowflakeGenerator::next_id
#[derive(Clone)]
pub struct SnowflakeGenerator<T = Clock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<State>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<State>>,
    pub(crate) node: NodeId,
    pub(crate) epoch_millis: u64,
    pub(crate) policy: RegressionPolicy,
    pub(crate) stall_timeout: Option<Duration>,
    pub(crate) time: T,
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator for `node` reading time from `time`, with the
    /// default epoch, regression policy and stall timeout.
    ///
    /// # Example
    /// ```
    /// use tien_id::{NodeId, SnowflakeGenerator, SystemClock};
    ///
    /// let node = NodeId::new(1, 7).unwrap();
    /// let generator = SnowflakeGenerator::new(node, SystemClock);
    ///
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(a < b);
    /// assert_eq!(a.data_center_id(), 1);
    /// assert_eq!(a.worker_id(), 7);
    /// ```
    pub fn new(node: NodeId, time: T) -> Self {
        Self::builder(node, time).build()
    }

    /// Starts building a generator with non-default settings.
    pub fn builder(node: NodeId, time: T) -> SnowflakeGeneratorBuilder<T> {
        SnowflakeGeneratorBuilder::new(node, time)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The epoch subtracted from clock readings before packing.
    pub fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }

    pub fn regression_policy(&self) -> RegressionPolicy {
        self.policy
    }

    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout
    }

    pub fn time_source(&self) -> &T {
        &self.time
    }

    /// Generates the next ID.
    ///
    /// Blocks while a small backward clock step is waited out, and spins while
    /// the sequence for the current millisecond is exhausted. Neither wait can
    /// be cancelled once entered; callers that need a latency bound should
    /// apply it around the call.
    ///
    /// A failed call leaves the generator state untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackward`] if the clock is behind the last emitted
    ///   ID by more than the policy allows, or is still behind after waiting.
    /// - [`Error::ClockStalled`] if the sequence is exhausted and the clock
    ///   does not advance within the stall timeout.
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the
    ///   generator's epoch.
    /// - [`Error::TimestampOverflow`] if the time since the epoch no longer
    ///   fits 41 bits.
    /// - [`Error::LockPoisoned`] if another thread panicked while holding the
    ///   lock (std mutex only).
    ///
    /// # Example
    /// ```
    /// use tien_id::{NodeId, SnowflakeGenerator, SystemClock, TIEN_EPOCH, TimeSource};
    ///
    /// let generator = SnowflakeGenerator::new(NodeId::new(0, 0).unwrap(), SystemClock);
    /// let id = generator.next_id().unwrap();
    ///
    /// assert!(id.to_i64() >= 0);
    /// assert!(id.unix_millis(TIEN_EPOCH) <= SystemClock.current_millis());
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let mut now = self.time.current_millis();

        let sequence = match state.last_timestamp {
            None => 0,
            Some(last) => {
                if now < last {
                    now = self.cold_clock_behind(now, last)?;
                }
                match now.cmp(&last) {
                    Ordering::Equal => {
                        let next = (state.sequence + 1) & SnowflakeId::SEQUENCE_MASK;
                        if next == 0 {
                            now = self.cold_wait_next_millis(last)?;
                        }
                        next
                    }
                    _ => 0,
                }
            }
        };

        let timestamp = self.timestamp_offset(now)?;

        state.last_timestamp = Some(now);
        state.sequence = sequence;

        Ok(SnowflakeId::for_node(timestamp, self.node, sequence))
    }

    /// Converts a clock reading into the ID timestamp field.
    fn timestamp_offset(&self, now: u64) -> Result<u64> {
        let Some(timestamp) = now.checked_sub(self.epoch_millis) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                now_ms = now,
                epoch_ms = self.epoch_millis,
                "clock is before the epoch"
            );
            return Err(Error::ClockBeforeEpoch {
                now_ms: now,
                epoch_ms: self.epoch_millis,
            });
        };
        if timestamp > SnowflakeId::TIMESTAMP_MASK {
            #[cfg(feature = "tracing")]
            tracing::warn!(timestamp, "timestamp exceeds the id range");
            return Err(Error::TimestampOverflow { timestamp });
        }
        Ok(timestamp)
    }

    /// Handles a clock reading behind the last emitted ID. Returns the new
    /// reading once it is no longer behind.
    #[cold]
    #[inline(never)]
    fn cold_clock_behind(&self, now: u64, last: u64) -> Result<u64> {
        let offset_ms = last - now;

        let Some(backoff) = self.policy.backoff_for(offset_ms) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(offset_ms, "clock moved backwards beyond tolerated skew");
            return Err(Error::ClockMovedBackward { offset_ms });
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(offset_ms, ?backoff, "clock moved backwards, waiting it out");
        thread::sleep(backoff);

        let now = self.time.current_millis();
        if now < last {
            let offset_ms = last - now;
            #[cfg(feature = "tracing")]
            tracing::warn!(offset_ms, "clock still behind after waiting");
            return Err(Error::ClockMovedBackward { offset_ms });
        }
        Ok(now)
    }

    /// Spins until the clock passes `last`. Only reached once 4096 IDs have
    /// been emitted for `last`.
    #[cold]
    #[inline(never)]
    fn cold_wait_next_millis(&self, last: u64) -> Result<u64> {
        let start = Instant::now();
        loop {
            let now = self.time.current_millis();
            if now > last {
                return Ok(now);
            }
            if let Some(timeout) = self.stall_timeout {
                let waited = start.elapsed();
                if waited >= timeout {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(last_timestamp = last, ?waited, "clock stalled");
                    return Err(Error::ClockStalled {
                        last_timestamp: last,
                        waited,
                    });
                }
            }
            core::hint::spin_loop();
        }
    }
}

impl<T> fmt::Debug for SnowflakeGenerator<T>
where
    T: TimeSource + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("node", &self.node)
            .field("epoch_millis", &self.epoch_millis)
            .field("policy", &self.policy)
            .field("stall_timeout", &self.stall_timeout)
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}
