use core::time::Duration;

/// A result type whose error defaults to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The node identity field rejected by [`Error::InvalidNodeIdentity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeField {
    DataCenterId,
    WorkerId,
}

impl core::fmt::Display for NodeField {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DataCenterId => f.write_str("dataCenterId"),
            Self::WorkerId => f.write_str("workerId"),
        }
    }
}

/// All error variants that `tien-id` can emit.
///
/// Only [`Error::InvalidNodeIdentity`] is raised while building a generator.
/// The clock variants are per call: the generator never retries them on its
/// own, and its state is unchanged when one is returned, so the caller is free
/// to retry after a delay.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A data center or worker ID does not fit its bit field.
    #[error("{field} can't be greater than {max} or less than 0 (got {value})")]
    InvalidNodeIdentity {
        field: NodeField,
        value: i64,
        max: u64,
    },

    /// The clock reported a time earlier than the last emitted ID, and either
    /// the skew was too large to wait out or it persisted after the wait.
    #[error("clock moved backwards, refusing to generate id for {offset_ms} milliseconds")]
    ClockMovedBackward { offset_ms: u64 },

    /// The sequence for `last_timestamp` is exhausted and the clock did not
    /// advance within the generator's stall timeout.
    #[error("sequence exhausted at {last_timestamp} and the clock did not advance within {waited:?}")]
    ClockStalled {
        last_timestamp: u64,
        waited: Duration,
    },

    /// The clock reported a time earlier than the generator's epoch.
    #[error("clock reads {now_ms} which is before the epoch at {epoch_ms}")]
    ClockBeforeEpoch { now_ms: u64, epoch_ms: u64 },

    /// The time since the epoch no longer fits the 41-bit timestamp field.
    #[error("timestamp {timestamp} exceeds the 41-bit range of an id")]
    TimestampOverflow { timestamp: u64 },

    /// The generator lock was poisoned by a panicking thread.
    ///
    /// Not available with the `parking-lot` feature, whose mutex does not
    /// poison.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,

    /// A value could not be decoded into a [`SnowflakeId`].
    ///
    /// [`SnowflakeId`]: crate::SnowflakeId
    #[error("invalid snowflake id: {reason}")]
    InvalidId { reason: &'static str },
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
