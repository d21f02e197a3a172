use crate::{Error, NodeId, Result};
use core::{fmt, str::FromStr, time::Duration};

/// A 64-bit Snowflake ID.
///
/// - 1 bit reserved (always zero, so the ID stays non-negative as an `i64`)
/// - 41 bits timestamp (ms since the generator's epoch, ~69 years)
/// - 5 bits data center ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21          17 16      12 11             0
///              +--------------+----------------+--------------+----------+---------------+
///  Field:      | reserved (1) | timestamp (41) | data ctr (5) | work (5) | sequence (12) |
///              +--------------+----------------+--------------+----------+---------------+
///              |<------------------ MSB ---------- 64 bits ---------- LSB ------------->|
/// ```
///
/// IDs order first by timestamp, then by node, then by sequence, which is the
/// numeric order of the packed integer.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit data center ID field. Occupies bits 17
    /// through 21.
    pub const DATA_CENTER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit worker ID field. Occupies bits 12
    /// through 16.
    pub const WORKER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    pub const TIMESTAMP_SHIFT: u64 = 22;
    pub const DATA_CENTER_ID_SHIFT: u64 = 17;
    pub const WORKER_ID_SHIFT: u64 = 12;
    pub const SEQUENCE_SHIFT: u64 = 0;

    pub const MAX_DATA_CENTER_ID: u64 = Self::DATA_CENTER_ID_MASK;
    pub const MAX_WORKER_ID: u64 = Self::WORKER_ID_MASK;
    pub const MAX_SEQUENCE: u64 = Self::SEQUENCE_MASK;

    const RESERVED_MASK: u64 = 1 << 63;

    /// Packs the four fields into an ID. Each field is masked to its width.
    pub const fn from_components(
        timestamp: u64,
        data_center_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let data_center_id =
            (data_center_id & Self::DATA_CENTER_ID_MASK) << Self::DATA_CENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | data_center_id | worker_id | sequence,
        }
    }

    /// Packs an ID for `node` at `timestamp` with the given `sequence`.
    pub const fn for_node(timestamp: u64, node: NodeId, sequence: u64) -> Self {
        Self::from_components(
            timestamp,
            node.data_center_id(),
            node.worker_id(),
            sequence,
        )
    }

    /// Wraps a raw value without validation. See [`Self::is_valid`].
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Returns the ID as a signed integer. Never negative for a valid ID.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Returns `true` if the reserved sign bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_MASK == 0
    }

    /// Extracts the timestamp offset (ms since the generator's epoch).
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    pub const fn data_center_id(&self) -> u64 {
        (self.id >> Self::DATA_CENTER_ID_SHIFT) & Self::DATA_CENTER_ID_MASK
    }

    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the wall-clock time encoded in the ID, in milliseconds since the
    /// Unix epoch, given the epoch the generator was configured with.
    ///
    /// ```
    /// use tien_id::{SnowflakeId, TIEN_EPOCH};
    ///
    /// let id = SnowflakeId::from_components(1_000, 1, 2, 3);
    /// assert_eq!(id.unix_millis(TIEN_EPOCH), 1_519_740_778_809);
    /// ```
    pub const fn unix_millis(&self, epoch: Duration) -> u64 {
        self.timestamp().saturating_add(epoch.as_millis() as u64)
    }

    /// Returns the ID as a zero-padded 19-digit string, the width of
    /// `i64::MAX`, so that lexical order matches numeric order.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &format_args!("0x{:016x} ({})", self.id, self.id))
            .field("timestamp", &self.timestamp())
            .field("data_center_id", &self.data_center_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_i64()
    }
}

impl TryFrom<i64> for SnowflakeId {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self> {
        u64::try_from(raw)
            .map(Self::from_raw)
            .map_err(|_| Error::InvalidId {
                reason: "negative value",
            })
    }
}

impl TryFrom<u64> for SnowflakeId {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self> {
        let id = Self::from_raw(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(Error::InvalidId {
                reason: "reserved bit is set",
            })
        }
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    /// Parses a decimal ID as produced by [`Display`](fmt::Display).
    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim().parse::<u64>().map_err(|_| Error::InvalidId {
            reason: "not a decimal integer",
        })?;
        Self::try_from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_millis_saturates_for_huge_epoch() {
        let id = SnowflakeId::from_components(SnowflakeId::TIMESTAMP_MASK, 0, 0, 0);
        assert_eq!(id.unix_millis(Duration::from_millis(u64::MAX)), u64::MAX);
        assert_eq!(id.unix_millis(Duration::ZERO), SnowflakeId::TIMESTAMP_MASK);
    }

    #[test]
    fn packs_fields_at_documented_positions() {
        let id = SnowflakeId::from_components(1, 1, 1, 1);
        assert_eq!(id.to_raw(), (1 << 22) | (1 << 17) | (1 << 12) | 1);

        let id = SnowflakeId::from_components(5_000, 7, 19, 4_000);
        assert_eq!(id.timestamp(), 5_000);
        assert_eq!(id.data_center_id(), 7);
        assert_eq!(id.worker_id(), 19);
        assert_eq!(id.sequence(), 4_000);
        assert!(id.is_valid());
    }

    #[test]
    fn full_fields_never_touch_the_sign_bit() {
        let id = SnowflakeId::from_components(
            SnowflakeId::TIMESTAMP_MASK,
            SnowflakeId::MAX_DATA_CENTER_ID,
            SnowflakeId::MAX_WORKER_ID,
            SnowflakeId::MAX_SEQUENCE,
        );
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert_eq!(id.to_i64(), i64::MAX);
        assert!(id.is_valid());
    }

    #[test]
    fn overflowing_fields_are_masked() {
        let id = SnowflakeId::from_components(0, 32, 33, 4_096);
        assert_eq!(id.data_center_id(), 0);
        assert_eq!(id.worker_id(), 1);
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn for_node_matches_from_components() {
        let node = NodeId::new(24, 24).unwrap();
        assert_eq!(
            SnowflakeId::for_node(99, node, 7),
            SnowflakeId::from_components(99, 24, 24, 7)
        );
    }

    #[test]
    fn orders_by_timestamp_before_node_and_sequence() {
        let early = SnowflakeId::from_components(10, 31, 31, 4_095);
        let late = SnowflakeId::from_components(11, 0, 0, 0);
        assert!(early < late);
    }

    #[test]
    fn parses_and_formats_decimal() {
        let id = SnowflakeId::from_components(123_456, 2, 3, 4);
        let text = id.to_string();
        assert_eq!(text.parse::<SnowflakeId>().unwrap(), id);
        assert_eq!(id.to_padded_string().len(), 19);
        assert_eq!(id.to_padded_string().parse::<SnowflakeId>().unwrap(), id);
    }

    #[test]
    fn rejects_invalid_inputs() {
        assert!(matches!(
            "abc".parse::<SnowflakeId>(),
            Err(Error::InvalidId { .. })
        ));
        assert!(matches!(
            u64::MAX.to_string().parse::<SnowflakeId>(),
            Err(Error::InvalidId { .. })
        ));
        assert!(SnowflakeId::try_from(-1_i64).is_err());
        assert_eq!(
            SnowflakeId::try_from(42_i64).unwrap(),
            SnowflakeId::from_raw(42)
        );
    }

    #[test]
    fn debug_shows_fields() {
        let id = SnowflakeId::from_components(1, 2, 3, 4);
        let dbg = format!("{id:?}");
        assert!(dbg.contains("data_center_id: 2"));
        assert!(dbg.contains("worker_id: 3"));
        assert!(dbg.contains("sequence: 4"));
    }
}
