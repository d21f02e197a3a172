use crate::{Error, NodeField, Result, SnowflakeId};

/// The `(data_center_id, worker_id)` pair stamped into every ID a generator
/// emits.
///
/// Each process sharing an ID space must own a distinct pair; that is what
/// keeps IDs from different processes apart. Both halves are validated against
/// their 5-bit fields on construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    data_center_id: u64,
    worker_id: u64,
}

impl NodeId {
    /// Builds a node identity, rejecting values outside `0..=31`.
    ///
    /// Values are taken as `i64` because configuration stores them as signed
    /// longs; negatives are rejected like any other out-of-range value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentity`] naming the first field found out
    /// of range (the worker ID is checked first).
    ///
    /// # Example
    ///
    /// ```
    /// use tien_id::{Error, NodeId};
    ///
    /// let node = NodeId::new(3, 31).unwrap();
    /// assert_eq!(node.data_center_id(), 3);
    /// assert_eq!(node.worker_id(), 31);
    ///
    /// assert!(matches!(
    ///     NodeId::new(0, 32),
    ///     Err(Error::InvalidNodeIdentity { .. })
    /// ));
    /// ```
    pub fn new(data_center_id: i64, worker_id: i64) -> Result<Self> {
        let worker_id = check(NodeField::WorkerId, worker_id, SnowflakeId::MAX_WORKER_ID)?;
        let data_center_id = check(
            NodeField::DataCenterId,
            data_center_id,
            SnowflakeId::MAX_DATA_CENTER_ID,
        )?;
        Ok(Self {
            data_center_id,
            worker_id,
        })
    }

    pub const fn data_center_id(&self) -> u64 {
        self.data_center_id
    }

    pub const fn worker_id(&self) -> u64 {
        self.worker_id
    }
}

fn check(field: NodeField, value: i64, max: u64) -> Result<u64> {
    match u64::try_from(value) {
        Ok(v) if v <= max => Ok(v),
        _ => Err(Error::InvalidNodeIdentity { field, value, max }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_id_boundaries() {
        assert!(NodeId::new(0, 0).is_ok());
        assert!(NodeId::new(0, 31).is_ok());
        assert_eq!(
            NodeId::new(0, 32),
            Err(Error::InvalidNodeIdentity {
                field: NodeField::WorkerId,
                value: 32,
                max: 31,
            })
        );
        assert!(matches!(
            NodeId::new(0, -1),
            Err(Error::InvalidNodeIdentity {
                field: NodeField::WorkerId,
                ..
            })
        ));
    }

    #[test]
    fn data_center_id_boundaries() {
        assert!(NodeId::new(31, 0).is_ok());
        assert_eq!(
            NodeId::new(32, 0),
            Err(Error::InvalidNodeIdentity {
                field: NodeField::DataCenterId,
                value: 32,
                max: 31,
            })
        );
        assert!(NodeId::new(i64::MIN, 0).is_err());
    }

    #[test]
    fn error_message_names_the_field() {
        let err = NodeId::new(0, 40).unwrap_err();
        assert_eq!(
            err.to_string(),
            "workerId can't be greater than 31 or less than 0 (got 40)"
        );
    }
}
