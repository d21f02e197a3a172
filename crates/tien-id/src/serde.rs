//! Serde helpers for [`SnowflakeId`] fields.
//!
//! Use with `#[serde(with = "...")]`:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use tien_id::{SnowflakeId, as_decimal_string, as_native};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Order {
//!     #[serde(with = "as_native")]
//!     id: SnowflakeId,
//!     #[serde(with = "as_decimal_string")]
//!     parent: SnowflakeId,
//! }
//! ```
//!
//! [`SnowflakeId`]: crate::SnowflakeId

pub mod as_native {
    use crate::SnowflakeId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an ID as a non-negative `i64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_i64().serialize(s)
    }

    /// Deserialize an ID from an integer.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the value is
    /// negative.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let n = i64::deserialize(d)?;
        SnowflakeId::try_from(n).map_err(serde::de::Error::custom)
    }
}

/// For consumers that cannot hold a 64-bit integer losslessly (JavaScript,
/// some JSON parsers).
pub mod as_decimal_string {
    use crate::SnowflakeId;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize an ID as a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// Deserialize an ID from a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the string is
    /// not a valid decimal ID.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnowflakeId;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        #[serde(with = "as_native")]
        native: SnowflakeId,
        #[serde(with = "as_decimal_string")]
        text: SnowflakeId,
    }

    #[test]
    fn encodes_native_and_string_forms() {
        let id = SnowflakeId::from_components(1_000, 1, 2, 3);
        let record = Record {
            native: id,
            text: id,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            format!(r#"{{"native":{},"text":"{}"}}"#, id.to_raw(), id.to_raw())
        );
        assert_eq!(serde_json::from_str::<Record>(&json).unwrap(), record);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(serde_json::from_str::<Record>(r#"{"native":-1,"text":"1"}"#).is_err());
        assert!(serde_json::from_str::<Record>(r#"{"native":1,"text":"x"}"#).is_err());
    }
}
