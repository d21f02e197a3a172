use core::str::FromStr;
use serde_json::{Map, Value};
use std::io;

/// A read-only key/value configuration snapshot.
///
/// This is the boundary to whatever retrieves configuration (files, a remote
/// store, the environment). The generator only ever reads a handful of scalar
/// values from it, once, when it is built; later changes to the source are not
/// picked up.
///
/// Backed by a JSON object. The typed accessors are lenient: integers may be
/// given as JSON numbers or decimal strings, booleans as JSON booleans or
/// `"true"`/`"false"`. Missing keys and values of any other shape yield the
/// default.
///
/// # Example
///
/// ```
/// use tien_id::ConfigSnapshot;
///
/// let config: ConfigSnapshot = r#"{ "workerId": 3, "isClock": "true" }"#.parse().unwrap();
/// assert_eq!(config.get_long("workerId", 24), 3);
/// assert_eq!(config.get_long("dataCenterId", 24), 24);
/// assert!(config.get_bool("isClock", false));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigSnapshot {
    values: Map<String, Value>,
}

impl ConfigSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a snapshot from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not valid JSON or not an object.
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json).map(|values| Self { values })
    }

    /// Reads a snapshot from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content is not a JSON object.
    pub fn from_reader<R: io::Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader).map(|values| Self { values })
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Owned variant of [`Self::set`] for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the integer at `key`, or `default`.
    pub fn get_long(&self, key: &str, default: i64) -> i64 {
        let parsed = match self.values.get(key) {
            None => return default,
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(_) => None,
        };
        parsed.unwrap_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::warn!(key, default, "config value is not an integer, using default");
            default
        })
    }

    /// Returns the boolean at `key`, or `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        let parsed = match self.values.get(key) {
            None => return default,
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(_) => None,
        };
        parsed.unwrap_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::warn!(key, default, "config value is not a boolean, using default");
            default
        })
    }
}

impl From<Map<String, Value>> for ConfigSnapshot {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl FromStr for ConfigSnapshot {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back() {
        let config = ConfigSnapshot::new();
        assert!(config.is_empty());
        assert_eq!(config.get_long("workerId", 24), 24);
        assert!(!config.get_bool("isClock", false));
    }

    #[test]
    fn reads_numbers_and_numeric_strings() {
        let config = ConfigSnapshot::from_json_str(
            r#"{ "a": 7, "b": " -3 ", "c": 1.5, "d": "x", "e": [1], "f": null }"#,
        )
        .unwrap();
        assert_eq!(config.get_long("a", 0), 7);
        assert_eq!(config.get_long("b", 0), -3);
        assert_eq!(config.get_long("c", 9), 9);
        assert_eq!(config.get_long("d", 9), 9);
        assert_eq!(config.get_long("e", 9), 9);
        assert_eq!(config.get_long("f", 9), 9);
    }

    #[test]
    fn reads_booleans_and_boolean_strings() {
        let config = ConfigSnapshot::new()
            .with("a", true)
            .with("b", "false")
            .with("c", 1)
            .with("d", "yes");
        assert!(config.get_bool("a", false));
        assert!(!config.get_bool("b", true));
        assert!(config.get_bool("c", true));
        assert!(!config.get_bool("d", false));
    }

    #[test]
    fn set_overrides_parsed_values() {
        let mut config: ConfigSnapshot = r#"{ "workerId": 1 }"#.parse().unwrap();
        config.set("workerId", 2).set("dataCenterId", 5);
        assert_eq!(config.get_long("workerId", 0), 2);
        assert_eq!(config.get_long("dataCenterId", 0), 5);
        assert!(config.contains_key("dataCenterId"));
    }

    #[test]
    fn rejects_non_objects() {
        assert!(ConfigSnapshot::from_json_str("[1, 2]").is_err());
        assert!(ConfigSnapshot::from_json_str("not json").is_err());
        assert!(ConfigSnapshot::from_reader(&b"{}"[..]).unwrap().is_empty());
    }
}
