//! Stored preference values and typed coercion.
//!
//! Values come off disk untyped. Readers ask for a concrete type and get
//! either an exact match or their own default back; a shape mismatch is
//! treated the same as an absent key.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::de::{self, SeqAccess, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Key/value map as held by a preference source.
pub type PrefsMap = HashMap<String, ConfigValue>;

/// A single stored preference value.
///
/// Serialized untagged so a legacy snapshot reads as a plain JSON object.
/// When decoding, integers that fit in `i32` become `Int` and larger ones
/// `Long`. Integers beyond `i64` are rejected rather than rounded into a
/// float. Anything fractional becomes `Float`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
    StringSet(BTreeSet<String>),
}

impl ConfigValue {
    /// Short name of the stored type, used in logs and CLI output.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Int(_) => "int",
            ConfigValue::Long(_) => "long",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::StringSet(_) => "set",
        }
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ConfigValueVisitor)
    }
}

struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, number, string or list of strings")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ConfigValue, E> {
        Ok(i32::try_from(v).map_or(ConfigValue::Long(v), ConfigValue::Int))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ConfigValue, E> {
        match i64::try_from(v) {
            Ok(v) => self.visit_i64(v),
            Err(_) => Err(E::invalid_value(
                Unexpected::Unsigned(v),
                &"an integer within the 64-bit signed range",
            )),
        }
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Float(v as f32))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ConfigValue, A::Error> {
        let mut set = BTreeSet::new();
        while let Some(item) = seq.next_element::<String>()? {
            set.insert(item);
        }
        Ok(ConfigValue::StringSet(set))
    }
}

/// Conversion from a stored value into a requested type.
///
/// Returns `None` on any structural mismatch; callers substitute their
/// default. The only widening allowed is `Int` into `i64`, which is
/// lossless.
pub trait FromConfigValue: Sized {
    fn from_value(value: &ConfigValue) -> Option<Self>;
}

impl FromConfigValue for i32 {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromConfigValue for i64 {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Long(v) => Some(*v),
            ConfigValue::Int(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl FromConfigValue for f32 {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromConfigValue for bool {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromConfigValue for String {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromConfigValue for BTreeSet<String> {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::StringSet(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromConfigValue for HashSet<String> {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::StringSet(v) => Some(v.iter().cloned().collect()),
            _ => None,
        }
    }
}

/// Set members in sorted order.
impl FromConfigValue for Vec<String> {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::StringSet(v) => Some(v.iter().cloned().collect()),
            _ => None,
        }
    }
}

/// Look up `key` in `map` and coerce it, falling back to `default`.
pub fn coerce_or<T: FromConfigValue>(map: &PrefsMap, key: &str, default: T) -> T {
    map.get(key).and_then(T::from_value).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PrefsMap {
        let mut map = PrefsMap::new();
        map.insert("int".into(), ConfigValue::Int(5));
        map.insert("long".into(), ConfigValue::Long(1 << 40));
        map.insert("float".into(), ConfigValue::Float(1.5));
        map.insert("flag".into(), ConfigValue::Bool(true));
        map.insert("name".into(), ConfigValue::String("alice".into()));
        map.insert(
            "tags".into(),
            ConfigValue::StringSet(["b", "a"].iter().map(|s| s.to_string()).collect()),
        );
        map
    }

    #[test]
    fn exact_matches_are_returned() {
        let map = sample();
        assert_eq!(coerce_or(&map, "int", 0i32), 5);
        assert_eq!(coerce_or(&map, "long", 0i64), 1 << 40);
        assert_eq!(coerce_or(&map, "float", 0.0f32), 1.5);
        assert!(coerce_or(&map, "flag", false));
        assert_eq!(coerce_or(&map, "name", String::new()), "alice");
        assert_eq!(
            coerce_or(&map, "tags", Vec::<String>::new()),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn int_widens_to_long_only() {
        let map = sample();
        assert_eq!(coerce_or(&map, "int", 0i64), 5);
        assert_eq!(coerce_or(&map, "long", -1i32), -1);
    }

    #[test]
    fn mismatch_yields_default() {
        let map = sample();
        assert_eq!(coerce_or(&map, "float", 7i32), 7);
        assert_eq!(coerce_or(&map, "int", 2.5f32), 2.5);
        assert_eq!(coerce_or(&map, "name", 3i32), 3);
        assert!(!coerce_or(&map, "int", false));
        assert_eq!(coerce_or(&map, "tags", "x".to_string()), "x");
    }

    #[test]
    fn absent_yields_default() {
        let map = sample();
        assert_eq!(coerce_or(&map, "missing", 42i32), 42);
        assert_eq!(
            coerce_or(&map, "missing", HashSet::from(["d".to_string()])),
            HashSet::from(["d".to_string()])
        );
    }

    #[test]
    fn json_decoding_picks_narrowest_variant() {
        let json = r#"{"a": 5, "b": 8589934592, "c": 0.25, "d": true, "e": "x", "f": ["y"]}"#;
        let map: PrefsMap = serde_json::from_str(json).unwrap();
        assert_eq!(map["a"], ConfigValue::Int(5));
        assert_eq!(map["b"], ConfigValue::Long(8_589_934_592));
        assert_eq!(map["c"], ConfigValue::Float(0.25));
        assert_eq!(map["d"], ConfigValue::Bool(true));
        assert_eq!(map["e"], ConfigValue::String("x".into()));
        assert_eq!(map["f"].type_name(), "set");
    }

    #[test]
    fn json_integer_beyond_long_is_rejected() {
        let result: Result<PrefsMap, _> = serde_json::from_str(r#"{"big": 18446744073709551615}"#);
        assert!(result.is_err());

        let map: PrefsMap = serde_json::from_str(r#"{"min": -9223372036854775808}"#).unwrap();
        assert_eq!(map["min"], ConfigValue::Long(i64::MIN));
    }
}
