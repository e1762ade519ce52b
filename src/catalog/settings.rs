//! Ordered layer settings
//!
//! Settings are the scalar/tuple configuration attached to a catalog entry
//! and echoed into the emitted test case. Declaration order is preserved
//! through serialization.

use crate::error::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One setting value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Tuple(Vec<i64>),
}

impl From<bool> for SettingValue {
    fn from(v: bool) -> Self {
        SettingValue::Bool(v)
    }
}

impl From<i64> for SettingValue {
    fn from(v: i64) -> Self {
        SettingValue::Int(v)
    }
}

impl From<f64> for SettingValue {
    fn from(v: f64) -> Self {
        SettingValue::Float(v)
    }
}

impl<const N: usize> From<[i64; N]> for SettingValue {
    fn from(v: [i64; N]) -> Self {
        SettingValue::Tuple(v.to_vec())
    }
}

/// Ordered `key -> value` settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    entries: Vec<(String, SettingValue)>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Replaces an existing key in place.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fail on any key not in `allowed`.
    pub fn expect_keys(&self, layer: &str, allowed: &[&str]) -> Result<()> {
        match self.entries.iter().find(|(k, _)| !allowed.contains(&k.as_str())) {
            Some((key, _)) => Err(Error::config(
                layer,
                format!("unknown setting '{key}' (expected one of {allowed:?})"),
            )),
            None => Ok(()),
        }
    }

    /// Required positive integer.
    pub fn dim(&self, layer: &str, key: &str) -> Result<usize> {
        match self.get(key) {
            Some(value) => as_count(layer, key, value, 1),
            None => Err(Error::config(layer, format!("missing required setting '{key}'"))),
        }
    }

    /// Optional non-negative integer with a default.
    pub fn count_or(&self, layer: &str, key: &str, default: usize) -> Result<usize> {
        match self.get(key) {
            Some(value) => as_count(layer, key, value, 0),
            None => Ok(default),
        }
    }

    pub fn bool_or(&self, layer: &str, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            Some(SettingValue::Bool(b)) => Ok(*b),
            Some(other) => Err(type_error(layer, key, "a boolean", other)),
            None => Ok(default),
        }
    }

    pub fn int_or(&self, layer: &str, key: &str, default: i64) -> Result<i64> {
        match self.get(key) {
            Some(SettingValue::Int(i)) => Ok(*i),
            Some(other) => Err(type_error(layer, key, "an integer", other)),
            None => Ok(default),
        }
    }

    /// Float setting; integers are accepted and widened.
    pub fn float_or(&self, layer: &str, key: &str, default: f64) -> Result<f64> {
        match self.get(key) {
            Some(SettingValue::Float(f)) => Ok(*f),
            Some(SettingValue::Int(i)) => Ok(*i as f64),
            Some(other) => Err(type_error(layer, key, "a number", other)),
            None => Ok(default),
        }
    }

    /// Pair setting: a scalar `n` means `[n, n]`, a sequence must have
    /// exactly two non-negative elements.
    pub fn pair_or(&self, layer: &str, key: &str, default: [usize; 2]) -> Result<[usize; 2]> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => normalize_pair(layer, key, value),
        }
    }

    /// Required pair setting.
    pub fn pair(&self, layer: &str, key: &str) -> Result<[usize; 2]> {
        match self.get(key) {
            Some(value) => normalize_pair(layer, key, value),
            None => Err(Error::config(layer, format!("missing required setting '{key}'"))),
        }
    }
}

/// Normalize a scalar-or-sequence value into a fixed pair.
pub fn normalize_pair(layer: &str, key: &str, value: &SettingValue) -> Result<[usize; 2]> {
    let to_usize = |v: i64| {
        usize::try_from(v).map_err(|_| {
            Error::config(layer, format!("setting '{key}' must be non-negative, got {v}"))
        })
    };
    match value {
        SettingValue::Int(n) => {
            let n = to_usize(*n)?;
            Ok([n, n])
        }
        SettingValue::Tuple(items) if items.len() == 2 => Ok([to_usize(items[0])?, to_usize(items[1])?]),
        SettingValue::Tuple(items) => Err(Error::config(
            layer,
            format!("setting '{key}' must have 2 elements, got {}", items.len()),
        )),
        other => Err(type_error(layer, key, "an integer or a pair", other)),
    }
}

fn as_count(layer: &str, key: &str, value: &SettingValue, min: usize) -> Result<usize> {
    match value {
        SettingValue::Int(i) => match usize::try_from(*i) {
            Ok(n) if n >= min => Ok(n),
            _ => Err(Error::config(
                layer,
                format!("setting '{key}' must be >= {min}, got {i}"),
            )),
        },
        other => Err(type_error(layer, key, "an integer", other)),
    }
}

fn type_error(layer: &str, key: &str, expected: &str, got: &SettingValue) -> Error {
    Error::config(layer, format!("setting '{key}' must be {expected}, got {got:?}"))
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SettingsVisitor;

        impl<'de> Visitor<'de> for SettingsVisitor {
            type Value = Settings;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of layer settings")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Settings, A::Error> {
                let mut settings = Settings::new();
                while let Some((key, value)) = access.next_entry::<String, SettingValue>()? {
                    settings.insert(key, value);
                }
                Ok(settings)
            }
        }

        deserializer.deserialize_map(SettingsVisitor)
    }
}
