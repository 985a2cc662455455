//! Typed path variables attached to a matched request.

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

use crate::error::{PigError, Result};

/// Maximum number of path variables stored inline before spilling to the heap.
/// Route templates rarely declare more than a handful of placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Placeholder name (shared with the route table) and its cast value.
pub type ParamVec = SmallVec<[(Arc<str>, PathValue); MAX_INLINE_PARAMS]>;

/// A path segment after its placeholder caster ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for PathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathValue::Str(s) => f.write_str(s),
            PathValue::Int(i) => write!(f, "{i}"),
            PathValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Read-only bag of typed path variables.
///
/// Built once by the router when a route matches; there is no way to change
/// its contents afterwards. [`PathVars::set`] exists only to report the
/// attempt as [`PigError::ImmutableWrite`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathVars {
    params: ParamVec,
}

impl PathVars {
    pub(crate) fn new(params: ParamVec) -> Self {
        Self { params }
    }

    /// Look up a variable by placeholder name.
    ///
    /// # Errors
    ///
    /// `PigError::AttributeNotFound` if the route declared no such placeholder.
    pub fn get(&self, name: &str) -> Result<&PathValue> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
            .ok_or_else(|| PigError::AttributeNotFound {
                key: name.to_string(),
            })
    }

    /// # Errors
    ///
    /// `AttributeNotFound` or `TypeMismatch` if the value is not a string.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.get(name)? {
            PathValue::Str(s) => Ok(s),
            _ => Err(mismatch(name, "string")),
        }
    }

    /// # Errors
    ///
    /// `AttributeNotFound` or `TypeMismatch` if the value is not an integer.
    pub fn get_int(&self, name: &str) -> Result<i64> {
        match self.get(name)? {
            PathValue::Int(i) => Ok(*i),
            _ => Err(mismatch(name, "integer")),
        }
    }

    /// # Errors
    ///
    /// `AttributeNotFound` or `TypeMismatch` if the value is not a float.
    pub fn get_float(&self, name: &str) -> Result<f64> {
        match self.get(name)? {
            PathValue::Float(v) => Ok(*v),
            _ => Err(mismatch(name, "float")),
        }
    }

    /// Always fails: path variables cannot be rebound once a route matched.
    ///
    /// # Errors
    ///
    /// Always returns `PigError::ImmutableWrite`.
    pub fn set(&self, name: &str, _value: PathValue) -> Result<()> {
        Err(PigError::ImmutableWrite {
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k.as_ref() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathValue)> {
        self.params.iter().map(|(k, v)| (k.as_ref(), v))
    }
}

fn mismatch(name: &str, expected: &'static str) -> PigError {
    PigError::TypeMismatch {
        key: name.to_string(),
        expected,
    }
}

impl Serialize for PathVars {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.params.len()))?;
        for (k, v) in &self.params {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn bag() -> PathVars {
        PathVars::new(smallvec![
            (Arc::from("name"), PathValue::Str("alice".into())),
            (Arc::from("id"), PathValue::Int(42)),
        ])
    }

    #[test]
    fn test_typed_getters() {
        let vars = bag();
        assert_eq!(vars.get_str("name").unwrap(), "alice");
        assert_eq!(vars.get_int("id").unwrap(), 42);
        assert_eq!(vars.len(), 2);
        assert!(vars.contains("id"));
    }

    #[test]
    fn test_missing_and_mismatched() {
        let vars = bag();
        assert!(matches!(
            vars.get("nope"),
            Err(PigError::AttributeNotFound { ref key }) if key == "nope"
        ));
        assert!(matches!(
            vars.get_float("id"),
            Err(PigError::TypeMismatch { expected: "float", .. })
        ));
    }

    #[test]
    fn test_set_is_rejected() {
        let vars = bag();
        let err = vars.set("id", PathValue::Int(7)).unwrap_err();
        assert!(matches!(err, PigError::ImmutableWrite { ref name } if name == "id"));
        assert_eq!(vars.get_int("id").unwrap(), 42);
    }

    #[test]
    fn test_serializes_as_object() {
        let json = serde_json::to_value(bag()).unwrap();
        assert_eq!(json, serde_json::json!({"name": "alice", "id": 42}));
    }
}
