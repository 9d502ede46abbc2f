//! FILENAME: core/engine/src/path.rs
//! PURPOSE: Dot-delimited field paths and their resolution against records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;
use crate::value::Record;

/// An ordered sequence of field-name segments, written externally as `a.b.c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, EngineError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.split('.').any(|s| s.is_empty()) {
            return Err(EngineError::InvalidFieldPath(raw.to_string()));
        }
        Ok(FieldPath {
            raw: trimmed.to_string(),
            segments: trimmed.split('.').map(str::to_string).collect(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The path without its last segment, if it has more than one.
    pub fn parent(&self) -> Option<String> {
        self.raw.rsplit_once('.').map(|(parent, _)| parent.to_string())
    }

    /// Resolves this path against a record. See [`resolve`].
    pub fn resolve<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        resolve(record, self)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = EngineError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        FieldPath::parse(&raw)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> String {
        path.raw
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Walks `path` through nested objects.
///
/// Returns `None` (absent) as soon as a segment is missing or an intermediate
/// value is not an object; `Some(Value::Null)` means the field is present and null.
/// When descending fails, the remaining segments are tried as one literal dotted
/// key, so flattened records (`{"user.name": ..}`) resolve the same way.
pub fn resolve<'a>(record: &'a Record, path: &FieldPath) -> Option<&'a Value> {
    resolve_segments(record, &path.segments)
}

fn resolve_segments<'a>(map: &'a Record, segments: &[String]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    if rest.is_empty() {
        return map.get(first);
    }
    let nested = match map.get(first) {
        Some(Value::Object(inner)) => resolve_segments(inner, rest),
        _ => None,
    };
    nested.or_else(|| map.get(&segments.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_record() -> Record {
        json!({
            "_id": "c1",
            "name": {"full": "Alice", "first": null},
            "tags": ["a", "b"],
            "owner.name": "Flat Owner",
            "score": 7
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn path(raw: &str) -> FieldPath {
        FieldPath::parse(raw).unwrap()
    }

    #[test]
    fn test_resolve_nested() {
        let record = create_test_record();
        assert_eq!(resolve(&record, &path("name.full")), Some(&json!("Alice")));
        assert_eq!(resolve(&record, &path("_id")), Some(&json!("c1")));
    }

    #[test]
    fn test_absent_vs_null() {
        let record = create_test_record();
        assert_eq!(resolve(&record, &path("name.first")), Some(&Value::Null));
        assert_eq!(resolve(&record, &path("name.last")), None);
        assert_eq!(resolve(&record, &path("missing.deep.path")), None);
    }

    #[test]
    fn test_non_object_intermediate_is_absent() {
        let record = create_test_record();
        assert_eq!(resolve(&record, &path("score.value")), None);
        assert_eq!(resolve(&record, &path("tags.0")), None);
    }

    #[test]
    fn test_flattened_key_resolves() {
        let record = create_test_record();
        assert_eq!(resolve(&record, &path("owner.name")), Some(&json!("Flat Owner")));
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("a..b").is_err());
        assert!(FieldPath::parse(".a").is_err());
        assert_eq!(path("a.b.c").segments().len(), 3);
        assert_eq!(path("a.b.c").parent(), Some("a.b".to_string()));
        assert_eq!(path("a").parent(), None);
    }

    #[test]
    fn test_deserialize_from_string() {
        let parsed: FieldPath = serde_json::from_value(json!("contact._id")).unwrap();
        assert_eq!(parsed.as_str(), "contact._id");
        assert!(serde_json::from_value::<FieldPath>(json!("")).is_err());
    }
}
