//! FILENAME: core/relation-engine/src/definition.rs
//! Relation Definition - The serializable join configuration.
//!
//! A join request names the parent dataset and a list of relation
//! declarations. Each declaration joins a child dataset into its parent by
//! key equality, writes named aggregates into every parent record, and may
//! carry nested declarations that are resolved first.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use engine::{AggregatorSpec, EngineError, EngineResult, FieldPath};

// ============================================================================
// AGGREGATOR MAP
// ============================================================================

/// Output field name to aggregator, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatorMap(pub Vec<(String, AggregatorSpec)>);

impl AggregatorMap {
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AggregatorSpec)> {
        self.0.iter().map(|(name, spec)| (name, spec))
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.iter().map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for AggregatorMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, spec) in &self.0 {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

struct AggregatorMapVisitor;

impl<'de> Visitor<'de> for AggregatorMapVisitor {
    type Value = AggregatorMap;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of output field names to aggregators")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, spec)) = access.next_entry::<String, AggregatorSpec>()? {
            entries.retain(|(existing, _): &(String, AggregatorSpec)| existing != &name);
            entries.push((name, spec));
        }
        Ok(AggregatorMap(entries))
    }
}

impl<'de> Deserialize<'de> for AggregatorMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AggregatorMapVisitor)
    }
}

// ============================================================================
// RELATIONS
// ============================================================================

/// Joins one child dataset into its parent records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDeclaration {
    /// Dataset tag of the child records.
    pub dataset: String,

    /// Key path on the parent record.
    pub parent_key: FieldPath,

    /// Key path on the child record that must equal the parent key.
    pub child_key: FieldPath,

    #[serde(default)]
    pub aggregators: AggregatorMap,

    /// Relations of the child dataset, resolved before this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationDeclaration>,
}

impl RelationDeclaration {
    /// Checks the declaration tree. Aggregators are not checked for fields:
    /// a numeric aggregator without one reduces to its empty result.
    pub fn validate(&self) -> EngineResult<()> {
        if self.dataset.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "Relation dataset is required".to_string(),
            ));
        }
        self.relations.iter().try_for_each(RelationDeclaration::validate)
    }
}

/// The complete join request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationConfig {
    #[serde(default)]
    pub parent_dataset: Option<String>,

    #[serde(default)]
    pub relations: Vec<RelationDeclaration>,
}

impl RelationConfig {
    /// Checks required fields and returns the parent dataset name.
    pub fn validate(&self) -> EngineResult<&str> {
        let parent = self
            .parent_dataset
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| EngineError::InvalidConfig("parentDataset is required".to_string()))?;
        if self.relations.is_empty() {
            return Err(EngineError::InvalidConfig(
                "At least one relation is required".to_string(),
            ));
        }
        self.relations.iter().try_for_each(RelationDeclaration::validate)?;
        Ok(parent)
    }
}
