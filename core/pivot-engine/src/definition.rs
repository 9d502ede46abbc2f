//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable request configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot table.
//! These structures are designed to be:
//! - Deserialized from the host's enriched pivot config (camelCase JSON)
//! - Validated once before any record is processed
//! - Immutable for the duration of a calculation

use serde::{Deserialize, Serialize};

use engine::{
    AggregatorKind, AggregatorSpec, DateBucket, EngineError, EngineResult, FieldPath,
    LookupDisplay, PicklistOption,
};

/// Column slot used when no column dimensions are configured.
pub const DEFAULT_COLUMN_KEY: &str = "__default__";

/// Separator between dimension keys in a column slot key.
pub const COLUMN_KEY_SEPARATOR: &str = "|";

/// Grouping key of the blank category (absent, null or empty values). Its
/// label is the localized blank text, so a literal value equal to that text
/// still forms its own group.
pub const BLANK_KEY: &str = "__blank__";

// ============================================================================
// SORTING
// ============================================================================

/// Sort order for a dimension's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ASC", alias = "asc")]
    Ascending,
    #[serde(rename = "DESC", alias = "desc")]
    Descending,
    /// Keep first-seen order.
    #[serde(rename = "SOURCE", alias = "source")]
    DataSourceOrder,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Ascending
    }
}

/// How items without a date bucket are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Case-insensitive label order.
    Label,
    /// Labels that parse as integers compare numerically and come first.
    Numeric,
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::Label
    }
}

// ============================================================================
// DIMENSIONS AND VALUES
// ============================================================================

/// A row or column axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSpec {
    /// Field path, addressed on flattened records.
    pub field: FieldPath,

    /// Display caption from the host's metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Field type from the host's metadata (`text`, `lookup`, `date`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Lookup display rule when the field references another document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupDisplay>,

    /// Explicit value to label table (picklists).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<PicklistOption>,

    /// Calendar unit for date fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<DateBucket>,

    #[serde(default)]
    pub order: SortOrder,

    #[serde(default)]
    pub sort_mode: SortMode,
}

impl DimensionSpec {
    pub fn new(field: FieldPath) -> Self {
        DimensionSpec {
            field,
            label: None,
            field_type: None,
            lookup: None,
            values: Vec::new(),
            bucket: None,
            order: SortOrder::Ascending,
            sort_mode: SortMode::Label,
        }
    }
}

/// A value field: what to aggregate and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSpec {
    pub field: FieldPath,

    #[serde(default)]
    pub aggregator: AggregatorKind,

    /// Denominator of `percentage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_b: Option<FieldPath>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Display format hint (e.g. `currency`); passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ValueSpec {
    pub fn new(field: FieldPath, aggregator: AggregatorKind) -> Self {
        ValueSpec {
            field,
            aggregator,
            field_b: None,
            label: None,
            field_type: None,
            format: None,
        }
    }

    pub fn aggregator_spec(&self) -> AggregatorSpec {
        AggregatorSpec {
            aggregator: self.aggregator,
            field: Some(self.field.clone()),
            field_b: self.field_b.clone(),
        }
    }
}

// ============================================================================
// PIVOT CONFIG
// ============================================================================

/// The complete pivot request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotConfig {
    #[serde(default)]
    pub rows: Vec<DimensionSpec>,

    #[serde(default)]
    pub columns: Vec<DimensionSpec>,

    #[serde(default)]
    pub values: Vec<ValueSpec>,
}

impl PivotConfig {
    /// Checks the configuration shape. Field existence is checked against data
    /// separately.
    pub fn validate(&self) -> EngineResult<()> {
        if self.rows.is_empty() {
            return Err(EngineError::InvalidConfig(
                "Rows are required for pivot table".to_string(),
            ));
        }
        if self.values.is_empty() {
            return Err(EngineError::InvalidConfig(
                "Values are required for pivot table".to_string(),
            ));
        }
        for value in &self.values {
            value.aggregator_spec().validate()?;
        }
        Ok(())
    }

    /// Output key of each value field, in declaration order.
    /// A field used by several value specs is disambiguated as `field_aggregator`.
    pub fn value_keys(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|value| {
                let shared = self
                    .values
                    .iter()
                    .filter(|other| other.field == value.field)
                    .count()
                    > 1;
                if shared {
                    format!("{}_{}", value.field, value.aggregator.name())
                } else {
                    value.field.to_string()
                }
            })
            .collect()
    }
}
