//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - The output document handed back to the host.
//!
//! The view is a nested row tree with per-column and total aggregates at every
//! node, the grand totals, and the column header tree when columns exist.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{value_key: value}`.
pub type ValueMap = Map<String, Value>;

/// `{column_key: {value_key: value}}`.
pub type CellMap = Map<String, Value>;

/// One row group in the output tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotNode {
    pub key: String,
    pub label: String,
    pub level: usize,
    pub cells: CellMap,
    pub totals: ValueMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PivotNode>,
}

/// Aggregates over every record, keyed like node aggregates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrandTotals {
    pub cells: CellMap,
    pub totals: ValueMap,
}

/// One column header. `key` is the full key path (`"2024|Won"`), which is
/// also the column slot of the cells beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHeaderNode {
    pub key: String,
    pub value: String,
    pub label: String,
    pub level: usize,
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ColumnHeaderNode>,
}

/// The complete pivot result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotResult {
    pub data: Vec<PivotNode>,
    pub grand_totals: GrandTotals,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_headers: Vec<ColumnHeaderNode>,
}

impl PivotResult {
    /// Number of top-level row groups.
    pub fn row_count(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
impl PivotResult {
    pub(crate) fn row(&self, key: &str) -> Option<&PivotNode> {
        self.data.iter().find(|n| n.key == key)
    }
}

#[cfg(test)]
impl PivotNode {
    pub(crate) fn child(&self, key: &str) -> Option<&PivotNode> {
        self.children.iter().find(|c| c.key == key)
    }
}
