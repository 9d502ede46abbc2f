//! FILENAME: core/pivot-engine/src/cache.rs
//! Pivot Cache - The in-memory state built while records stream in.
//!
//! Every row node owns one accumulator per value field for each column slot
//! it has seen, plus one per value field for its overall total. A record
//! updates its innermost node and every ancestor on the way down, so totals
//! at every level are maintained incrementally and never recomputed.

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use engine::{AggregateAccumulator, AggregatorSpec, Record};

// ============================================================================
// VALUE ACCUMULATORS
// ============================================================================

/// Accumulators of all value fields for one (node, column slot) pair.
#[derive(Debug, Clone)]
pub struct ValueCell {
    accumulators: Vec<AggregateAccumulator>,
}

impl ValueCell {
    pub fn new(specs: &[AggregatorSpec]) -> Self {
        ValueCell {
            accumulators: specs.iter().map(AggregatorSpec::accumulator).collect(),
        }
    }

    pub fn add(&mut self, specs: &[AggregatorSpec], record: &Record) {
        for (spec, acc) in specs.iter().zip(self.accumulators.iter_mut()) {
            spec.feed(acc, record);
        }
    }

    /// Computed values keyed by value key.
    pub fn compute(&self, value_keys: &[String]) -> Map<String, Value> {
        value_keys
            .iter()
            .zip(&self.accumulators)
            .map(|(key, acc)| (key.clone(), acc.compute()))
            .collect()
    }
}

/// Aggregates of one row node, or of the grand total.
#[derive(Debug, Clone)]
pub struct AggregateRow {
    /// Column slot cells in first-seen order.
    cells: Vec<(String, ValueCell)>,
    cell_index: FxHashMap<String, usize>,
    totals: ValueCell,
}

impl AggregateRow {
    pub fn new(specs: &[AggregatorSpec]) -> Self {
        AggregateRow {
            cells: Vec::new(),
            cell_index: FxHashMap::default(),
            totals: ValueCell::new(specs),
        }
    }

    /// Adds a record to its column slot and to the overall total.
    pub fn add(&mut self, specs: &[AggregatorSpec], column_key: &str, record: &Record) {
        let idx = match self.cell_index.get(column_key) {
            Some(&idx) => idx,
            None => {
                let idx = self.cells.len();
                self.cells.push((column_key.to_string(), ValueCell::new(specs)));
                self.cell_index.insert(column_key.to_string(), idx);
                idx
            }
        };
        self.cells[idx].1.add(specs, record);
        self.totals.add(specs, record);
    }

    /// `{column_key: {value_key: value}}`.
    pub fn cells_json(&self, value_keys: &[String]) -> Map<String, Value> {
        self.cells
            .iter()
            .map(|(key, cell)| (key.clone(), Value::Object(cell.compute(value_keys))))
            .collect()
    }

    /// `{value_key: value}`.
    pub fn totals_json(&self, value_keys: &[String]) -> Map<String, Value> {
        self.totals.compute(value_keys)
    }
}

// ============================================================================
// AXIS TREE
// ============================================================================

/// A formatted dimension value of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionValue {
    /// Grouping key (identifier or raw value).
    pub key: String,
    /// Display label.
    pub label: String,
    /// Chronological or numeric position, when the dimension has one.
    pub ordinal: Option<i64>,
}

/// A node in the axis tree (row or column hierarchy).
/// Each node represents a unique value at a specific dimension level.
#[derive(Debug, Clone)]
pub struct AxisNode {
    /// Row nodes: the dimension key. Column nodes: the `|`-joined label path.
    pub key: String,

    /// The raw value this node groups by.
    pub value: String,

    /// Display label for this node.
    pub label: String,

    /// Sort position, see [`DimensionValue::ordinal`].
    pub ordinal: Option<i64>,

    /// Depth in the tree (0 = root level).
    pub depth: usize,

    /// Row nodes only.
    pub aggregates: Option<AggregateRow>,

    /// Child nodes (next level of grouping).
    pub children: AxisLevel,
}

impl AxisNode {
    pub fn row(part: &DimensionValue, depth: usize, specs: &[AggregatorSpec]) -> Self {
        AxisNode {
            key: part.key.clone(),
            value: part.key.clone(),
            label: part.label.clone(),
            ordinal: part.ordinal,
            depth,
            aggregates: Some(AggregateRow::new(specs)),
            children: AxisLevel::default(),
        }
    }

    pub fn column(path: String, part: &DimensionValue, depth: usize) -> Self {
        AxisNode {
            key: path,
            value: part.key.clone(),
            label: part.label.clone(),
            ordinal: part.ordinal,
            depth,
            aggregates: None,
            children: AxisLevel::default(),
        }
    }
}

/// The sibling nodes of one level, with a lookup index by grouping key.
#[derive(Debug, Clone, Default)]
pub struct AxisLevel {
    pub nodes: Vec<AxisNode>,
    index: FxHashMap<String, usize>,
}

impl AxisLevel {
    /// Returns the node for `key`, creating it on first sight.
    pub fn get_or_insert_with<F>(&mut self, key: &str, create: F) -> &mut AxisNode
    where
        F: FnOnce() -> AxisNode,
    {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.nodes.len();
                self.nodes.push(create());
                self.index.insert(key.to_string(), idx);
                idx
            }
        };
        &mut self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consumes the level, dropping the key index.
    pub fn into_nodes(self) -> Vec<AxisNode> {
        self.nodes
    }
}
