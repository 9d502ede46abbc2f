//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - The calculation core that turns records into a grouped tree.
//!
//! Algorithm:
//! 1. Flatten every record and check that all configured fields exist
//! 2. For each record, format its row and column dimension values from the
//!    flattened form (value fields are read from the original record)
//! 3. Walk the row tuple down the tree, updating the slot cell and total of
//!    every node on the path, then the grand totals
//! 4. Walk the column tuple into the column header tree
//! 5. Sort every level and emit the view

use std::cmp::Ordering;

use smallvec::SmallVec;

use engine::format::DEFAULT_DISPLAY_FIELD;
use engine::{
    apply_picklist, column_names, flatten_all, format_lookup, format_scalar, key_string,
    AggregatorSpec, EngineError, EngineResult, FormatContext, LookupDisplay, Record, ID_FIELD,
};

use crate::cache::{AggregateRow, AxisLevel, AxisNode, DimensionValue};
use crate::definition::{
    DimensionSpec, PivotConfig, SortMode, SortOrder, BLANK_KEY, COLUMN_KEY_SEPARATOR,
    DEFAULT_COLUMN_KEY,
};
use crate::view::{ColumnHeaderNode, GrandTotals, PivotNode, PivotResult};

/// Number of available columns listed in a missing-field error.
const AVAILABLE_FIELDS_SHOWN: usize = 10;

type DimensionTuple = SmallVec<[DimensionValue; 4]>;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Builds the pivot tree for `records`.
pub fn build_pivot(
    records: &[Record],
    config: &PivotConfig,
    ctx: &FormatContext,
) -> EngineResult<PivotResult> {
    if records.is_empty() {
        return Err(EngineError::NoData(
            "No data provided for pivot table".to_string(),
        ));
    }
    config.validate()?;

    let flat = flatten_all(records)?;
    validate_fields(config, &flat)?;

    let mut calculator = PivotCalculator::new(config, ctx)?;
    for (record, flat_record) in records.iter().zip(&flat) {
        calculator.add_record(record, flat_record);
    }
    let result = calculator.finish();
    log::debug!(
        "pivot built: {} records, {} top-level rows, {} column headers",
        flat.len(),
        result.data.len(),
        result.column_headers.len()
    );
    Ok(result)
}

/// Checks that every configured field is addressable on the flattened records,
/// either as a column or as the prefix of flattened lookup columns.
pub fn validate_fields(config: &PivotConfig, flat: &[Record]) -> EngineResult<()> {
    let available = column_names(flat);
    let exists = |field: &str| {
        let prefix = format!("{}.", field);
        available
            .iter()
            .any(|column| column == field || column.starts_with(&prefix))
    };

    let mut missing = Vec::new();
    for dim in &config.rows {
        if !exists(dim.field.as_str()) {
            missing.push(format!("row field \"{}\"", dim.field));
        }
    }
    for dim in &config.columns {
        if !exists(dim.field.as_str()) {
            missing.push(format!("column field \"{}\"", dim.field));
        }
    }
    for value in &config.values {
        if !exists(value.field.as_str()) {
            missing.push(format!("value field \"{}\"", value.field));
        }
    }

    if missing.is_empty() {
        return Ok(());
    }
    let truncated = available.len() > AVAILABLE_FIELDS_SHOWN;
    Err(EngineError::MissingFields {
        missing,
        available: available.into_iter().take(AVAILABLE_FIELDS_SHOWN).collect(),
        truncated,
    })
}

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// Request-scoped state of one pivot calculation.
pub struct PivotCalculator<'a> {
    config: &'a PivotConfig,
    ctx: &'a FormatContext,
    specs: Vec<AggregatorSpec>,
    value_keys: Vec<String>,
    rows: AxisLevel,
    columns: AxisLevel,
    grand_totals: AggregateRow,
}

impl<'a> PivotCalculator<'a> {
    pub fn new(config: &'a PivotConfig, ctx: &'a FormatContext) -> EngineResult<Self> {
        config.validate()?;
        let specs: Vec<AggregatorSpec> = config.values.iter().map(|v| v.aggregator_spec()).collect();
        Ok(PivotCalculator {
            config,
            ctx,
            value_keys: config.value_keys(),
            grand_totals: AggregateRow::new(&specs),
            specs,
            rows: AxisLevel::default(),
            columns: AxisLevel::default(),
        })
    }

    /// Adds one record to every node on its row path and to the grand totals.
    /// Dimensions are read from `flat`, the flattened form of `record`; value
    /// fields are read from `record` itself.
    pub fn add_record(&mut self, record: &Record, flat: &Record) {
        let row_values: DimensionTuple = self
            .config
            .rows
            .iter()
            .map(|dim| self.dimension_value(flat, dim))
            .collect();
        let column_values: DimensionTuple = self
            .config
            .columns
            .iter()
            .map(|dim| self.dimension_value(flat, dim))
            .collect();

        let column_key = if column_values.is_empty() {
            DEFAULT_COLUMN_KEY.to_string()
        } else {
            column_values
                .iter()
                .map(|v| v.key.as_str())
                .collect::<Vec<_>>()
                .join(COLUMN_KEY_SEPARATOR)
        };

        let specs = &self.specs;
        let mut level = &mut self.rows;
        for (depth, part) in row_values.iter().enumerate() {
            let node = level.get_or_insert_with(&part.key, || AxisNode::row(part, depth, specs));
            if let Some(aggregates) = node.aggregates.as_mut() {
                aggregates.add(specs, &column_key, record);
            }
            level = &mut node.children;
        }
        self.grand_totals.add(specs, &column_key, record);

        let mut level = &mut self.columns;
        let mut path = String::new();
        for (depth, part) in column_values.iter().enumerate() {
            if depth > 0 {
                path.push_str(COLUMN_KEY_SEPARATOR);
            }
            path.push_str(&part.key);
            let node = level.get_or_insert_with(&part.key, || AxisNode::column(path.clone(), part, depth));
            level = &mut node.children;
        }
    }

    /// Sorts every level and produces the view.
    pub fn finish(self) -> PivotResult {
        let PivotCalculator {
            config,
            value_keys,
            mut rows,
            mut columns,
            grand_totals,
            ..
        } = self;

        sort_level(&mut rows, &config.rows, 0);
        sort_level(&mut columns, &config.columns, 0);

        PivotResult {
            data: rows
                .into_nodes()
                .into_iter()
                .map(|node| row_view(node, &value_keys))
                .collect(),
            grand_totals: GrandTotals {
                cells: grand_totals.cells_json(&value_keys),
                totals: grand_totals.totals_json(&value_keys),
            },
            column_headers: columns.into_nodes().into_iter().map(column_view).collect(),
        }
    }

    // ------------------------------------------------------------------------
    // Dimension formatting
    // ------------------------------------------------------------------------

    /// Resolves and formats one dimension of a flattened record.
    /// Missing values form the blank category under [`BLANK_KEY`].
    fn dimension_value(&self, record: &Record, dim: &DimensionSpec) -> DimensionValue {
        let raw = dim.field.resolve(record);

        if let Some(lookup) = &dim.lookup {
            if let Some(value) = self.lookup_value(record, dim, lookup, raw) {
                return value;
            }
        }

        if let Some(label) = apply_picklist(raw, &dim.values) {
            let key = raw.and_then(key_string).unwrap_or_else(|| label.clone());
            let ordinal = numeric_ordinal(dim, &label);
            return DimensionValue { key, label, ordinal };
        }

        let present = raw.filter(|v| !v.is_null() && v.as_str() != Some(""));
        if let (Some(bucket), Some(value)) = (&dim.bucket, present) {
            let bucketed = bucket.bucket(value);
            return DimensionValue {
                key: bucketed.label.clone(),
                label: bucketed.label,
                ordinal: bucketed.ordinal,
            };
        }

        let label = format_scalar(raw, self.ctx);
        let key = match present {
            Some(_) => label.clone(),
            None => BLANK_KEY.to_string(),
        };
        DimensionValue {
            key,
            ordinal: numeric_ordinal(dim, &label),
            label,
        }
    }

    /// Formats a lookup dimension from its flattened sub-field columns.
    fn lookup_value(
        &self,
        record: &Record,
        dim: &DimensionSpec,
        lookup: &LookupDisplay,
        raw: Option<&serde_json::Value>,
    ) -> Option<DimensionValue> {
        let object = gather_lookup(record, dim.field.as_str(), lookup);
        if !object.is_empty() {
            let label = format_lookup(&object, lookup, self.ctx);
            let display_field = lookup.display_field.as_deref().unwrap_or(DEFAULT_DISPLAY_FIELD);
            let key = object
                .get(ID_FIELD)
                .or_else(|| object.get(display_field))
                .and_then(key_string)
                .unwrap_or_else(|| label.clone());
            return Some(DimensionValue { key, label, ordinal: None });
        }

        // A sub-field of a lookup (`owner.name`): label from the sibling columns.
        let value = raw?;
        let parent = dim.field.parent()?;
        let siblings = gather_lookup(record, &parent, lookup);
        if siblings.is_empty() {
            return None;
        }
        Some(DimensionValue {
            key: key_string(value)
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| BLANK_KEY.to_string()),
            label: format_lookup(&siblings, lookup, self.ctx),
            ordinal: None,
        })
    }
}

/// Collects `base.<field>` columns of a flattened record into a lookup object.
fn gather_lookup(record: &Record, base: &str, lookup: &LookupDisplay) -> Record {
    let mut object = Record::new();
    for field in lookup.fields().into_iter().chain(std::iter::once(ID_FIELD)) {
        if object.contains_key(field) {
            continue;
        }
        if let Some(value) = record.get(&format!("{}.{}", base, field)) {
            object.insert(field.to_string(), value.clone());
        }
    }
    object
}

fn numeric_ordinal(dim: &DimensionSpec, label: &str) -> Option<i64> {
    match dim.sort_mode {
        SortMode::Numeric => label.trim().parse::<i64>().ok(),
        SortMode::Label => None,
    }
}

// ============================================================================
// SORTING
// ============================================================================

fn compare_labels(a: &AxisNode, b: &AxisNode) -> Ordering {
    a.label
        .to_lowercase()
        .cmp(&b.label.to_lowercase())
        .then_with(|| a.label.cmp(&b.label))
}

/// Items with an ordinal come first in ordinal order; the rest by label.
fn compare_nodes(a: &AxisNode, b: &AxisNode) -> Ordering {
    match (a.ordinal, b.ordinal) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| compare_labels(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_labels(a, b),
    }
}

fn sort_level(level: &mut AxisLevel, dims: &[DimensionSpec], depth: usize) {
    if let Some(dim) = dims.get(depth) {
        match dim.order {
            SortOrder::Ascending => level.nodes.sort_by(compare_nodes),
            SortOrder::Descending => level.nodes.sort_by(|a, b| compare_nodes(b, a)),
            SortOrder::DataSourceOrder => {}
        }
    }
    for node in &mut level.nodes {
        sort_level(&mut node.children, dims, depth + 1);
    }
}

// ============================================================================
// VIEW CONVERSION
// ============================================================================

fn row_view(node: AxisNode, value_keys: &[String]) -> PivotNode {
    let (cells, totals) = match &node.aggregates {
        Some(aggregates) => (aggregates.cells_json(value_keys), aggregates.totals_json(value_keys)),
        None => Default::default(),
    };
    PivotNode {
        key: node.key,
        label: node.label,
        level: node.depth,
        cells,
        totals,
        children: node
            .children
            .into_nodes()
            .into_iter()
            .map(|child| row_view(child, value_keys))
            .collect(),
    }
}

fn column_view(node: AxisNode) -> ColumnHeaderNode {
    ColumnHeaderNode {
        key: node.key,
        value: node.value,
        label: node.label,
        level: node.depth,
        expanded: true,
        children: node.children.into_nodes().into_iter().map(column_view).collect(),
    }
}
