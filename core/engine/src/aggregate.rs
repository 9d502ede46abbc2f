//! FILENAME: core/engine/src/aggregate.rs
//! PURPOSE: The closed set of aggregators and their incremental accumulator.
//! CONTEXT: Both the pivot tree and the relation processor reduce groups by
//! folding records through an `AggregateAccumulator`, so empty-group and
//! null policies live in exactly one place.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::path::FieldPath;
use crate::value::{canonical_json, coerce_number, number_text, number_value, strip_internal, Record};

// ============================================================================
// AGGREGATOR KINDS
// ============================================================================

/// Aggregation functions available to value fields and relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregatorKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
    Percentage,
}

impl Default for AggregatorKind {
    fn default() -> Self {
        AggregatorKind::Sum
    }
}

impl AggregatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregatorKind::Count => "count",
            AggregatorKind::Sum => "sum",
            AggregatorKind::Avg => "avg",
            AggregatorKind::Min => "min",
            AggregatorKind::Max => "max",
            AggregatorKind::First => "first",
            AggregatorKind::Last => "last",
            AggregatorKind::Push => "push",
            AggregatorKind::AddToSet => "addToSet",
            AggregatorKind::Percentage => "percentage",
        }
    }

    /// Aggregators that only look at numeric values.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            AggregatorKind::Sum
                | AggregatorKind::Avg
                | AggregatorKind::Min
                | AggregatorKind::Max
                | AggregatorKind::Percentage
        )
    }
}

// ============================================================================
// AGGREGATOR SPEC
// ============================================================================

/// One aggregation: a kind plus the field(s) it reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorSpec {
    #[serde(default)]
    pub aggregator: AggregatorKind,

    /// Field to aggregate. Without one, `first`, `last` and `push` take the
    /// whole record.
    #[serde(default)]
    pub field: Option<FieldPath>,

    /// Denominator field of `percentage`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_b: Option<FieldPath>,
}

impl AggregatorSpec {
    pub fn new(aggregator: AggregatorKind, field: Option<FieldPath>) -> Self {
        AggregatorSpec {
            aggregator,
            field,
            field_b: None,
        }
    }

    /// Checks that the kind has the fields it needs.
    pub fn validate(&self) -> EngineResult<()> {
        if self.aggregator.is_numeric() && self.field.is_none() {
            return Err(EngineError::InvalidConfig(format!(
                "Aggregator {} requires a field",
                self.aggregator.name()
            )));
        }
        if self.aggregator == AggregatorKind::Percentage && self.field_b.is_none() {
            return Err(EngineError::InvalidConfig(
                "Aggregator percentage requires fieldB".to_string(),
            ));
        }
        Ok(())
    }

    pub fn accumulator(&self) -> AggregateAccumulator {
        AggregateAccumulator::new(self.aggregator)
    }

    /// Feeds one record into an accumulator created by [`Self::accumulator`].
    pub fn feed(&self, acc: &mut AggregateAccumulator, record: &Record) {
        match &self.field {
            Some(field) => {
                let denominator = self.field_b.as_ref().and_then(|b| b.resolve(record));
                acc.add(field.resolve(record), denominator);
            }
            None => acc.add_record(record),
        }
    }

    /// Reduces a whole group in one pass.
    pub fn reduce<'a, I>(&self, records: I) -> Value
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut acc = self.accumulator();
        for record in records {
            self.feed(&mut acc, record);
        }
        acc.compute()
    }
}

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running state of one aggregator over one group.
#[derive(Debug, Clone)]
pub struct AggregateAccumulator {
    pub kind: AggregatorKind,
    /// Records seen.
    pub count: u64,
    /// Values that coerced to a number.
    pub count_numbers: u64,
    pub sum: f64,
    /// Denominator sum for `percentage`.
    pub sum_b: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    first: Option<Value>,
    last: Option<Value>,
    items: Vec<Value>,
    seen: FxHashSet<String>,
}

impl AggregateAccumulator {
    pub fn new(kind: AggregatorKind) -> Self {
        AggregateAccumulator {
            kind,
            count: 0,
            count_numbers: 0,
            sum: 0.0,
            sum_b: 0.0,
            min: None,
            max: None,
            first: None,
            last: None,
            items: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Adds a numeric value to the running sum and extremes.
    pub fn add_number(&mut self, value: f64) {
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Adds the resolved field value of one record (`None` when absent).
    pub fn add(&mut self, value: Option<&Value>, denominator: Option<&Value>) {
        self.count += 1;
        match self.kind {
            AggregatorKind::Count => {}
            AggregatorKind::Sum | AggregatorKind::Avg | AggregatorKind::Min | AggregatorKind::Max => {
                if let Some(n) = value.and_then(coerce_number) {
                    self.add_number(n);
                }
            }
            AggregatorKind::Percentage => {
                if let Some(n) = value.and_then(coerce_number) {
                    self.add_number(n);
                }
                if let Some(d) = denominator.and_then(coerce_number) {
                    self.sum_b += d;
                }
            }
            AggregatorKind::First => {
                if self.first.is_none() {
                    self.first = Some(value.cloned().unwrap_or(Value::Null));
                }
            }
            AggregatorKind::Last => {
                self.last = Some(value.cloned().unwrap_or(Value::Null));
            }
            AggregatorKind::Push => {
                self.items.push(value.cloned().unwrap_or(Value::Null));
            }
            AggregatorKind::AddToSet => {
                if let Some(v) = value.filter(|v| !v.is_null()) {
                    if self.seen.insert(set_key(v)) {
                        self.items.push(v.clone());
                    }
                }
            }
        }
    }

    /// Adds a whole record, for aggregators declared without a field.
    pub fn add_record(&mut self, record: &Record) {
        self.count += 1;
        match self.kind {
            AggregatorKind::First => {
                if self.first.is_none() {
                    self.first = Some(strip_internal(record));
                }
            }
            AggregatorKind::Last => self.last = Some(strip_internal(record)),
            AggregatorKind::Push => self.items.push(strip_internal(record)),
            _ => {}
        }
    }

    /// Final value of the aggregation.
    pub fn compute(&self) -> Value {
        match self.kind {
            AggregatorKind::Count => Value::from(self.count),
            AggregatorKind::Sum => number_value(self.sum),
            AggregatorKind::Avg => {
                if self.count_numbers > 0 {
                    number_value(self.sum / self.count_numbers as f64)
                } else {
                    Value::from(0)
                }
            }
            AggregatorKind::Min => self.min.map(number_value).unwrap_or(Value::Null),
            AggregatorKind::Max => self.max.map(number_value).unwrap_or(Value::Null),
            AggregatorKind::First => self.first.clone().unwrap_or(Value::Null),
            AggregatorKind::Last => self.last.clone().unwrap_or(Value::Null),
            AggregatorKind::Push | AggregatorKind::AddToSet => Value::Array(self.items.clone()),
            AggregatorKind::Percentage => {
                if self.sum_b == 0.0 {
                    Value::from(0)
                } else {
                    number_value(self.sum / self.sum_b * 100.0)
                }
            }
        }
    }
}

/// De-duplication key of `addToSet`: type-tagged so `1` and `"1"` stay distinct,
/// canonical so key order inside objects does not matter.
fn set_key(value: &Value) -> String {
    match value {
        Value::String(s) => format!("s:{}", s),
        Value::Number(n) => format!("n:{}", number_text(n)),
        Value::Bool(b) => format!("b:{}", b),
        other => format!("j:{}", canonical_json(other)),
    }
}
