//! FILENAME: core/engine/src/kpi.rs
//! PURPOSE: Reduces a whole record stream to a single KPI number.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateAccumulator, AggregatorKind};
use crate::error::{EngineError, EngineResult};
use crate::path::FieldPath;
use crate::value::{coerce_number, Record};

/// Decimal places kept in KPI results.
pub const KPI_DECIMALS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiOperation {
    Sum,
    Avg,
    Min,
    Max,
    Percentage,
}

impl FromStr for KpiOperation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(KpiOperation::Sum),
            "avg" => Ok(KpiOperation::Avg),
            "min" => Ok(KpiOperation::Min),
            "max" => Ok(KpiOperation::Max),
            "percentage" => Ok(KpiOperation::Percentage),
            other => Err(EngineError::InvalidConfig(format!(
                "Invalid operation: {}. Must be one of: sum, avg, min, max, percentage",
                other
            ))),
        }
    }
}

impl KpiOperation {
    fn aggregator(&self) -> AggregatorKind {
        match self {
            KpiOperation::Sum => AggregatorKind::Sum,
            KpiOperation::Avg => AggregatorKind::Avg,
            KpiOperation::Min => AggregatorKind::Min,
            KpiOperation::Max => AggregatorKind::Max,
            KpiOperation::Percentage => AggregatorKind::Percentage,
        }
    }
}

/// KPI request configuration as sent by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KpiConfig {
    pub operation: Option<String>,
    pub field: Option<String>,
    pub field_b: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiResult {
    pub result: f64,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl KpiResult {
    fn value(result: f64, count: usize, valid_count: usize) -> Self {
        KpiResult {
            result,
            count,
            valid_count: Some(valid_count),
            error: None,
        }
    }

    fn failed(count: usize, error: String) -> Self {
        KpiResult {
            result: 0.0,
            count,
            valid_count: None,
            error: Some(error),
        }
    }
}

struct KpiPlan {
    operation: KpiOperation,
    field: FieldPath,
    field_b: Option<FieldPath>,
}

impl KpiConfig {
    fn plan(&self) -> EngineResult<KpiPlan> {
        let operation: KpiOperation = self.operation.as_deref().unwrap_or("").parse()?;
        let field = match self.field.as_deref().filter(|f| !f.is_empty()) {
            Some(f) => FieldPath::parse(f)?,
            None => {
                return Err(EngineError::InvalidConfig(
                    "field is required for aggregation".to_string(),
                ))
            }
        };
        let field_b = match self.field_b.as_deref().filter(|f| !f.is_empty()) {
            Some(f) => Some(FieldPath::parse(f)?),
            None if operation == KpiOperation::Percentage => {
                return Err(EngineError::InvalidConfig(
                    "fieldB is required for percentage operation".to_string(),
                ))
            }
            None => None,
        };
        Ok(KpiPlan {
            operation,
            field,
            field_b,
        })
    }
}

/// Checks the configuration without touching any data.
pub fn validate_kpi(config: &KpiConfig) -> EngineResult<()> {
    config.plan().map(|_| ())
}

/// Computes the KPI value over all records.
///
/// A field no record carries is reported inside the result rather than as an
/// error, as is a missing denominator field for percentages.
pub fn compute_kpi(records: &[Record], config: &KpiConfig) -> EngineResult<KpiResult> {
    let plan = config.plan()?;
    let count = records.len();
    if count == 0 {
        return Ok(KpiResult::value(0.0, 0, 0));
    }
    if !records.iter().any(|r| plan.field.resolve(r).is_some()) {
        log::debug!("KPI field {} not present in {} records", plan.field, count);
        return Ok(KpiResult::failed(
            count,
            format!("Field {} not found in data", plan.field),
        ));
    }

    let mut acc = AggregateAccumulator::new(plan.operation.aggregator());
    for record in records {
        acc.add(plan.field.resolve(record), None);
    }
    let valid_count = acc.count_numbers as usize;
    if valid_count == 0 {
        return Ok(KpiResult::value(0.0, count, 0));
    }

    let result = match plan.operation {
        KpiOperation::Sum => acc.sum,
        KpiOperation::Avg => acc.sum / valid_count as f64,
        KpiOperation::Min => acc.min.unwrap_or(0.0),
        KpiOperation::Max => acc.max.unwrap_or(0.0),
        KpiOperation::Percentage => {
            let field_b = match &plan.field_b {
                Some(b) if records.iter().any(|r| b.resolve(r).is_some()) => b,
                other => {
                    let name = other.as_ref().map(|b| b.to_string()).unwrap_or_default();
                    return Ok(KpiResult::failed(count, format!("fieldB {} not found", name)));
                }
            };
            let denominator: f64 = records
                .iter()
                .filter_map(|r| field_b.resolve(r).and_then(coerce_number))
                .sum();
            if denominator == 0.0 {
                0.0
            } else {
                acc.sum / denominator * 100.0
            }
        }
    };

    Ok(KpiResult::value(round_to(result, KPI_DECIMALS), count, valid_count))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_records() -> Vec<Record> {
        json!([
            {"amount": 10, "target": 40, "deal": {"value": 1.23456}},
            {"amount": null, "target": 40, "deal": {"value": 2}},
            {"amount": 30, "target": 20},
            {"amount": "n/a"}
        ])
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
    }

    fn config(operation: &str, field: &str, field_b: Option<&str>) -> KpiConfig {
        KpiConfig {
            operation: Some(operation.to_string()),
            field: Some(field.to_string()),
            field_b: field_b.map(str::to_string),
        }
    }

    #[test]
    fn test_sum_counts_valid_values() {
        let result = compute_kpi(&create_test_records(), &config("sum", "amount", None)).unwrap();
        assert_eq!(result.result, 40.0);
        assert_eq!(result.count, 4);
        assert_eq!(result.valid_count, Some(2));
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_avg_min_max() {
        let records = create_test_records();
        assert_eq!(compute_kpi(&records, &config("avg", "amount", None)).unwrap().result, 20.0);
        assert_eq!(compute_kpi(&records, &config("min", "amount", None)).unwrap().result, 10.0);
        assert_eq!(compute_kpi(&records, &config("max", "amount", None)).unwrap().result, 30.0);
    }

    #[test]
    fn test_nested_field_rounds_to_four_places() {
        let result = compute_kpi(&create_test_records(), &config("sum", "deal.value", None)).unwrap();
        assert_eq!(result.result, 3.2346);
        assert_eq!(result.valid_count, Some(2));
    }

    #[test]
    fn test_percentage() {
        let result =
            compute_kpi(&create_test_records(), &config("percentage", "amount", Some("target"))).unwrap();
        assert_eq!(result.result, 40.0);

        let missing =
            compute_kpi(&create_test_records(), &config("percentage", "amount", Some("nope"))).unwrap();
        assert_eq!(missing.error.as_deref(), Some("fieldB nope not found"));
    }

    #[test]
    fn test_missing_field_is_reported_in_result() {
        let result = compute_kpi(&create_test_records(), &config("sum", "revenue", None)).unwrap();
        assert_eq!(result.result, 0.0);
        assert_eq!(result.error.as_deref(), Some("Field revenue not found in data"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, json!({"result": 0.0, "count": 4, "error": "Field revenue not found in data"}));
    }

    #[test]
    fn test_empty_data() {
        let result = compute_kpi(&[], &config("sum", "amount", None)).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"result": 0.0, "count": 0, "validCount": 0}));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(validate_kpi(&config("median", "amount", None)).is_err());
        assert!(validate_kpi(&config("percentage", "amount", None)).is_err());
        assert!(validate_kpi(&KpiConfig {
            operation: Some("sum".to_string()),
            ..KpiConfig::default()
        })
        .is_err());
    }
}
