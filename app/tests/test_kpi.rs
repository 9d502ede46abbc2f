//! FILENAME: tests/test_kpi.rs
//! Integration tests for KPI mode.

mod common;

use common::TestHarness;
use rollup_rpc::{Mode, INVALID_PARAMS};
use serde_json::json;

#[test]
fn test_kpi_sum_counts_valid_values() {
    let output = TestHarness::new(Mode::Kpi, json!({"operation": "sum", "field": "amount"}))
        .with_records(&[json!({"amount": 10}), json!({"amount": null}), json!({"amount": 30})])
        .run();

    assert!(output.result.is_ok());
    assert_eq!(output.ack(), &json!({"jsonrpc": "2.0", "result": "ok"}));
    let result = &output.body()[0];
    assert_eq!(result["result"].as_f64(), Some(40.0));
    assert_eq!(result["count"], json!(3));
    assert_eq!(result["validCount"], json!(2));
}

#[test]
fn test_kpi_avg_rounds_to_four_decimals() {
    let output = TestHarness::new(Mode::Kpi, json!({"operation": "avg", "field": "v"}))
        .with_records(&[json!({"v": 1}), json!({"v": 1}), json!({"v": 2})])
        .run();
    assert_eq!(output.body()[0]["result"].as_f64(), Some(1.3333));
}

#[test]
fn test_kpi_percentage_of_money_values() {
    let output = TestHarness::new(
        Mode::Kpi,
        json!({"operation": "percentage", "field": "won", "fieldB": "total"}),
    )
    .with_records(&[
        json!({"won": {"value": 25, "currency": "BRL"}, "total": 100}),
        json!({"won": 0, "total": 100}),
    ])
    .run();
    assert_eq!(output.body()[0]["result"].as_f64(), Some(12.5));
}

#[test]
fn test_kpi_field_not_found_reported_in_result() {
    let output = TestHarness::new(Mode::Kpi, json!({"operation": "sum", "field": "missing"}))
        .with_records(&[json!({"amount": 10})])
        .run();

    assert!(output.result.is_ok());
    let result = &output.body()[0];
    assert_eq!(result["result"].as_f64(), Some(0.0));
    assert_eq!(result["error"], json!("Field missing not found in data"));
}

#[test]
fn test_kpi_empty_stream() {
    let output = TestHarness::new(Mode::Kpi, json!({"operation": "max", "field": "amount"})).run();
    let result = &output.body()[0];
    assert_eq!(result["result"].as_f64(), Some(0.0));
    assert_eq!(result["count"], json!(0));
    assert_eq!(result["validCount"], json!(0));
}

#[test]
fn test_kpi_invalid_operation() {
    let output = TestHarness::new(Mode::Kpi, json!({"operation": "median", "field": "amount"}))
        .with_records(&[json!({"amount": 10})])
        .run();
    assert_eq!(output.error_code(), Some(INVALID_PARAMS));
    assert_eq!(
        output.error_message(),
        "Invalid operation: median. Must be one of: sum, avg, min, max, percentage"
    );
}

#[test]
fn test_kpi_percentage_requires_field_b() {
    let output = TestHarness::new(Mode::Kpi, json!({"operation": "percentage", "field": "won"})).run();
    assert_eq!(output.error_code(), Some(INVALID_PARAMS));
    assert_eq!(output.error_message(), "fieldB is required for percentage operation");
}
