//! FILENAME: tests/test_logging.rs
//! Integration tests for the unified log sink.

mod common;

use common::TestHarness;
use log::LevelFilter;
use rollup_rpc::{init_log_file, init_logging, write_log, Mode};
use serde_json::json;

#[test]
fn test_log_file_receives_protocol_and_engine_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollup.log");
    std::fs::write(&path, "stale line\n").unwrap();

    init_logging(LevelFilter::Debug);
    init_log_file(&path).unwrap();
    write_log("I", "TEST", "hello");

    let output = TestHarness::new(Mode::Pivot, json!({
        "rows": [{"field": "status"}],
        "values": [{"field": "value", "aggregator": "sum"}]
    }))
    .with_records(&[json!({"status": "Nova", "value": 1})])
    .with_raw_line("{broken")
    .run();
    assert!(output.result.is_ok());

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("stale line"));
    assert!(contents.contains("|I|TEST|hello"));
    assert!(contents.contains("|W|INPUT|Skipping line 3"));
    assert!(contents.contains("|I|RPC|ENTER run mode=pivot"));
    assert!(contents.contains("|I|RPC|EXIT run ok=true"));
    // Engine crates log through the facade.
    assert!(contents.contains("|D|PIVOT_ENGINE|pivot built"));

    let seqs: Vec<u64> = contents
        .lines()
        .map(|l| l.split('|').next().unwrap().parse().unwrap())
        .collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}
