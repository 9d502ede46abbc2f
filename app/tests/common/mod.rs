//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for rollup-rpc integration tests.

#![allow(dead_code)]

use rollup_rpc::{run, Mode, RpcError};
use serde_json::{json, Value};

/// Builds one request stream and runs it through the transport.
pub struct TestHarness {
    pub mode: Mode,
    pub request: Value,
    pub lines: Vec<String>,
}

/// Captured result of one run.
pub struct RunOutput {
    pub result: Result<(), RpcError>,
    pub lines: Vec<Value>,
}

impl RunOutput {
    /// The acknowledgement (or error) line.
    pub fn ack(&self) -> &Value {
        &self.lines[0]
    }

    /// Lines after the acknowledgement.
    pub fn body(&self) -> &[Value] {
        &self.lines[1..]
    }

    pub fn error_code(&self) -> Option<i64> {
        self.lines.first().and_then(|l| l["error"]["code"].as_i64())
    }

    pub fn error_message(&self) -> String {
        self.lines
            .first()
            .and_then(|l| l["error"]["message"].as_str())
            .unwrap_or_default()
            .to_string()
    }
}

impl TestHarness {
    /// Create a harness whose request carries `config` and the method the
    /// mode expects.
    pub fn new(mode: Mode, config: Value) -> Self {
        TestHarness {
            mode,
            request: json!({
                "jsonrpc": "2.0",
                "method": mode.expected_method(),
                "params": {"config": config}
            }),
            lines: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.request["method"] = json!(method);
        self
    }

    pub fn with_param(mut self, name: &str, value: Value) -> Self {
        self.request["params"][name] = value;
        self
    }

    /// Append records, one NDJSON line each.
    pub fn with_records(mut self, records: &[Value]) -> Self {
        self.lines.extend(records.iter().map(|r| r.to_string()));
        self
    }

    /// Append a raw input line.
    pub fn with_raw_line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn input(&self) -> String {
        let mut input = self.request.to_string();
        for line in &self.lines {
            input.push('\n');
            input.push_str(line);
        }
        input.push('\n');
        input
    }

    pub fn run(&self) -> RunOutput {
        run_raw(self.mode, &self.input())
    }
}

/// Runs arbitrary input text.
pub fn run_raw(mode: Mode, input: &str) -> RunOutput {
    let mut output = Vec::new();
    let result = run(mode, input.as_bytes(), &mut output);
    let text = String::from_utf8(output).unwrap();
    let lines = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    RunOutput { result, lines }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Contacts with their opportunities and products, tagged by dataset.
pub struct ContactsFixture;

impl ContactsFixture {
    pub fn contacts() -> Vec<Value> {
        vec![
            json!({"_id": "c1", "code": 1001, "name": {"full": "Alice Santos"}}),
            json!({"_id": "c2", "code": 1002, "name": {"full": "Bruno Silva"}}),
            json!({"_id": "c3", "code": 1003, "name": {"full": "Carlos Mendes"}}),
        ]
    }

    pub fn opportunities() -> Vec<Value> {
        vec![
            json!({"_id": "o1", "_dataset": "Opportunity", "contact": {"_id": "c1"}, "status": "Nova", "value": 50000}),
            json!({"_id": "o2", "_dataset": "Opportunity", "contact": {"_id": "c1"}, "status": "Em Visitacao", "value": 100000}),
            json!({"_id": "o3", "_dataset": "Opportunity", "contact": {"_id": "c2"}, "status": "Nova", "value": 300000}),
        ]
    }

    pub fn products() -> Vec<Value> {
        vec![
            json!({"_id": "ppo1", "_dataset": "ProductsPerOpportunities", "opportunity": {"_id": "o1"}, "status": "Ofertado"}),
            json!({"_id": "ppo2", "_dataset": "ProductsPerOpportunities", "opportunity": {"_id": "o1"}, "status": "Visitado"}),
            json!({"_id": "ppo3", "_dataset": "ProductsPerOpportunities", "opportunity": {"_id": "o3"}, "status": "Ofertado"}),
        ]
    }

    /// Contacts (untagged, the parent dataset) followed by every child record.
    pub fn all_records() -> Vec<Value> {
        let mut records = Self::contacts();
        records.extend(Self::opportunities());
        records.extend(Self::products());
        records
    }
}

/// Opportunities with lookups, money values and dates, for pivot tests.
pub struct SalesFixture;

impl SalesFixture {
    pub fn records() -> Vec<Value> {
        vec![
            json!({"_id": "o1", "status": "Nova", "value": {"value": 50000, "currency": "BRL"},
                   "contact": {"_id": "c1", "code": 1001, "name": "Alice"}, "_createdAt": "2024-01-15T10:00:00Z"}),
            json!({"_id": "o2", "status": "Nova", "value": {"value": 100000, "currency": "BRL"},
                   "contact": {"_id": "c2", "code": 1002, "name": "Bruno"}, "_createdAt": "2024-02-10T10:00:00Z"}),
            json!({"_id": "o3", "status": "Ganha", "value": {"value": 300000, "currency": "BRL"},
                   "contact": {"_id": "c1", "code": 1001, "name": "Alice"}, "_createdAt": "2024-02-20T10:00:00Z"}),
            json!({"_id": "o4", "value": {"value": 25000, "currency": "BRL"},
                   "contact": {"_id": "c3", "code": 1003, "name": "Carlos"}, "_createdAt": "2023-12-01T10:00:00Z"}),
        ]
    }
}
