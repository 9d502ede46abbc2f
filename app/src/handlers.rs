//! FILENAME: app/src/handlers.rs
// PURPOSE: Request dispatch: reads the request and records, runs the engine for
// the selected mode and writes the response lines.

use std::io::{BufRead, Lines, Write};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use engine::{compute_kpi, validate_kpi, FormatContext, KpiConfig, Record};
use pivot_engine::{build_pivot, PivotConfig};
use relation_engine::{run_join, Datasets, RelationConfig};

use crate::config::Mode;
use crate::protocol::{success, write_line, RpcError, RpcRequest};
use crate::{log_debug, log_enter_info, log_error, log_exit_info, log_info, log_warn};

/// Serves one request. On failure the error response is written to `output`
/// before the error is returned.
pub fn run<R: BufRead, W: Write>(mode: Mode, input: R, output: &mut W) -> Result<(), RpcError> {
    log_enter_info!("RPC", "run", "mode={}", mode);
    let outcome = serve(mode, input, output);
    if let Err(ref err) = outcome {
        log_error!("RPC", "{} failed: [{}] {}", mode, err.code, err.message);
        write_line(output, &err.to_response())?;
    }
    output.flush()?;
    log_exit_info!("RPC", "run", "ok={}", outcome.is_ok());
    outcome
}

fn serve<R: BufRead, W: Write>(mode: Mode, input: R, output: &mut W) -> Result<(), RpcError> {
    let mut lines = input.lines();
    let request_line = match lines.next() {
        Some(line) => line?,
        None => return Err(RpcError::internal("No request received")),
    };
    if request_line.trim().is_empty() {
        return Err(RpcError::internal("Empty request line"));
    }

    let request = RpcRequest::parse(&request_line)?;
    if request.method != mode.expected_method() {
        return Err(RpcError::method_not_found(&request.method));
    }
    let params = request.params;

    match mode {
        Mode::Pivot => {
            let config: PivotConfig = decode_config(&params.config)?;
            config.validate()?;
            let ctx = FormatContext::for_lang(params.lang.as_deref().unwrap_or("en"))
                .with_blank_text(params.blank_text.as_deref());
            let records = read_records(lines)?;
            handle_pivot(&records, &config, &ctx, output)
        }
        Mode::Join => {
            let config: RelationConfig = decode_config(&params.config)?;
            let parent_dataset = config.validate()?.to_string();
            let records = read_records(lines)?;
            handle_join(records, &config, &parent_dataset, output)
        }
        Mode::Kpi => {
            let config: KpiConfig = decode_config(&params.config)?;
            validate_kpi(&config)?;
            let records = read_records(lines)?;
            handle_kpi(&records, &config, output)
        }
    }
}

/// Decodes the mode configuration. An absent config decodes like `{}` so that
/// the mode's own validation reports what is missing.
fn decode_config<T: DeserializeOwned>(config: &Value) -> Result<T, RpcError> {
    let config = if config.is_null() { json!({}) } else { config.clone() };
    Ok(serde_json::from_value(config)?)
}

/// Reads the NDJSON record lines that follow the request.
fn read_records<R: BufRead>(lines: Lines<R>) -> Result<Vec<Record>, RpcError> {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (index, line) in lines.enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        // Line 1 is the request.
        let line_number = index + 2;
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Object(record)) => records.push(record),
            Ok(_) => {
                skipped += 1;
                log_warn!("INPUT", "Skipping line {}: not a JSON object", line_number);
            }
            Err(e) => {
                skipped += 1;
                log_warn!("INPUT", "Skipping line {}: {}", line_number, e);
            }
        }
    }
    log_info!("INPUT", "Read {} records ({} skipped)", records.len(), skipped);
    Ok(records)
}

fn handle_pivot<W: Write>(
    records: &[Record],
    config: &PivotConfig,
    ctx: &FormatContext,
    output: &mut W,
) -> Result<(), RpcError> {
    let result = build_pivot(records, config, ctx)?;
    log_debug!("PIVOT", "{} rows, {} column headers", result.row_count(), result.column_headers.len());
    write_line(
        output,
        &success(json!({"status": "success", "rowCount": result.row_count()})),
    )?;
    write_line(output, &result)
}

fn handle_join<W: Write>(
    records: Vec<Record>,
    config: &RelationConfig,
    parent_dataset: &str,
    output: &mut W,
) -> Result<(), RpcError> {
    let mut datasets = Datasets::from_records(records, parent_dataset);
    for (name, count) in datasets.summary() {
        log_debug!("JOIN", "dataset {}: {} records", name, count);
    }
    let parents = run_join(config, &mut datasets)?;
    write_line(output, &success(json!("ok")))?;
    for parent in &parents {
        write_line(output, parent)?;
    }
    log_info!("JOIN", "Wrote {} parent records", parents.len());
    Ok(())
}

fn handle_kpi<W: Write>(records: &[Record], config: &KpiConfig, output: &mut W) -> Result<(), RpcError> {
    let result = compute_kpi(records, config)?;
    if let Some(ref message) = result.error {
        log_warn!("KPI", "{}", message);
    }
    write_line(output, &success(json!("ok")))?;
    write_line(output, &result)
}
