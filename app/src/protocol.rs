//! FILENAME: app/src/protocol.rs
// PURPOSE: JSON-RPC request/response envelopes and the transport error type.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use engine::EngineError;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

// ============================================================================
// REQUEST
// ============================================================================

/// First line of the input stream.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: RequestParams,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    /// Mode-specific configuration, decoded once the mode is known.
    #[serde(default)]
    pub config: Value,

    /// Label override for blank group values.
    #[serde(default)]
    pub blank_text: Option<String>,

    /// Language of the built-in labels (`en`, `pt_BR`).
    #[serde(default)]
    pub lang: Option<String>,
}

impl RpcRequest {
    pub fn parse(line: &str) -> Result<Self, RpcError> {
        serde_json::from_str(line).map_err(|e| RpcError::internal(format!("Invalid request: {}", e)))
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        RpcError {
            code,
            message: message.into(),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        RpcError::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        RpcError::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RpcError::new(INTERNAL_ERROR, message)
    }

    pub fn to_response(&self) -> Value {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "error": {"code": self.code, "message": self.message}
        })
    }
}

impl From<EngineError> for RpcError {
    fn from(err: EngineError) -> Self {
        if err.is_invalid_params() {
            RpcError::invalid_params(err.to_string())
        } else {
            RpcError::internal(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::invalid_params(format!("Invalid config: {}", err))
    }
}

impl From<io::Error> for RpcError {
    fn from(err: io::Error) -> Self {
        RpcError::internal(format!("I/O error: {}", err))
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// `{"jsonrpc":"2.0","result":...}`
pub fn success(result: Value) -> Value {
    json!({"jsonrpc": JSONRPC_VERSION, "result": result})
}

/// Writes one JSON document followed by a newline.
pub fn write_line<W: Write, T: Serialize + ?Sized>(output: &mut W, value: &T) -> Result<(), RpcError> {
    serde_json::to_writer(&mut *output, value).map_err(|e| RpcError::internal(e.to_string()))?;
    output.write_all(b"\n")?;
    Ok(())
}
