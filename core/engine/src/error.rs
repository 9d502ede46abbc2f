//! FILENAME: core/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    InvalidConfig(String),

    #[error("{0}")]
    NoData(String),

    #[error("Fields not found in data: {}. Available fields: {}", .missing.join(", "), available_list(.available, .truncated))]
    MissingFields {
        missing: Vec<String>,
        available: Vec<String>,
        truncated: bool,
    },

    #[error("Invalid field path: {0:?}")]
    InvalidFieldPath(String),

    #[error("Record nesting exceeds maximum depth of {depth}")]
    NestingTooDeep { depth: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// True for errors caused by the request configuration or its data
    /// (reported as invalid params), false for internal failures.
    pub fn is_invalid_params(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_)
                | EngineError::NoData(_)
                | EngineError::MissingFields { .. }
                | EngineError::InvalidFieldPath(_)
        )
    }
}

fn available_list(available: &[String], truncated: &bool) -> String {
    let mut list = available.join(", ");
    if *truncated {
        list.push_str("...");
    }
    list
}

pub type EngineResult<T> = Result<T, EngineError>;
