//! FILENAME: app/src/config.rs
// PURPOSE: Process configuration: command line arguments with environment fallbacks.

use std::fmt;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// What the process computes from its input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Hierarchical pivot tree with rollups.
    Pivot,
    /// Nested joins across tagged datasets.
    Join,
    /// One aggregate value over the whole stream.
    Kpi,
}

impl Mode {
    /// The request method this mode answers to.
    pub fn expected_method(&self) -> &'static str {
        match self {
            Mode::Pivot => "pivot",
            Mode::Join | Mode::Kpi => "aggregate",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Pivot => "pivot",
            Mode::Join => "join",
            Mode::Kpi => "kpi",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Reads one request line plus NDJSON records from stdin and writes the
/// response to stdout.
#[derive(Debug, Parser)]
#[command(name = "rollup-rpc", version, about = "Pivot, join and KPI aggregation over NDJSON records.")]
pub struct Cli {
    /// Computation to run.
    #[arg(value_enum)]
    pub mode: Mode,

    /// Log file, truncated at startup. Logs always go to stderr as well.
    #[arg(long, value_name = "PATH", env = "ROLLUP_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, value_name = "LEVEL", env = "ROLLUP_LOG_LEVEL", default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}
