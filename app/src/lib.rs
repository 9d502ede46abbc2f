//! FILENAME: app/src/lib.rs
// PURPOSE: Library root of the rollup RPC process.
// CONTEXT: The binary parses arguments and installs logging; everything that
// touches the protocol lives here so tests can drive it over in-memory streams.

pub mod logging;
pub mod config;
pub mod protocol;
pub mod handlers;

pub use config::{Cli, LogLevel, Mode};
pub use handlers::run;
pub use logging::{init_log_file, init_logging, next_seq, write_log};
pub use protocol::{
    RequestParams, RpcError, RpcRequest, INTERNAL_ERROR, INVALID_PARAMS, JSONRPC_VERSION,
    METHOD_NOT_FOUND,
};
