//! FILENAME: app/src/main.rs
// PURPOSE: Process entry point. One request per invocation, read from stdin.
// FORMAT: seq|level|category|message (logs, on stderr and the optional log file)

use std::io;
use std::process::ExitCode;

use clap::Parser;
use rollup_rpc::{init_log_file, init_logging, log_info, log_warn, run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.log_level.to_filter());
    if let Some(ref path) = cli.log_file {
        match init_log_file(path) {
            Ok(()) => log_info!("SYS", "Logging to {}", path.display()),
            Err(e) => log_warn!("SYS", "{}; logging to stderr only", e),
        }
    }
    log_info!(
        "SYS",
        "rollup-rpc {} starting at {}",
        cli.mode,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    match run(cli.mode, stdin.lock(), &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::from(1),
    }
}
