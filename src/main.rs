//! Application entry point.
//!
//! Parses command-line arguments, installs the log subscriber and delegates
//! execution to [`runner::run`]. A failed run always writes its report to
//! stderr, whatever `KUMIKI_LOG` filters out.

use clap::Parser;
use kumiki::{cli::Cli, runner};
use kumiki_env::LOG_ENV;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    match runner::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "generation failed");
            if let Err(write_err) = writeln!(io::stderr().lock(), "{err:?}") {
                tracing::error!(error = %write_err, "cannot write the error report");
            }
            ExitCode::FAILURE
        }
    }
}
