//! # streamcall CLI
//!
//! Follow engine log streams from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! # Last 100 lines of two services, then keep following
//! streamcall --url http://localhost:9779 enclave-logs my-enclave -s 1a2b -s 3c4d -F -n 100
//!
//! # Errors only, as JSON, for one minute
//! STREAMCALL_URL=http://localhost:9779 streamcall -f json -t 60 \
//!   service-logs my-enclave api -F --match ERROR
//!
//! # Output of an asynchronous Starlark run
//! streamcall starlark-logs 0f1e2d3c
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

use clap::Parser;

pub use cli::{Cli, Command, LogArgs, OutputFormat};
pub use error::{CliError, CliResult};

/// Parse arguments, install logging and run the command
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    cli.init_tracing();
    commands::execute(&cli, std::io::stdout().lock()).await
}
