//! Command-line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use streamcall_client::engine::{LogLineFilter, ServiceLogsRequest};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// streamcall - follow engine log streams over WebSocket
#[derive(Parser, Debug)]
#[command(
    name = "streamcall",
    version,
    about = "Follow engine log streams over WebSocket",
    long_about = "Opens one WebSocket per command and prints every item the engine pushes.\n\
                  Ctrl-C or --timeout ends the stream cleanly."
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Engine API address, e.g. http://localhost:9779
    #[arg(short, long, env = "STREAMCALL_URL", global = true)]
    pub url: Option<String>,

    /// Enable verbose logging (-v, -vv, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Stop streaming after this many seconds
    #[arg(short, long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip frames that fail to decode instead of stopping
    #[arg(long, global = true)]
    pub skip_malformed: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream logs of several services in an enclave
    EnclaveLogs {
        /// Enclave name or UUID
        enclave: String,

        /// Service UUID to include (repeatable)
        #[arg(short, long = "service", required = true)]
        services: Vec<String>,

        #[command(flatten)]
        logs: LogArgs,
    },

    /// Stream logs of a single service
    ServiceLogs {
        /// Enclave name or UUID
        enclave: String,

        /// Service name or UUID
        service: String,

        #[command(flatten)]
        logs: LogArgs,
    },

    /// Stream the output of an asynchronous Starlark run
    StarlarkLogs {
        /// Execution UUID returned when the run was started
        execution_uuid: String,
    },
}

/// Options shared by the service log commands
#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Keep streaming new lines
    #[arg(short = 'F', long)]
    pub follow: bool,

    /// Send the full history
    #[arg(short, long, conflicts_with = "lines")]
    pub all: bool,

    /// Number of historical lines to send
    #[arg(short = 'n', long)]
    pub lines: Option<u32>,

    /// Keep lines containing TEXT (repeatable)
    #[arg(long = "match", value_name = "TEXT")]
    pub contains: Vec<String>,

    /// Drop lines containing TEXT (repeatable)
    #[arg(long = "exclude", value_name = "TEXT")]
    pub excludes: Vec<String>,

    /// Keep lines matching REGEX (repeatable)
    #[arg(long = "regex", value_name = "REGEX")]
    pub regexes: Vec<String>,

    /// Drop lines matching REGEX (repeatable)
    #[arg(long = "exclude-regex", value_name = "REGEX")]
    pub exclude_regexes: Vec<String>,
}

impl LogArgs {
    /// Build the request for `services`.
    pub fn to_request(&self, services: &[String]) -> ServiceLogsRequest {
        let mut request = ServiceLogsRequest::new(services.iter().cloned());
        if self.follow {
            request = request.with_follow_logs(true);
        }
        if self.all {
            request = request.with_return_all_logs(true);
        }
        if let Some(lines) = self.lines {
            request = request.with_num_log_lines(lines);
        }

        let filters = self
            .contains
            .iter()
            .map(LogLineFilter::contains)
            .chain(self.excludes.iter().map(LogLineFilter::not_contains))
            .chain(self.regexes.iter().map(LogLineFilter::matches))
            .chain(self.exclude_regexes.iter().map(LogLineFilter::not_matches));
        for filter in filters {
            request = request.with_filter(filter);
        }
        request
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// One line per log line, prefixed with the service
    #[default]
    Human,
    /// One JSON document per stream item
    Json,
}

impl Cli {
    /// Install the tracing subscriber. `RUST_LOG` overrides the flags.
    pub fn init_tracing(&self) {
        let level = if self.quiet {
            LevelFilter::ERROR
        } else {
            match self.verbose {
                0 => LevelFilter::WARN,
                1 => LevelFilter::INFO,
                2 => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            }
        };

        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
