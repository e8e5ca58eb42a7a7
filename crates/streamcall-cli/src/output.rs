//! Output formatting for stream items

use std::io::Write;

use serde_json::json;
use streamcall_client::engine::{ResponseInfo, ServiceLogs, StarlarkRunResponseLine};

use crate::cli::OutputFormat;
use crate::error::CliResult;

/// Writes stream items to `out` in the selected format.
#[derive(Debug)]
pub struct Printer<W> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> Printer<W> {
    /// Create a printer
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    /// Print one batch of service logs
    pub fn service_logs(&mut self, logs: &ServiceLogs) -> CliResult<()> {
        match self.format {
            OutputFormat::Json => writeln!(self.out, "{}", serde_json::to_string(logs)?)?,
            OutputFormat::Human => {
                for (service, lines) in &logs.service_logs_by_service_uuid {
                    for line in &lines.line {
                        writeln!(self.out, "[{service}] {line}")?;
                    }
                }
                for service in &logs.not_found_service_uuid_set {
                    writeln!(self.out, "[{service}] no logs found")?;
                }
            }
        }
        Ok(())
    }

    /// Print one line of Starlark output
    pub fn starlark_line(&mut self, line: &StarlarkRunResponseLine) -> CliResult<()> {
        match self.format {
            OutputFormat::Json => writeln!(self.out, "{}", serde_json::to_string(line)?)?,
            OutputFormat::Human => writeln!(self.out, "{}", human_starlark(line))?,
        }
        Ok(())
    }

    /// Print a status message from the engine
    pub fn info(&mut self, info: &ResponseInfo) -> CliResult<()> {
        match self.format {
            OutputFormat::Json => {
                writeln!(self.out, "{}", json!({ "response_info": info }))?;
            }
            OutputFormat::Human => writeln!(self.out, "{info}")?,
        }
        Ok(())
    }

    /// Flush buffered output
    pub fn flush(&mut self) -> CliResult<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Consume the printer, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render a Starlark line compactly: a bare string for single-field
/// messages, the JSON document otherwise.
fn human_starlark(line: &StarlarkRunResponseLine) -> String {
    if let Some(object) = line.as_object()
        && object.len() == 1
        && let Some((kind, body)) = object.iter().next()
    {
        let text = body
            .get("message")
            .or_else(|| body.get("info"))
            .and_then(|v| v.as_str());
        if let Some(text) = text {
            return format!("{kind}: {text}");
        }
    }
    line.to_string()
}
