//! Command implementations

use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use streamcall_client::engine::LogFrame;
use streamcall_client::{
    CancellationToken, ClientConfig, DecodePolicy, ResponseStream, StreamClient,
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cli::{Cli, Command};
use crate::error::{CliError, CliResult};
use crate::output::Printer;

/// Run the parsed command, writing items to `out`.
pub async fn execute<W: Write>(cli: &Cli, out: W) -> CliResult<()> {
    let client = client_for(cli)?;
    let token = CancellationToken::new();
    let watchers = spawn_watchers(&token, cli.timeout);
    let mut printer = Printer::new(cli.format, out);

    let result = match &cli.command {
        Command::EnclaveLogs {
            enclave,
            services,
            logs,
        } => {
            let request = logs.to_request(services);
            let stream = client.enclave_logs(enclave, &request, Some(token.clone()));
            drain(stream, &mut printer, |p, batch| p.service_logs(batch)).await
        }
        Command::ServiceLogs {
            enclave,
            service,
            logs,
        } => {
            let request = logs.to_request(&[]);
            let stream = client.service_logs(enclave, service, &request, Some(token.clone()));
            drain(stream, &mut printer, |p, batch| p.service_logs(batch)).await
        }
        Command::StarlarkLogs { execution_uuid } => {
            let stream = client.starlark_execution_logs(execution_uuid, Some(token.clone()));
            drain(stream, &mut printer, |p, line| p.starlark_line(line)).await
        }
    };

    for watcher in watchers {
        watcher.abort();
    }

    let items = result?;
    printer.flush()?;
    if token.is_cancelled() {
        info!("Stream stopped after {} items", items);
    } else {
        debug!("Stream ended after {} items", items);
    }
    Ok(())
}

/// Build the client from the global flags.
pub fn client_for(cli: &Cli) -> CliResult<StreamClient> {
    let url = cli.url.as_deref().ok_or_else(|| {
        CliError::InvalidArguments("no engine address; pass --url or set STREAMCALL_URL".into())
    })?;

    let mut config = ClientConfig::new(url);
    if cli.skip_malformed {
        config = config.with_decode_policy(DecodePolicy::Skip);
    }
    Ok(StreamClient::new(config)?)
}

/// Cancel `token` on Ctrl-C and, if set, after `timeout` seconds.
fn spawn_watchers(token: &CancellationToken, timeout: Option<u64>) -> Vec<JoinHandle<()>> {
    let mut watchers = Vec::with_capacity(2);

    let interrupt = token.clone();
    watchers.push(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, closing stream");
            interrupt.cancel();
        }
    }));

    if let Some(secs) = timeout {
        let deadline = token.clone();
        watchers.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!("Timeout of {}s reached, closing stream", secs);
            deadline.cancel();
        }));
    }

    watchers
}

/// Print every item of `stream` until it ends. Returns the number of data items.
async fn drain<T, W, F>(
    mut stream: ResponseStream<LogFrame<T>>,
    printer: &mut Printer<W>,
    mut emit: F,
) -> CliResult<u64>
where
    W: Write,
    F: FnMut(&mut Printer<W>, &T) -> CliResult<()>,
{
    let mut items = 0;
    while let Some(item) = stream.next().await {
        match item? {
            LogFrame::Data(data) => {
                emit(printer, &data)?;
                items += 1;
            }
            LogFrame::Info(info) => printer.info(&info)?,
        }
    }
    Ok(items)
}
