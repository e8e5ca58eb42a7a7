//! Argument parsing and end-to-end command tests.

use clap::Parser;
use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use streamcall_cli::{Cli, CliError, Command, OutputFormat, commands};
use streamcall_client::engine::LogLineOperator;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

#[test]
fn test_parse_enclave_logs() {
    let cli = Cli::try_parse_from([
        "streamcall",
        "--url",
        "http://localhost:9779",
        "enclave-logs",
        "my-enclave",
        "-s",
        "a1",
        "--service",
        "b2",
        "-F",
        "-n",
        "20",
        "--match",
        "ERROR",
        "--exclude-regex",
        "^DEBUG",
    ])
    .unwrap();

    assert_eq!(cli.url.as_deref(), Some("http://localhost:9779"));
    match cli.command {
        Command::EnclaveLogs {
            enclave,
            services,
            logs,
        } => {
            assert_eq!(enclave, "my-enclave");
            assert_eq!(services, vec!["a1", "b2"]);

            let request = logs.to_request(&services);
            assert_eq!(request.follow_logs, Some(true));
            assert_eq!(request.num_log_lines, Some(20));
            assert_eq!(request.return_all_logs, None);
            let operators: Vec<_> = request
                .conjunctive_filters
                .iter()
                .map(|f| f.operator)
                .collect();
            assert_eq!(
                operators,
                vec![
                    LogLineOperator::DoesContainText,
                    LogLineOperator::DoesNotContainMatchRegex
                ]
            );
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_enclave_logs_requires_a_service() {
    assert!(Cli::try_parse_from(["streamcall", "enclave-logs", "my-enclave"]).is_err());
}

#[test]
fn test_all_conflicts_with_lines() {
    assert!(
        Cli::try_parse_from(["streamcall", "service-logs", "e", "s", "--all", "-n", "5"]).is_err()
    );
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "streamcall",
        "starlark-logs",
        "0f1e",
        "-vv",
        "--format",
        "json",
        "--timeout",
        "30",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.format, OutputFormat::Json);
    assert_eq!(cli.timeout, Some(30));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    assert!(Cli::try_parse_from(["streamcall", "-v", "--quiet", "starlark-logs", "x"]).is_err());
}

#[tokio::test]
async fn test_missing_url_is_reported() {
    let cli = Cli::try_parse_from(["streamcall", "starlark-logs", "x"]).unwrap();
    if cli.url.is_some() {
        // STREAMCALL_URL is set in the environment
        return;
    }
    let err = commands::execute(&cli, Vec::new()).await.unwrap_err();
    assert!(matches!(err, CliError::InvalidArguments(_)));
}

#[tokio::test]
async fn test_starlark_logs_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        for line in [
            r#"{"instruction_result":{"message":"Service 'api' added"}}"#,
            r#"{"run_finished_event":{"is_run_successful":true}}"#,
        ] {
            ws.send(Message::Text(line.into())).await.unwrap();
        }
        ws.close(None).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let url = format!("http://{addr}");
    let cli = Cli::try_parse_from(["streamcall", "--url", url.as_str(), "starlark-logs", "abc"])
        .unwrap();
    let mut out = Vec::new();
    commands::execute(&cli, &mut out).await.unwrap();

    let out = String::from_utf8(out).unwrap();
    assert_eq!(
        out,
        "instruction_result: Service 'api' added\n{\"run_finished_event\":{\"is_run_successful\":true}}\n"
    );
}
