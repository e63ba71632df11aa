mod cli;

use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use vigil_poll::{PollClient, PollOptions, SearchRequest, TransportConfig};

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    // .env values must land in the process environment before clap reads it.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let query: serde_json::Value = serde_json::from_str(&read_query(&args)?)
        .context("query is not valid JSON")?;

    let mut config = TransportConfig::new(&args.url);
    if let Some(username) = &args.username {
        config = config.with_basic_auth(username.clone(), args.password.clone().unwrap_or_default());
    }
    if args.insecure {
        config = config.with_insecure_tls();
    }

    let client = PollClient::http(config).context("failed to build search transport")?;
    let mut request = SearchRequest::new(&args.target).with_query(query);

    // Ctrl-C cancels the poll instead of killing the process mid-request.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let options = PollOptions::new()
        .timeout(Duration::from_secs(args.timeout))
        .cancellation(cancel);

    info!(target = %args.target, min_hits = args.min_hits, "Waiting for documents");

    match client.poll_min_hits(&mut request, args.min_hits, options).await {
        Ok(result) => {
            println!(
                "{}",
                serde_json::to_string(&result).context("failed to encode search result")?,
            );
            Ok(())
        }
        Err(err) => {
            match err.last_result() {
                Some(last) => error!(last = %last, "Polling failed"),
                None => error!("Polling failed"),
            }
            Err(err.into())
        }
    }
}

/// The query comes from `--query` or, when that is absent or blank, stdin.
fn read_query(args: &CliArgs) -> Result<String> {
    if let Some(query) = &args.query {
        let trimmed = query.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read query from stdin")?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        bail!("no query given: pass --query or pipe one on stdin");
    }
    Ok(trimmed.to_string())
}
