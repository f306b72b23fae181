//! Lacework adapter CLI entry point.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::error;

use lacework_adapter::adapters::lacework::{LaceworkClient, LaceworkClientConfig};
use lacework_adapter::adapters::state::FileCursorStore;
use lacework_adapter::cli::{output, output_error, Cli, CommandDispatcher};
use lacework_adapter::domain::errors::AdapterError;
use lacework_adapter::infrastructure::config::ConfigLoader;
use lacework_adapter::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "command failed");
            let err = match err.downcast::<AdapterError>() {
                Ok(adapter) => adapter,
                Err(other) => AdapterError::Config(format!("{other:#}")),
            };
            output_error(&err, cli.human);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode> {
    let mut config = ConfigLoader::load(cli.config.as_deref())?;
    let _logger = LoggerImpl::init(&config.logging)?;

    if let Some(ref state_file) = cli.state_file {
        config.fetch.state_file = state_file.clone();
    }
    let args = read_args(cli.args.as_deref(), cli.args_file.as_deref()).await?;

    let client = LaceworkClient::connect(LaceworkClientConfig::from(&config.api)).await?;
    let store = FileCursorStore::new(config.fetch.state_file.clone());
    let dispatcher = CommandDispatcher::new(Arc::new(client), Arc::new(store), &config)?;

    let outcome = dispatcher.dispatch(&cli.command, args).await?;
    output(&outcome, cli.human);

    Ok(if outcome.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn read_args(inline: Option<&str>, file: Option<&Path>) -> Result<Value> {
    let raw = match (inline, file) {
        (Some(raw), _) => raw.to_string(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read arguments from {}", path.display()))?,
        (None, None) => return Ok(Value::Null),
    };

    serde_json::from_str(&raw)
        .map_err(|e| AdapterError::InvalidArgument(format!("arguments are not valid JSON: {e}")))
        .map_err(Into::into)
}
