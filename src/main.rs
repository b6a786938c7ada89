use avtools::ingest;
use avtools::store::{self, ObjectStore, S3Store, StoreError};
use avtools::tools::{OutputDelivery, ToolContext, ToolExecutor};
use avtools::upstream::{AlphaVantageClient, Entitlement};
use chrono::Utc;
use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

fn setup_logging(level: &str) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("avtools")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("avtools.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Tools => handle_tools_command(),
        Commands::Schema { tool } => handle_schema_command(tool),
        Commands::Call {
            tool,
            params,
            param,
            entitlement,
        } => handle_call_command(tool, params.as_deref(), param, *entitlement, config).await,
        Commands::Probe => handle_probe_command(config).await,
        Commands::Ingest { file, marker } => handle_ingest_command(file, marker.as_deref(), config).await,
    }
}

fn handle_tools_command() -> Result<()> {
    let executor = ToolExecutor::standard();
    for def in executor.definitions() {
        println!("{:<16} {}", def.name.green(), def.description);
    }
    Ok(())
}

fn handle_schema_command(tool: &str) -> Result<()> {
    let executor = ToolExecutor::standard();
    let def = executor
        .definition(tool)
        .ok_or_else(|| eyre!("Unknown tool: {} (run `avtools tools` to list them)", tool))?;
    let rendered = serde_json::to_string_pretty(&def.input_schema).context("Failed to render schema")?;
    println!("{}", rendered);
    Ok(())
}

/// Object store from config, or None when it is not configured
async fn connect_store(config: &Config) -> Result<Option<S3Store>> {
    match config.storage.settings() {
        Ok(settings) => Ok(Some(S3Store::connect(&settings).await)),
        Err(StoreError::NotConfigured(missing)) => {
            info!("Object store not configured (missing {})", missing.join(", "));
            Ok(None)
        }
        Err(e) => Err(e).context("Invalid object store settings"),
    }
}

async fn handle_call_command(
    tool: &str,
    params: Option<&str>,
    pairs: &[String],
    entitlement: Option<Entitlement>,
    config: &Config,
) -> Result<()> {
    let executor = ToolExecutor::standard();
    if !executor.has_tool(tool) {
        return Err(eyre!("Unknown tool: {} (run `avtools tools` to list them)", tool));
    }
    let input = cli::build_params(params, pairs).map_err(|e| eyre!(e))?;

    let client_config = config.api.client_config();
    let api = match &config.api.api_key {
        Some(key) => AlphaVantageClient::with_api_key(key.clone(), client_config),
        None => AlphaVantageClient::new(client_config),
    }
    .context("Failed to create API client")?;

    let store = connect_store(config).await?.map(|s| Arc::new(s) as Arc<dyn ObjectStore>);
    let delivery = OutputDelivery::new(store).with_max_inline_bytes(config.output.max_inline_bytes);

    let ctx = ToolContext {
        api: &api,
        delivery: &delivery,
        entitlement: entitlement.or(config.api.entitlement),
    };
    info!("Calling tool {} with entitlement {:?}", tool, ctx.entitlement);

    let output = executor.execute(tool, &input, &ctx).await;
    println!("{}", output);
    Ok(())
}

async fn handle_probe_command(config: &Config) -> Result<()> {
    let result = store::probe(config.storage.settings()).await;
    if result.success {
        println!("{} {}", "OK:".green(), result.message);
    } else {
        println!("{} {}", "FAILED:".red(), result.message);
    }
    let details = serde_json::to_string_pretty(&result.details).context("Failed to render probe details")?;
    println!("{}", details);

    if !result.success {
        return Err(eyre!("Object store probe failed"));
    }
    Ok(())
}

async fn handle_ingest_command(file: &Path, marker: Option<&str>, config: &Config) -> Result<()> {
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let event: serde_json::Value = serde_json::from_str(&content).context("Event file is not valid JSON")?;

    let store = connect_store(config)
        .await?
        .ok_or_else(|| eyre!("Object store is required for ingestion; set R2_* or the storage config section"))?;
    let marker = marker.unwrap_or(&config.ingest.marker);

    let outcome = ingest::ingest_log_event(&event, &store, marker, Utc::now())
        .await
        .context("Log ingestion failed")?;
    match &outcome.key {
        Some(key) => println!("{} {} usage lines -> {}", "Stored:".green(), outcome.lines, key),
        None => println!("{}", "No usage lines found".yellow()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Setup logging at the configured level; --verbose raises it to debug
    let level = if cli.is_verbose() {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("info")
    };
    setup_logging(level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
