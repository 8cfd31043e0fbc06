// crates/checkout-capture-cli/src/main.rs
// ============================================================================
// Module: Checkout Capture CLI Entry Point
// Description: Command dispatcher for the checkout capture service.
// Purpose: Run the capture server and perform offline export and purge.
// Dependencies: clap, checkout-capture-config, checkout-capture-core,
//               checkout-capture-server, tokio
// ============================================================================

//! ## Overview
//! The CLI wraps the capture service for operators: `serve` runs the HTTP
//! capture surface, `export` writes the consolidated spreadsheet straight
//! from the store without going through HTTP, `purge` deletes all capture
//! records after an explicit confirmation flag, and `token` derives the
//! admin export token from the configured export secret.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use checkout_capture_config::CaptureConfig;
use checkout_capture_core::CaptureStore;
use checkout_capture_export::ExportError;
use checkout_capture_export::export_records;
use checkout_capture_server::ADMIN_SESSION_KEY;
use checkout_capture_server::CaptureServer;
use checkout_capture_server::TokenKeys;
use checkout_capture_server::TokenScope;
use checkout_capture_server::build_capture_store;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Checkout capture command line interface.
#[derive(Parser, Debug)]
#[command(name = "checkout-capture", version, about = "Checkout field capture service")]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP capture server.
    Serve {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Export the consolidated spreadsheet from the store.
    Export {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output path (defaults to the configured export filename).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Delete all capture records from the store.
    Purge {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Confirm the irreversible purge.
        #[arg(long)]
        yes: bool,
    },
    /// Print the admin token for the export and purge endpoints.
    Token {
        /// Path to the configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI errors surfaced to the operator.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration loading failed.
    #[error("{0}")]
    Config(String),
    /// Store access failed.
    #[error("{0}")]
    Store(String),
    /// Export failed.
    #[error("{0}")]
    Export(String),
    /// Output writing failed.
    #[error("{0}")]
    Output(String),
    /// The operator declined or omitted a required confirmation.
    #[error("{0}")]
    Refused(String),
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            config,
        } => run_serve(config).await,
        Commands::Export {
            config,
            output,
        } => run_export(config, output),
        Commands::Purge {
            config,
            yes,
        } => run_purge(config, yes),
        Commands::Token {
            config,
        } => run_token(config),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the HTTP capture server until it exits.
async fn run_serve(config_path: Option<PathBuf>) -> Result<ExitCode, CliError> {
    let config = load_config(config_path)?;
    let server =
        CaptureServer::from_config(config).map_err(|err| CliError::Config(err.to_string()))?;
    server.serve().await.map_err(|err| CliError::Store(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

/// Exports the consolidated spreadsheet to a local file.
fn run_export(
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<ExitCode, CliError> {
    let config = load_config(config_path)?;
    let store = build_capture_store(&config).map_err(|err| CliError::Store(err.to_string()))?;
    let records = store.load_all().map_err(|err| CliError::Store(err.to_string()))?;
    let artifact = export_records(&records, &config.export.worksheet, &config.export.filename)
        .map_err(|err| match err {
            ExportError::NoData => CliError::Export("no capture data to export".to_string()),
            other => CliError::Export(other.to_string()),
        })?;
    let path = output.unwrap_or_else(|| PathBuf::from(&artifact.filename));
    fs::write(&path, &artifact.bytes).map_err(|err| CliError::Output(err.to_string()))?;
    write_stdout_line(&format!("wrote {} ({} bytes)", path.display(), artifact.bytes.len()))
        .map_err(|err| CliError::Output(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

/// Purges all capture records after explicit confirmation.
fn run_purge(config_path: Option<PathBuf>, yes: bool) -> Result<ExitCode, CliError> {
    if !yes {
        return Err(CliError::Refused("purge is irreversible; pass --yes to confirm".to_string()));
    }
    let config = load_config(config_path)?;
    let store = build_capture_store(&config).map_err(|err| CliError::Store(err.to_string()))?;
    let purged = store.purge().map_err(|err| CliError::Store(err.to_string()))?;
    write_stdout_line(&format!("purged {purged} capture records"))
        .map_err(|err| CliError::Output(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the admin export token derived from the configured secret.
fn run_token(config_path: Option<PathBuf>) -> Result<ExitCode, CliError> {
    let config = load_config(config_path)?;
    write_stdout_line(&export_admin_token(&config))
        .map_err(|err| CliError::Output(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Derives the export-scope admin token used by the export and purge
/// endpoints.
fn export_admin_token(config: &CaptureConfig) -> String {
    TokenKeys::from_config(&config.server.auth).derive(TokenScope::Export, ADMIN_SESSION_KEY)
}

/// Loads and validates the configuration file.
fn load_config(path: Option<PathBuf>) -> Result<CaptureConfig, CliError> {
    CaptureConfig::load(path.as_deref()).map_err(|err| CliError::Config(err.to_string()))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================
