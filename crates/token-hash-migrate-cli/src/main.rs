//! token-hash-migrate CLI - OAuth token hash column backfill.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use token_hash_migrate::engine::{connect, connection_metadata};
use token_hash_migrate::{
    Config, MigrateError, ProbeOutcome, Sha256TokenHasher, TokenBackfill, WriteMode,
};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "token-hash-migrate")]
#[command(about = "Add and backfill hash columns on an OAuth2 access token table")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the dialect and check for the hash columns
    Probe,

    /// Add missing hash columns and backfill plain text token hashes
    Run {
        /// Override backfill.page_size
        #[arg(long)]
        page_size: Option<usize>,

        /// Dry run: probe and report without changing the table
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Probe => {
            let backfill = TokenBackfill::new(&config, WriteMode::PlainTextHash, Sha256TokenHasher)?;
            let mut conn = connect(&config.database).await?;
            let metadata = connection_metadata(&conn, &config.database);
            let report = backfill.probe(&mut conn, &metadata).await;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                println!("Probe Results:");
                println!("  Driver: {}", metadata.driver_name);
                println!("  Product: {}", metadata.product_name);
                println!("  Dialect: {}", report.dialect.backend);
                println!("  Probe statement: {:?}", report.dialect.probe);
                println!("  Page binding: {:?}", report.dialect.page_binding);
                println!(
                    "  Hash columns present: {}",
                    if report.hash_columns_present { "yes" } else { "no" }
                );
                match &report.outcome {
                    ProbeOutcome::Present => {}
                    ProbeOutcome::Missing { column } => println!("    Missing: {}", column),
                    ProbeOutcome::Unavailable { reason } => {
                        println!("    Probe failed: {}", reason)
                    }
                }
            }
        }

        Commands::Run { page_size, dry_run } => {
            // Apply overrides
            if let Some(size) = page_size {
                config.backfill.page_size = size;
            }

            let backfill = TokenBackfill::new(&config, WriteMode::PlainTextHash, Sha256TokenHasher)?;
            let mut conn = connect(&config.database).await?;
            let metadata = connection_metadata(&conn, &config.database);

            let result = backfill.run(&mut conn, &metadata, dry_run).await?;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                let status_msg = if dry_run { "Dry run completed!" } else { "Backfill completed!" };
                println!("\n{}", status_msg);
                println!("  Run ID: {}", result.run_id);
                println!("  Dialect: {}", result.dialect.backend);
                println!(
                    "  Hash columns present: {}",
                    if result.initial_probe.is_present() { "yes" } else { "no" }
                );
                if !result.columns_added.is_empty() {
                    println!("  Columns added: {}", result.columns_added.join(", "));
                }
                println!("  Pages: {}", result.pages);
                println!("  Tokens: {}", result.tokens_updated);
                println!("  Duration: {:.2}s", result.duration_seconds);
                println!("  Throughput: {} tokens/sec", result.tokens_per_second);
            }
        }
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --output-json stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}', expected text or json", other)),
    }

    Ok(())
}
