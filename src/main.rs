//! Scrybe Collector CLI
//!
//! Runs a headless collection cycle and exposes the consent, session and
//! signing helpers for gateway integrators.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use scrybe_collector::{
    config::Config,
    consent::ConsentManager,
    host::{Capabilities, HeadlessHost, HostEnvironment},
    orchestrator::{InitOutcome, Orchestrator},
    session::SessionIdentity,
    signer::{generate_nonce, SignedEnvelope},
    storage::{FileStorage, ScopedStorage},
    PRIVACY_DECLARATION, VERSION,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scrybe-collect")]
#[command(author = "Scrybe")]
#[command(version = VERSION)]
#[command(about = "Consent-gated signal collection with signed submission", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one collection cycle against this process and submit it
    Collect {
        /// Observe interaction for this many seconds before submitting
        #[arg(long, default_value = "0")]
        window: u64,

        /// Verbose logging
        #[arg(long)]
        debug: bool,
    },

    /// Show or change the stored consent decision
    Consent {
        #[command(subcommand)]
        action: ConsentAction,
    },

    /// Print the stored session identifier
    Session {
        /// Discard the stored identifier and create a new one
        #[arg(long)]
        reset: bool,
    },

    /// Print the authentication headers for a request body
    Sign {
        /// Shared API key
        #[arg(long)]
        key: String,

        /// Exact request body
        #[arg(long)]
        body: String,

        /// Timestamp in milliseconds (default: now)
        #[arg(long)]
        timestamp: Option<i64>,

        /// Nonce (default: fresh)
        #[arg(long)]
        nonce: Option<String>,
    },

    /// Show configuration
    Config,

    /// Display privacy declaration
    Privacy,
}

#[derive(Subcommand)]
enum ConsentAction {
    Grant,
    Revoke,
    Status,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Collect { window, debug } => cmd_collect(window, debug),
        Commands::Consent { action } => cmd_consent(action),
        Commands::Session { reset } => cmd_session(reset),
        Commands::Sign {
            key,
            body,
            timestamp,
            nonce,
        } => cmd_sign(&key, body, timestamp, nonce),
        Commands::Config => cmd_config(),
        Commands::Privacy => {
            cmd_privacy();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn file_storage() -> Arc<dyn ScopedStorage> {
    Arc::new(FileStorage::new(FileStorage::default_path()))
}

fn cmd_collect(window: u64, debug: bool) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    config.debug |= debug;
    init_tracing(config.debug);
    config.validate()?;

    println!("Scrybe Collector v{VERSION}");
    println!();

    let capabilities = Capabilities::new(Arc::new(HeadlessHost::new()), file_storage());
    let orchestrator = Arc::new(Orchestrator::new(config, capabilities)?);

    // Ctrl+C behaves like a page unload
    let handle = Arc::clone(&orchestrator);
    ctrlc::set_handler(move || handle.unload()).context("Error setting Ctrl+C handler")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create runtime")?;

    let outcome = runtime.block_on(async {
        if window > 0 && orchestrator.observe() {
            println!("Observing for {window}s (Ctrl+C to abort)...");
            let unload = orchestrator.unload_signal();
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(window)) => {}
                _ = unload.fired() => {}
            }
        }
        orchestrator.init().await
    })?;

    println!("Session: {}", orchestrator.session_id());
    match outcome {
        InitOutcome::Submitted(receipt) => {
            println!("Submitted ✓");
            println!("  Gateway session: {}", receipt.session_id);
            println!("  New session: {}", receipt.is_new);
            println!("  Timestamp: {}", receipt.timestamp);
        }
        InitOutcome::Suppressed(reason) => {
            println!("Collection suppressed ({reason:?}). Nothing was collected.");
            println!("Run 'scrybe-collect consent grant' to allow collection.");
        }
        InitOutcome::AlreadyRunning => println!("A collection cycle is already running."),
        InitOutcome::Aborted => println!("Submission aborted."),
    }
    Ok(())
}

fn cmd_consent(action: ConsentAction) -> Result<()> {
    let host = HeadlessHost::new();
    let mut manager = ConsentManager::new(None, file_storage(), Some(host.time_zone()));

    match action {
        ConsentAction::Grant => {
            manager.set_consent(true);
            println!("Consent granted.");
        }
        ConsentAction::Revoke => {
            manager.set_consent(false);
            println!("Consent revoked. No further data will be collected.");
        }
        ConsentAction::Status => {
            let stored = ConsentManager::read_stored(file_storage().as_ref());
            println!("Consent Status");
            println!("==============");
            println!();
            println!("  Stored decision: {stored}");
            println!("  Effective state: {}", manager.state());
            println!(
                "  Explicit consent region: {}",
                if manager.requires_explicit_consent() {
                    "yes (EU/EEA time zone)"
                } else {
                    "no"
                }
            );
            println!("  Do-Not-Track: {}", host.do_not_track());
        }
    }
    Ok(())
}

fn cmd_session(reset: bool) -> Result<()> {
    let session = SessionIdentity::new(file_storage());
    if reset {
        session.reset();
        println!("Session identifier discarded.");
    }
    println!("{}", session.get_or_create());
    Ok(())
}

fn cmd_sign(key: &str, body: String, timestamp: Option<i64>, nonce: Option<String>) -> Result<()> {
    let timestamp_ms = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
    let nonce = nonce.unwrap_or_else(generate_nonce);
    let signature = scrybe_collector::signer::sign(&body, timestamp_ms, &nonce, key.as_bytes())?;

    let envelope = SignedEnvelope {
        body,
        timestamp_ms,
        nonce,
        signature,
    };
    for (name, value) in envelope.headers() {
        println!("{name}: {value}");
    }
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!("Storage file: {:?}", FileStorage::default_path());
    println!();

    let mut value = serde_json::to_value(&config)?;
    if let Some(key) = value.get_mut("apiKey") {
        if !config.api_key.is_empty() {
            *key = serde_json::Value::String("<redacted>".to_string());
        }
    }
    println!("{}", serde_json::to_string_pretty(&value)?);

    if let Err(e) = config.validate() {
        println!();
        println!("Warning: {e}");
    }
    Ok(())
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}
