//! lightbucket - report finished light frames to Lightbucket
//!
//! This tool provides commands for:
//! - Storing API credentials (the key is encrypted at rest)
//! - Switching reporting on and off
//! - Checking configuration status
//! - Relaying host events from stdin or a file into the reporting pipeline
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/lightbucket/config.toml (~/.config/lightbucket/config.toml)
//! - Key: $XDG_DATA_HOME/lightbucket/credential.key (~/.local/share/lightbucket/credential.key)
//! - Logs: $XDG_STATE_HOME/lightbucket/ (~/.local/state/lightbucket/)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lightbucket_core::capture::HostEvent;
use lightbucket_core::delivery::{DeliveryClient, Notifier};
use lightbucket_core::pipeline::{CaptureTrigger, CaptureWatcher, Dispatch, Reporter};
use lightbucket_core::settings::ConfigStore;
use lightbucket_core::Config;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

#[derive(Parser)]
#[command(name = "lightbucket")]
#[command(about = "Report finished light frames to Lightbucket")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show reporting configuration and status
    Status,

    /// Store Lightbucket API credentials
    SetCredentials {
        /// Lightbucket username
        #[arg(short, long)]
        username: String,

        /// API key from the Lightbucket credentials page
        #[arg(short = 'k', long)]
        api_key: String,
    },

    /// Turn reporting on
    Enable,

    /// Turn reporting off
    Disable,

    /// Read newline-delimited JSON host events and report them
    Relay {
        /// Read events from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Prints notifications for the person at the terminal
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn warning(&self, message: &str) {
        eprintln!("warning: {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("error: {}", message);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;
    let _log_guard =
        lightbucket_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let store = ConfigStore::open_default().context("failed to open configuration store")?;

    match args.command {
        Command::Status => cmd_status(&store),
        Command::SetCredentials { username, api_key } => {
            cmd_set_credentials(&store, &username, &api_key)
        }
        Command::Enable => cmd_set_enabled(&store, true),
        Command::Disable => cmd_set_enabled(&store, false),
        Command::Relay { input } => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(cmd_relay(&store, input))
        }
    }
}

fn cmd_status(store: &ConfigStore) -> Result<()> {
    let config = store.load_config().context("failed to read configuration")?;
    let session = store.settings().snapshot();
    let lightbucket = &config.lightbucket;

    println!("Lightbucket Reporting");
    println!("=====================");
    println!();
    println!("Enabled:         {}", session.enabled);
    println!(
        "Username:        {}",
        if session.username.is_empty() {
            "<not set>"
        } else {
            session.username.as_str()
        }
    );
    println!(
        "API Key:         {}",
        if session.api_key.is_empty() {
            "<not set>"
        } else {
            "<set>"
        }
    );
    println!("Base URL:        {}", session.base_url);
    println!("Credentials:     {}", lightbucket.api_credentials_url());
    println!();
    println!("Config file:     {}", store.path().display());
    println!("Key file:        {}", Config::key_path().display());
    println!("Log directory:   {}", Config::state_dir().display());
    println!(
        "Today's log:     {}",
        lightbucket_core::logging::log_file_path().display()
    );

    println!();
    if session.is_ready() {
        println!("Status: Ready to report");
    } else if session.api_key.is_empty() && !lightbucket.api_key.is_empty() {
        println!("Status: Not ready (stored API key cannot be decrypted)");
        println!();
        println!("Store it again with:");
        println!();
        println!("  lightbucket set-credentials --username <name> --api-key <key>");
    } else if !session.has_credentials() {
        println!("Status: Not ready (credentials missing)");
        println!();
        println!("Generate an API key at {}", lightbucket.api_credentials_url());
        println!("then run:");
        println!();
        println!("  lightbucket set-credentials --username <name> --api-key <key>");
    } else {
        println!("Status: Disabled (run 'lightbucket enable')");
    }

    if let Err(e) = lightbucket.validate() {
        println!();
        println!("Problem: {}", e);
    }

    Ok(())
}

fn cmd_set_credentials(store: &ConfigStore, username: &str, api_key: &str) -> Result<()> {
    store
        .set_credentials(username, api_key)
        .context("failed to store credentials")?;

    let session = store.settings().snapshot();
    println!("Credentials saved for {}", session.username);
    if !session.enabled {
        println!("Reporting is disabled. Run 'lightbucket enable' to start reporting.");
    }
    Ok(())
}

fn cmd_set_enabled(store: &ConfigStore, enabled: bool) -> Result<()> {
    store
        .set_enabled(enabled)
        .context("failed to update configuration")?;

    let session = store.settings().snapshot();
    if enabled {
        println!("Reporting enabled");
        if !session.has_credentials() {
            println!("No credentials stored yet; nothing will be reported until they are set.");
        }
    } else {
        println!("Reporting disabled");
    }
    Ok(())
}

async fn cmd_relay(store: &ConfigStore, input: Option<PathBuf>) -> Result<()> {
    if let Err(e) = store.load_config()?.lightbucket.validate() {
        tracing::warn!(error = %e, "Reporting is misconfigured");
    }

    // Hot reload is a convenience; relaying still works without it.
    let _config_watch = match store.watch() {
        Ok(watch) => Some(watch),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload unavailable");
            None
        }
    };

    let client = DeliveryClient::new(Arc::new(ConsoleNotifier))
        .context("failed to create HTTP client")?;
    let reporter = Reporter::new(store.settings(), client);
    let watcher = CaptureWatcher::new(reporter.clone());
    let mut trigger = CaptureTrigger::new(reporter);

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &input {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut read_error = None;

    let mut in_flight: Vec<Dispatch> = Vec::new();
    let mut tally = Tally::default();
    let mut events = 0usize;
    let mut skipped = 0usize;
    let mut line_number = 0usize;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                // Stop reading but still let accepted reports finish.
                read_error = Some(e);
                break;
            }
        }
        line_number += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "Skipping non-UTF-8 line");
                skipped += 1;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let event = match HostEvent::from_json(line) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = line_number, error = %e, "Skipping malformed event");
                skipped += 1;
                continue;
            }
        };
        events += 1;

        let dispatch = match event {
            HostEvent::ImageSaved(event) => watcher.on_image_saved(*event),
            HostEvent::StepCompleted(step) => {
                if trigger.should_trigger_after(&step.sequence, step.previous, step.next) {
                    trigger.execute(&step.sequence, &step.equipment)
                } else {
                    None
                }
            }
        };

        in_flight.extend(dispatch);

        let (done, pending): (Vec<_>, Vec<_>) =
            in_flight.drain(..).partition(|handle| handle.is_finished());
        in_flight = pending;
        for handle in done {
            tally.record(handle).await;
        }
    }

    for handle in in_flight {
        tally.record(handle).await;
    }

    tracing::info!(
        events,
        skipped,
        reported = tally.reported,
        failed = tally.failed,
        "Relay finished"
    );
    println!(
        "Relayed {} events ({} skipped): {} reported, {} failed",
        events, skipped, tally.reported, tally.failed
    );

    match read_error {
        Some(e) => Err(anyhow::Error::new(e).context("failed to read input")),
        None => Ok(()),
    }
}

/// Delivery results across a relay run
#[derive(Default)]
struct Tally {
    reported: usize,
    failed: usize,
}

impl Tally {
    async fn record(&mut self, handle: Dispatch) {
        match handle.await {
            Ok(Some(outcome)) if outcome.is_success() => self.reported += 1,
            Ok(_) => self.failed += 1,
            Err(e) => {
                tracing::error!(error = %e, "Report task failed");
                self.failed += 1;
            }
        }
    }
}
