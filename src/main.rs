// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use scale_recorder::config::{apply_env_overrides, load_config_with_env, ConfigLoader, LoggingConfig};
use scale_recorder::console::{describe_ingest, describe_record};
use scale_recorder::{BagId, CancellationToken, Console, RecorderConfig, ReweighOutcome, Station};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/default.yaml";

/// Scale Recorder - record serial scale readings into a batch ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Serial port (overrides config file)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides config file)
    #[arg(short, long)]
    baud_rate: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive operator menu (default)
    Menu,
    /// Ingest readings until the batch fills or '0' arrives on the line
    Ingest,
    /// Replace a bag's weight with the next reading
    Reweigh { bag_id: String },
    /// Show the ledger entry of a bag
    Show { bag_id: String },
    /// Export the ledger as a report
    Report,
}

fn load(args: &Args) -> Result<RecorderConfig> {
    let mut config = if args.config.exists() {
        load_config_with_env(&args.config)?
    } else if args.config == Path::new(DEFAULT_CONFIG) {
        let mut config = RecorderConfig::default();
        apply_env_overrides(&mut config)?;
        config
    } else {
        bail!("Config file not found: {}", args.config.display());
    };

    // Apply CLI overrides
    if let Some(port) = &args.port {
        config.serial.port = port.clone();
    }
    if let Some(baud_rate) = args.baud_rate {
        config.serial.baud_rate = baud_rate;
    }
    ConfigLoader::validate(&config)?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Cancel `token` on Ctrl+C for one-shot commands
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C, stopping");
            token.cancel();
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load(&args)?;
    init_tracing(&config.logging)?;

    info!("Starting Scale Recorder");
    info!("Configuration: {}", args.config.display());
    info!(
        "Serial port: {} at {} baud",
        config.serial.port, config.serial.baud_rate
    );

    let station = Arc::new(Station::from_config(config).await?);
    let shutdown = CancellationToken::new();

    match args.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            let stdin = BufReader::new(tokio::io::stdin());
            let mut console = Console::new(station, stdin, tokio::io::stdout(), shutdown);
            console.run().await?;
        }
        Command::Ingest => {
            cancel_on_interrupt(shutdown.clone());
            let summary = station.ingest(&shutdown).await?;
            println!("{}", describe_ingest(&summary));
        }
        Command::Reweigh { bag_id } => {
            let bag_id = BagId::parse(&bag_id)?;
            cancel_on_interrupt(shutdown.clone());
            match station.reweigh(&bag_id, &shutdown).await? {
                ReweighOutcome::Updated { current, .. } => println!(
                    "Bag ID {} reweighed successfully: New weight {} kg at {}",
                    current.bag_id, current.gross_weight, current.timestamp
                ),
                ReweighOutcome::NotFound { bag_id, .. } => {
                    bail!("No bag with ID {} in the ledger", bag_id)
                }
                ReweighOutcome::Cancelled => println!("Interrupted by user."),
            }
        }
        Command::Show { bag_id } => {
            let bag_id = BagId::parse(&bag_id)?;
            match station.details(&bag_id).await? {
                Some(record) => println!("{}", describe_record(&record)),
                None => println!("No details found for BagID {}", bag_id),
            }
        }
        Command::Report => {
            let path = station.export_report().await?;
            println!("Report saved to {}", path.display());
        }
    }

    info!("Scale Recorder shut down");
    Ok(())
}
