use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lorawan_network_server::{band_setup, logging, parse_dev_eui, render_device_session, settings::Settings};
use lorawan_session::MemoryStore;

/// Network server shell: config, logging and a debug CLI over the band
/// registry, session store and MAC command engine.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file (without extension).
    #[arg(short, long, default_value = "lorawan-network-server")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate configuration and band setup, then exit.
    ConfigCheck,
    /// Print a device session as JSON, keyed by hex DevEUI.
    PrintDs {
        /// DevEUI as a 16-character hex string.
        dev_eui: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::load(&args.config).context("loading configuration")?;
    logging::init(&settings.logging);

    let band = band_setup::setup_band(&settings).context("setting up band")?;
    tracing::info!(band = %band.name(), channels = band.channel_catalog().len(), "band ready");

    match args.command {
        Command::ConfigCheck => {
            println!("configuration and band setup are valid");
            Ok(())
        }
        Command::PrintDs { dev_eui } => {
            let dev_eui = parse_dev_eui(&dev_eui)?;
            let store = MemoryStore::new();
            println!("{}", render_device_session(&store, &dev_eui)?);
            Ok(())
        }
    }
}
