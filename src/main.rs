use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gpio_nodeserver::config::file::config_file_path;
use gpio_nodeserver::gpio::bcm_for_header_pin;
use gpio_nodeserver::{Config, GpioBackend, NodeServer};

/// GPIO node server - relay nodes for a home-automation supervisor
#[derive(Parser)]
#[command(name = "gpio-nodeserver", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/gpio-nodeserver/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GPIO backend: simulated or rppal
    #[arg(long)]
    backend: Option<GpioBackend>,

    /// Create catalog nodes at startup
    #[arg(long)]
    create: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the relay catalog with node addresses and BCM numbers
    Catalog,
    /// Print the default config file path
    ConfigPath,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,gpio_nodeserver=info",
        1 => "info,gpio_nodeserver=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(backend) = cli.backend {
        config.gpio.backend = backend;
    }
    if cli.create {
        config.nodes.auto_create = true;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        match cmd {
            Command::Catalog => print_catalog(&config),
            Command::ConfigPath => print_config_path(),
        }
        return Ok(());
    }

    tracing::info!(
        backend = %config.gpio.backend,
        active_low = config.gpio.active_low,
        "starting gpio node server"
    );

    let server = NodeServer::new(config)?;
    server.run().await;

    Ok(())
}

fn print_catalog(config: &Config) {
    println!("{:<10} {:>4} {:>4}  NAME", "ADDRESS", "PIN", "BCM");
    for device in &config.devices {
        let bcm = bcm_for_header_pin(device.pin).map_or_else(|| "-".to_string(), |b| b.to_string());
        println!(
            "{:<10} {:>4} {:>4}  {}",
            device.address(),
            device.pin,
            bcm,
            device.name
        );
    }
}

fn print_config_path() {
    match config_file_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("no home directory found"),
    }
}
