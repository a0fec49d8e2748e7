mod agent;
mod commands;
mod comms;
mod security;
mod transport;
mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relay", version, about = "Command Relay Agent")]
struct AppCli {
    /// Config file path
    #[arg(short, long, default_value = "config.json", global = true)]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local command API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let args = AppCli::parse();
    match args.command {
        Some(Commands::Serve { port }) => agent::daemon::run(args.config, port).await,
        None => agent::daemon::run(args.config, None).await,
    }
}
