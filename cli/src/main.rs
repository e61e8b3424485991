//! Sitescan CLI - Register address ranges and sample their ports
//!
//! A command-line tool for registering address ranges per site,
//! looking them up, and running scheduled or one-off port scans.

mod commands;

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use commands::Context;

#[derive(Parser)]
#[command(name = "sitescan")]
#[command(author, version, about = "Register address ranges and sample their ports")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (default: ~/.sitescan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known sites
    Sites,

    /// Register every address of a CIDR block under a site
    #[command(alias = "add")]
    Register {
        /// First address of the block
        start: String,

        /// Prefix length
        #[arg(allow_negative_numbers = true)]
        cidr: i64,

        /// Site name
        site: String,
    },

    /// Show the registrations of an address
    Lookup { address: String },

    /// Probe one address right away
    Probe {
        address: IpAddr,

        /// Protocol to probe
        #[arg(short, long, value_enum, default_value = "both")]
        protocol: ProtocolArg,

        /// Site recorded in the results
        #[arg(short, long, default_value = "Bravo")]
        site: String,

        /// Probe these ports instead of the standard sample
        #[arg(long, value_delimiter = ',')]
        ports: Vec<u16>,
    },

    /// Run one scan cycle over every fanned-out site
    Scan {
        /// Append results to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan on a schedule until interrupted
    Serve {
        /// Append results to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run a cycle at startup instead of waiting one interval
        #[arg(long)]
        now: bool,
    },

    /// Show effective settings
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        write: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    Tcp,
    Udp,
    Both,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Context::load(cli.config, cli.json).await?;

    match cli.command {
        Commands::Sites => commands::sites::run(&ctx).await?,
        Commands::Register { start, cidr, site } => {
            commands::register::run(&ctx, start, cidr, site).await?;
        }
        Commands::Lookup { address } => commands::lookup::run(&ctx, &address).await?,
        Commands::Probe {
            address,
            protocol,
            site,
            ports,
        } => commands::probe::run(&ctx, address, protocol, &site, ports).await?,
        Commands::Scan { output } => commands::scan::run(&ctx, output).await?,
        Commands::Serve { output, now } => commands::serve::run(&ctx, output, now).await?,
        Commands::Config { write } => commands::config::show(&ctx, write).await?,
    }

    Ok(())
}
