mod cmd;
mod gateway;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, contact::ContactSubcommand, subscriber::SubscriberSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wakeup",
    about = "Batch wake-up calls: place, retry and reconcile one slot at a time",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root (default: auto-detect from .wakeup/)
    #[arg(long, global = true, env = "WAKEUP_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .wakeup/ with a default config and an empty database
    Init {
        /// Config profile: development or production
        #[arg(long)]
        profile: Option<String>,
    },

    /// Run one wake-up cycle for the current slot (the periodic trigger)
    Cycle {
        /// Pin the clock instead of using the current time (RFC 3339)
        #[arg(long)]
        at: Option<String>,
    },

    /// Manage subscribers
    Subscriber {
        #[command(subcommand)]
        subcommand: SubscriberSubcommand,
    },

    /// Manage contact relations
    Contact {
        #[command(subcommand)]
        subcommand: ContactSubcommand,
    },

    /// List call attempts
    Calls {
        /// Only attempts of this slot (RFC 3339)
        #[arg(long)]
        slot: Option<String>,
    },

    /// Wake-up statistics for one subscriber
    Stats { username: String },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Cycle { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { profile } => cmd::init::run(&root, profile.as_deref()),
        Commands::Cycle { at } => cmd::cycle::run(&root, at.as_deref(), cli.json),
        Commands::Subscriber { subcommand } => cmd::subscriber::run(&root, subcommand, cli.json),
        Commands::Contact { subcommand } => cmd::contact::run(&root, subcommand, cli.json),
        Commands::Calls { slot } => cmd::calls::run(&root, slot.as_deref(), cli.json),
        Commands::Stats { username } => cmd::stats::run(&root, &username, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
