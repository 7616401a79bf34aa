//! Stylus CLI - stylus command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cmd;
mod util;

/// Stylus - userstyle manager tooling
#[derive(Parser)]
#[command(name = "stylus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./stylus.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deep-merge one JSON file into another and print the result
    Merge {
        /// Source JSON file ("-" for stdin)
        source: PathBuf,
        /// Destination JSON file; merged into an empty object when omitted
        destination: Option<PathBuf>,
        /// Append source arrays to destination arrays instead of replacing
        #[arg(long)]
        arrays: bool,
    },
    /// Print a deep copy of a JSON file
    Copy {
        /// JSON file ("-" for stdin)
        file: PathBuf,
    },
    /// Compare two JSON files structurally (exit code 1 when different)
    Equal {
        a: PathBuf,
        b: PathBuf,
        /// Object key to ignore at any depth (repeatable)
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },
    /// Show whether dark mode is on
    Scheme {
        /// Override the configured mode (never, dark, light, system, time)
        #[arg(long)]
        mode: Option<String>,
        /// Time of day to evaluate (HH:MM, default: now)
        #[arg(long)]
        at: Option<String>,
        /// Report the system preference as dark
        #[arg(long)]
        system_dark: bool,
    },
    /// Compute userstyle service URLs
    #[command(subcommand)]
    Url(UrlCommands),
    /// Detect the browser from a User-Agent or brand string
    Ua {
        /// User-Agent string or "Brand/Version ..." list
        brands: String,
        /// Platform name (default: taken from the brand string)
        #[arg(long)]
        platform: Option<String>,
        /// Force mobile detection
        #[arg(long)]
        mobile: bool,
    },
    /// Compress a JSON file the way large settings are stored
    Pack {
        file: PathBuf,
    },
    /// Decompress a packed value
    Unpack {
        /// Hex string produced by `pack`
        packed: String,
    },
    /// Show or create the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum UrlCommands {
    /// Human facing page of a style
    Install { url: String },
    /// Update URL of a style
    Update { url: String },
    /// Show the request that would be sent for a download
    Prepare { url: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all configuration values
    List,
    /// Write the default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Merge { source, destination, arrays } => {
            cmd::merge::run(&source, destination.as_deref(), arrays).await?
        }
        Commands::Copy { file } => cmd::copy::run(&file).await?,
        Commands::Equal { a, b, ignore } => {
            if !cmd::equal::run(&a, &b, &ignore).await? {
                return Ok(ExitCode::from(1));
            }
        }
        Commands::Scheme { mode, at, system_dark } => {
            cmd::scheme::run(config, mode.as_deref(), at.as_deref(), system_dark).await?
        }
        Commands::Url(sub) => match sub {
            UrlCommands::Install { url } => cmd::url::run_install(&url).await?,
            UrlCommands::Update { url } => cmd::url::run_update(&url).await?,
            UrlCommands::Prepare { url } => cmd::url::run_prepare(&url).await?,
        },
        Commands::Ua { brands, platform, mobile } => {
            cmd::ua::run(&brands, platform.as_deref(), mobile).await?
        }
        Commands::Pack { file } => cmd::pack::run_pack(&file).await?,
        Commands::Unpack { packed } => cmd::pack::run_unpack(&packed).await?,
        Commands::Config(sub) => match sub {
            ConfigCommands::List => cmd::config::run_list(config).await?,
            ConfigCommands::Init { force } => cmd::config::run_init(config, force).await?,
        },
    }

    Ok(ExitCode::SUCCESS)
}
