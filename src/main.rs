mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::{DirectoryKind, SubjectArgs};
use rasp::config::Config;
use rasp::directory::DEFAULT_STAFF_PAGES;

#[derive(Parser)]
#[command(
    name = "rasp",
    version,
    about = "University class schedule scraper with a JSON cache and timetable API",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding cached JSON files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(clap::Args)]
struct SubjectSelection {
    /// Group id
    #[arg(long, conflicts_with = "staff")]
    group: Option<String>,

    /// Staff member id
    #[arg(long)]
    staff: Option<String>,

    /// Academic week (defaults to the current one)
    #[arg(short, long)]
    week: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a schedule from the source site and cache it
    Refresh {
        #[command(flatten)]
        subject: SubjectSelection,

        /// Full schedule page URL instead of a subject
        #[arg(long, conflicts_with_all = ["group", "staff"])]
        url: Option<String>,
    },

    /// Show a cached schedule
    Lookup {
        #[command(flatten)]
        subject: SubjectSelection,

        /// Print the stored JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Extract a schedule from a saved HTML file and print it as JSON
    Extract {
        /// HTML file to read
        file: PathBuf,
    },

    /// Rebuild the group or staff directory
    Directory {
        /// Directory to rebuild
        #[arg(value_enum)]
        kind: DirectoryKind,

        /// Staff listing pages to crawl
        #[arg(long, default_value_t = DEFAULT_STAFF_PAGES)]
        pages: u32,
    },

    /// Search the stored directories
    Search {
        /// Search query
        query: String,
    },

    /// Start the timetable HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory with the browser UI
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // Initialize tracing/logging
    setup_tracing(&config.logging.format, &config.logging.level, cli.verbose)?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Refresh { subject, url } => {
            tracing::info!(
                group = ?subject.group,
                staff = ?subject.staff,
                url = ?url,
                week = ?subject.week,
                "Starting refresh command"
            );
            commands::refresh(config, subject.into_args(url)).await?;
        }

        Commands::Lookup { subject, json } => {
            commands::lookup(config, subject.into_args(None), json).await?;
        }

        Commands::Extract { file } => {
            tracing::info!(file = %file.display(), "Starting extract command");
            commands::extract(&config, &file)?;
        }

        Commands::Directory { kind, pages } => {
            tracing::info!(kind = ?kind, pages, "Starting directory command");
            commands::directory::refresh(config, kind, pages).await?;
        }

        Commands::Search { query } => {
            commands::directory::search(config, query).await?;
        }

        Commands::Serve {
            host,
            port,
            public_dir,
        } => {
            tracing::info!(host = ?host, port = ?port, "Starting serve command");
            commands::serve(config, host, port, public_dir).await?;
        }
    }

    Ok(())
}

impl SubjectSelection {
    fn into_args(self, url: Option<String>) -> SubjectArgs {
        SubjectArgs {
            group: self.group,
            staff: self.staff,
            url,
            week: self.week,
        }
    }
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("rasp=debug,tower_http=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("rasp={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
