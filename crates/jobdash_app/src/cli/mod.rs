//! Command-line front end over [`jobdash_client::Dashboard`].

mod commands;
mod config;
mod logging;
mod persistence;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use jobdash_client::{Dashboard, HttpBackend, RouteStyle};
use jobdash_core::DocumentId;
use jobdash_logging::jobdash_info;

use config::AppConfig;
use logging::{LogDestination, LogSetup};

#[derive(Parser)]
#[command(name = "jobdash")]
#[command(about = "Resume tailoring dashboard for the jobdash backend", long_about = None)]
pub struct Cli {
    /// Path to the RON config file
    #[arg(long, global = true, default_value = "jobdash.ron")]
    config: PathBuf,
    /// Backend base URL (overrides config and JOBDASH_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Bearer token (overrides config and JOBDASH_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,
    /// How keywords are encoded in generate/search routes
    #[arg(long, global = true, value_enum)]
    route_style: Option<RouteArg>,
    /// Directory holding the persisted selection
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    #[arg(long, global = true, value_enum, default_value = "file")]
    log: LogDestination,
    /// Log file used by `--log file|both` [default: ./jobdash.log]
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RouteArg {
    Query,
    Path,
}

impl From<RouteArg> for RouteStyle {
    fn from(value: RouteArg) -> Self {
        match value {
            RouteArg::Query => RouteStyle::QueryParameter,
            RouteArg::Path => RouteStyle::PathSegment,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// List profiles
    Profiles,
    /// Create a profile
    AddProfile { name: String },
    /// Set the active profile
    Select {
        #[arg(required_unless_present = "none")]
        id: Option<String>,
        /// Clear the active profile
        #[arg(long, conflicts_with = "id")]
        none: bool,
    },
    /// List source documents of the active profile
    Documents,
    /// Upload a source document for the active profile
    Upload { path: PathBuf },
    /// Remove a source document of the active profile
    Remove { doc_id: DocumentId },
    /// Download a source document of the active profile
    Download {
        doc_id: DocumentId,
        /// Target directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Print the extracted text of a source document
    Content { doc_id: DocumentId },
    /// List cached job postings
    Postings {
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Ask the backend to refresh postings for the active profile
    Search { keyword: Option<String> },
    /// Generate a tailored resume, refresh postings, optionally analyze fit
    Run {
        keyword: String,
        #[arg(short, long)]
        analyze: bool,
    },
    /// Clear the active profile and cached data
    Logout,
}

impl Commands {
    fn changes_selection(&self) -> bool {
        matches!(self, Commands::Select { .. } | Commands::Logout)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    LogSetup::new(cli.log, cli.verbose, cli.log_file).initialize();

    let mut config = AppConfig::load(&cli.config)?;
    config.apply_env(|name| std::env::var(name).ok());
    if let Some(base_url) = cli.base_url {
        config.base_url = Some(base_url);
    }
    if let Some(token) = cli.token {
        config.auth_token = Some(token);
    }
    if let Some(route) = cli.route_style {
        config.route_style = Some(route.into());
    }
    if let Some(state_dir) = cli.state_dir {
        config.state_dir = Some(state_dir);
    }
    if let Commands::Postings { limit: Some(limit) } = &cli.command {
        config.postings_limit = Some(*limit);
    }

    let settings = config.client_settings();
    let state_dir = config.state_dir();
    let postings_limit = settings.postings_limit;
    let backend = Arc::new(HttpBackend::new(settings)?);
    let dashboard = Dashboard::new(
        backend,
        postings_limit,
        persistence::load_selection(&state_dir),
    );
    jobdash_info!(
        "jobdash started; active profile {}",
        dashboard.current_profile().as_deref().unwrap_or("<none>")
    );

    let changes_selection = cli.command.changes_selection();
    commands::execute(&dashboard, cli.command).await?;
    if changes_selection {
        persistence::save_selection(&state_dir, dashboard.current_profile().as_deref());
    }
    Ok(())
}
