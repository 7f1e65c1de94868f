mod reports;
mod search;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "carscout-cli")]
#[command(about = "Used-vehicle listing aggregator")]
struct Cli {
    /// Search configuration document (YAML or JSON).
    #[arg(long, global = true, env = "CARSCOUT_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one aggregation session and print a summary.
    Search(SearchArgs),
    /// Look up history-report links for listings saved by `search`.
    Reports(ReportsArgs),
}

#[derive(Debug, Default, Args)]
struct SearchArgs {
    #[arg(long)]
    make: Option<String>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    max_pages: Option<u32>,
    /// Listings requested per page.
    #[arg(long)]
    rows: Option<u32>,
    /// Skip writing the results file.
    #[arg(long)]
    no_save: bool,
    /// Results file, overriding the configured filename.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ReportsArgs {
    /// Saved listings; defaults to the configured output file.
    #[arg(long)]
    input: Option<PathBuf>,
    /// How many listings from the top of the file to look up.
    #[arg(long, default_value_t = 5)]
    limit: usize,
    #[arg(long, default_value = "carfax_report_links.json")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut app = carscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(app.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    if let Some(path) = cli.config {
        app.config_path = path;
    }
    tracing::debug!(path = %app.config_path.display(), "loading search config");
    let config = carscout_core::load_search_config(&app.config_path);

    match cli.command {
        Some(Commands::Search(args)) => search::run_search(&app, config, &args).await,
        Some(Commands::Reports(args)) => reports::run_reports(&app, &config, &args).await,
        None => search::run_search(&app, config, &SearchArgs::default()).await,
    }
}
