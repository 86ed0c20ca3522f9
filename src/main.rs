use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use audiencer::backend::UploadContract;
use audiencer::commands::{categories, interactive, run};
use audiencer::config;

#[derive(Parser)]
#[command(
    name = "audiencer",
    about = "Prepare audience segments for campaign mailings",
    version
)]
struct Cli {
    /// Path to a config file (defaults to the user config directory)
    #[arg(global = true, long, env = "AUDIENCER_CONFIG")]
    config: Option<PathBuf>,
    /// Backend base URL override
    #[arg(global = true, long, env = "AUDIENCER_ENDPOINT")]
    endpoint: Option<String>,
    /// Upload contract override: uid_file or cpid_file
    #[arg(global = true, long, env = "AUDIENCER_CONTRACT")]
    contract: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload, select, and download in one pass
    Run(run::RunCmd),
    /// Drive the preparation form interactively
    Interactive(interactive::InteractiveCmd),
    /// List the fixed campaign categories
    Categories(categories::CategoriesCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let mut settings = config::load_settings(cli.config.as_deref())?;
    if let Some(ref endpoint) = cli.endpoint {
        settings.set_endpoint(endpoint)?;
    }
    if let Some(ref contract) = cli.contract {
        settings.contract = contract
            .parse::<UploadContract>()
            .map_err(anyhow::Error::msg)?;
    }

    match cli.command {
        Commands::Run(args) => run::run(&settings, args, cli.json).await,
        Commands::Interactive(args) => interactive::run(&settings, args).await,
        Commands::Categories(args) => categories::run(args, cli.json),
    }
}

/// Initialize logging to stderr. Respects RUST_LOG, defaults to `info`.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
