//! One-shot pipeline: upload the identifiers file, run the selection,
//! download the groups archive.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::ProgressBar;

use crate::backend::BackendClient;
use crate::config::Settings;
use crate::form::{Category, DEFAULT_RESPONSE_RATE};
use crate::notify::ConsoleNotifier;
use crate::services::SegmentService;

#[derive(Args)]
pub struct RunCmd {
    /// Identifiers file to upload
    #[arg(long)]
    pub file: PathBuf,
    /// Campaign category (see `audiencer categories`)
    #[arg(long, default_value = "Webinar")]
    pub category: String,
    /// Target response rate in percent
    #[arg(long, default_value_t = DEFAULT_RESPONSE_RATE,
          value_parser = clap::value_parser!(u8).range(0..=100))]
    pub rate: u8,
    /// Newsletter content, sent verbatim
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,
    /// Read newsletter content from a file
    #[arg(long)]
    pub content_file: Option<PathBuf>,
    /// Destination directory for the archive (defaults to the configured
    /// download directory)
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Stop after the selection; do not download the archive
    #[arg(long, default_value_t = false)]
    pub no_download: bool,
}

pub async fn run(settings: &Settings, args: RunCmd, json: bool) -> Result<()> {
    let category: Category = args.category.parse()?;
    let content = match (&args.content, &args.content_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };

    let client = BackendClient::new(
        &settings.endpoint,
        settings.contract,
        &settings.user_agent,
        settings.timeout(),
    );
    let mut service = SegmentService::new(client, Box::new(ConsoleNotifier::new()));
    service.set_category(category);
    service.set_rate(args.rate)?;
    service.set_content(content);

    let spinner = step_spinner(format!("uploading {}", args.file.display()));
    let uploaded = service.upload_file(&args.file).await;
    spinner.finish_and_clear();
    uploaded?;

    let spinner = step_spinner("selecting users".to_string());
    let selected = service.select_users().await;
    spinner.finish_and_clear();
    let outcome = selected?;

    let saved = if args.no_download {
        None
    } else {
        let dest = args
            .out
            .clone()
            .unwrap_or_else(|| settings.download_dir.clone());
        let spinner = step_spinner(format!("downloading {}", outcome.zip_filename));
        let downloaded = service.download_groups(&dest).await;
        spinner.finish_and_clear();
        Some(downloaded?)
    };

    if json {
        let envelope = serde_json::json!({
            "stats": outcome.stats,
            "zip_filename": outcome.zip_filename,
            "saved_to": saved.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        super::print_stats(&outcome);
        if let Some(path) = saved {
            println!("  saved to            {}", path.display());
        }
    }

    Ok(())
}

fn step_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
