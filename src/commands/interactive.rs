//! Interactive terminal rendition of the segment preparation form.
//!
//! The screen's fields and actions become line commands; the session gates
//! decide which actions are available, exactly as the form's buttons would.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use console::{style, Term};

use crate::backend::BackendClient;
use crate::config::Settings;
use crate::form::Category;
use crate::notify::ConsoleNotifier;
use crate::services::SegmentService;
use crate::session::Session;

#[derive(Args)]
pub struct InteractiveCmd {
    /// Destination directory for downloads (defaults to the configured
    /// download directory)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub async fn run(settings: &Settings, args: InteractiveCmd) -> Result<()> {
    let term = Term::stderr();
    let client = BackendClient::new(
        &settings.endpoint,
        settings.contract,
        &settings.user_agent,
        settings.timeout(),
    );
    let mut service = SegmentService::new(client, Box::new(ConsoleNotifier::new()));
    let dest = args.out.unwrap_or_else(|| settings.download_dir.clone());

    term.write_line(&format!(
        "{} backend {} ({})",
        style("audiencer").green().bold(),
        settings.endpoint,
        settings.contract
    ))?;
    print_help(&term)?;

    loop {
        render(&term, service.session())?;
        term.write_str("❯ ")?;
        let line = term.read_line()?;
        let line = line.trim();
        let (cmd, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        match cmd {
            "" => {}
            "category" | "cat" => match parse_category(rest) {
                Ok(category) => service.set_category(category),
                Err(message) => term.write_line(&message)?,
            },
            "rate" => match rest.parse::<u8>() {
                Ok(rate) => {
                    if let Err(err) = service.set_rate(rate) {
                        term.write_line(&err.to_string())?;
                    }
                }
                Err(_) => term.write_line("rate takes a number between 0 and 100")?,
            },
            "content" => service.set_content(rest.to_string()),
            "file" => {
                if rest.is_empty() {
                    term.write_line("file takes a path")?;
                } else {
                    let path = shellexpand::tilde(rest).into_owned();
                    // failures are already on the notification surface
                    let _ = service.upload_file(Path::new(&path)).await;
                }
            }
            "select" => {
                if let Ok(outcome) = service.select_users().await {
                    super::print_stats(&outcome);
                }
            }
            "download" => {
                let _ = service.download_groups(&dest).await;
            }
            "status" => {
                if let Some(outcome) = service.session().outcome() {
                    super::print_stats(outcome);
                } else {
                    term.write_line("no selection results yet")?;
                }
            }
            "help" | "?" => print_help(&term)?,
            "quit" | "exit" | "q" => break,
            other => term.write_line(&format!("unknown command {:?}; try help", other))?,
        }
    }

    Ok(())
}

/// Accept a label ("Digest Analytics") or a 1-based index from the list.
fn parse_category(input: &str) -> Result<Category, String> {
    if let Ok(index) = input.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| Category::ALL.get(i))
            .copied()
            .ok_or_else(|| format!("category index must be 1-{}", Category::ALL.len()));
    }
    input.parse::<Category>().map_err(|e| e.to_string())
}

fn render(term: &Term, session: &Session) -> std::io::Result<()> {
    let form = session.form();
    let content = if form.content.is_empty() {
        style("(empty)").dim().to_string()
    } else {
        let preview: String = form.content.chars().take(40).collect();
        if form.content.chars().count() > 40 {
            format!("{}...", preview)
        } else {
            preview
        }
    };

    term.write_line("")?;
    term.write_line(&format!(
        "  category: {}   rate: {}%   content: {}",
        style(form.category).cyan(),
        style(form.rate()).cyan(),
        content
    ))?;
    term.write_line(&format!(
        "  file: {}   {}   {}",
        style(session.file_label()).cyan(),
        action_label("select users", session.can_select()),
        action_label("download", session.can_download()),
    ))
}

fn action_label(name: &str, enabled: bool) -> String {
    if enabled {
        style(format!("[{}]", name)).green().to_string()
    } else {
        style(format!("[{}]", name)).dim().to_string()
    }
}

fn print_help(term: &Term) -> std::io::Result<()> {
    term.write_line("commands:")?;
    for (index, category) in Category::ALL.iter().enumerate() {
        if index == 0 {
            term.write_line(&format!(
                "  category <name|1-{}>   pick one of:",
                Category::ALL.len()
            ))?;
        }
        term.write_line(&format!("      {}. {}", index + 1, category))?;
    }
    term.write_line("  rate <0-100>          target response rate")?;
    term.write_line("  content <text>        newsletter content")?;
    term.write_line("  file <path>           choose and upload an identifiers file")?;
    term.write_line("  select                run the selection")?;
    term.write_line("  download              fetch the groups archive")?;
    term.write_line("  status                show the last selection results")?;
    term.write_line("  quit")
}
