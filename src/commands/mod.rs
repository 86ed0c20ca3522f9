//! CLI subcommands.
//!
//! Each subcommand is a clap `Args` struct next to its `run` function;
//! commands stay thin over the service layer.

pub mod categories;
pub mod interactive;
pub mod run;

use console::style;

use crate::backend::SelectionOutcome;

/// Print the five result statistics and the archive name.
pub(crate) fn print_stats(outcome: &SelectionOutcome) {
    let stats = &outcome.stats;
    println!("{}", style("Selection results").bold());
    println!("  total users         {}", stats.total_users);
    println!("  expected open rate  {}%", stats.expected_open_rate);
    println!("  mail group          {}", stats.mail_group);
    println!("  messaging group     {}", stats.whatsapp_group);
    println!("  ignored group       {}", stats.ignored_group);
    println!("  archive             {}", outcome.zip_filename);
}
