//! List the fixed campaign categories.

use clap::Args;

use crate::form::Category;

#[derive(Args)]
pub struct CategoriesCmd {}

pub fn run(_args: CategoriesCmd, json: bool) -> anyhow::Result<()> {
    if json {
        let labels: Vec<&str> = Category::ALL.iter().map(|c| c.label()).collect();
        println!("{}", serde_json::to_string(&labels)?);
    } else {
        for category in Category::ALL {
            println!("{}", category);
        }
    }
    Ok(())
}
