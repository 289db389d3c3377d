use anyhow::Result;
use clap::Parser;

use crate::journal::store::JournalStorage;

use super::{
    output::{entry_line, EMPTY_NOTICE},
    AppContext, DEFAULT_CATEGORY,
};

#[derive(Debug, Parser)]
pub struct SearchCommand {
    #[arg(required = true, help = "Text to look for, matched case-insensitively")]
    term: String,
    #[arg(short, long, default_value = DEFAULT_CATEGORY, help = "Journal category to scan")]
    category: String,
    #[arg(short, long, help = "Scan every category instead of one")]
    all_categories: bool,
}

/// Command to process `search`. A linear scan over the flat files; matching
/// runs over the raw lines, so dates and job ids hit too.
pub async fn process_search_command(
    SearchCommand {
        term,
        category,
        all_categories,
    }: SearchCommand,
    ctx: &AppContext,
) -> Result<()> {
    let categories = if all_categories {
        ctx.storage.categories().await?
    } else {
        vec![category]
    };

    let mut total = 0usize;
    for category in &categories {
        let hits = ctx.storage.search(category, &term).await?;
        if hits.is_empty() {
            continue;
        }
        total += hits.len();
        println!("{category}:");
        for entry in &hits {
            println!("  {}", entry_line(entry, true, true));
        }
    }

    if total == 0 {
        println!("{EMPTY_NOTICE}");
    }
    Ok(())
}
