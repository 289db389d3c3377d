use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::info;

use crate::{
    journal::store::JournalStorage,
    utils::{dir::backup_root, time::backup_stamp},
};

use super::AppContext;

#[derive(Debug, Parser)]
pub struct BackupCommand {
    #[arg(
        long,
        help = "Where to copy the journal. Defaults to a timestamped directory under <dir>/backup"
    )]
    dest: Option<PathBuf>,
}

/// Command to process `backup`. Copies every category file as-is; the journal
/// is plain text, so a copy is a complete backup.
pub async fn process_backup_command(
    BackupCommand { dest }: BackupCommand,
    ctx: &AppContext,
) -> Result<()> {
    let categories = ctx.storage.categories().await?;
    if categories.is_empty() {
        println!("No journal files to back up yet");
        return Ok(());
    }

    let dest = dest
        .unwrap_or_else(|| backup_root(&ctx.dir).join(backup_stamp(Local::now().naive_local())));
    tokio::fs::create_dir_all(&dest)
        .await
        .with_context(|| format!("Failed to create backup directory {dest:?}"))?;

    for category in &categories {
        let file_name = format!("{category}.log");
        let source = ctx.storage.journal_dir().join(&file_name);
        let target = dest.join(&file_name);
        tokio::fs::copy(&source, &target)
            .await
            .with_context(|| format!("Failed to copy {source:?}"))?;
        info!("Backed up {source:?}");
        println!("{}", target.display());
    }

    println!("Backed up {} categories into {}", categories.len(), dest.display());
    Ok(())
}
