use anyhow::Result;
use clap::Parser;
use draftboard::{
    backup::{restore, Backups},
    config::RestoreArgs,
    logging,
};
use std::{fs, process};
use tracing::{error, info};

fn run(args: &RestoreArgs) -> Result<()> {
    let store = Backups::open(&args.backup_dir)?;

    info!("Available backups:");
    for (i, snapshot) in store.snapshots()?.iter().enumerate() {
        let files = fs::read_dir(snapshot).map(|d| d.count()).unwrap_or(0);
        info!("  {}. {} ({} files)", i + 1, snapshot.display(), files);
    }

    if args.choice.is_none() {
        info!("No backup specified, using the most recent");
    }
    let snapshot = store.find(args.choice.as_deref())?;
    info!("Restoring from {}", snapshot.display());

    let restored = restore(&snapshot, &args.dest)?;
    info!(files = restored.len(), "restore complete");
    Ok(())
}

fn main() {
    let args = RestoreArgs::parse();
    logging::init();
    info!("=== Restore from backup ===");

    if let Err(e) = run(&args) {
        error!("!!! Error occurred: {:#} !!!", e);
        process::exit(1);
    }
}
