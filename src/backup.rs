// src/backup.rs

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Timestamped snapshot directories under a single root.
pub struct Backups {
    root: PathBuf,
}

impl Backups {
    /// Construct a store at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).with_context(|| format!("creating backup root {:?}", &root))?;
        Ok(Self { root })
    }

    /// Copy each existing file in `files` into a fresh `<root>/<timestamp>/`.
    /// Missing files are skipped.
    pub fn snapshot(&self, files: &[&Path]) -> Result<PathBuf> {
        let dir = self.fresh_dir()?;
        for file in files {
            if !file.exists() {
                debug!(file = %file.display(), "nothing to back up");
                continue;
            }
            let Some(name) = file.file_name() else {
                continue;
            };
            let dest = dir.join(name);
            fs::copy(file, &dest)
                .with_context(|| format!("copying {:?} -> {:?}", file, dest))?;
            info!(file = %file.display(), "backed up");
        }
        Ok(dir)
    }

    /// Existing store at `root`; a missing directory is an error.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("no backups directory at {:?}", root);
        }
        Ok(Self { root })
    }

    /// Snapshot directories, newest first.
    pub fn snapshots(&self) -> Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)
            .with_context(|| format!("reading {:?}", self.root))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        dirs.reverse();
        Ok(dirs)
    }

    /// Pick a snapshot by 1-based position in [`Backups::snapshots`] or by
    /// its directory name. `None` picks the newest.
    pub fn find(&self, choice: Option<&str>) -> Result<PathBuf> {
        let snapshots = self.snapshots()?;
        let Some(newest) = snapshots.first() else {
            bail!("no backups found in {:?}", self.root);
        };
        let Some(choice) = choice else {
            return Ok(newest.clone());
        };

        let by_index = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| snapshots.get(i));
        let by_name = || {
            snapshots
                .iter()
                .find(|p| p.file_name().map_or(false, |n| n == choice))
        };
        by_index
            .or_else(by_name)
            .cloned()
            .with_context(|| format!("invalid backup choice {:?}", choice))
    }

    fn fresh_dir(&self) -> Result<PathBuf> {
        let ts = Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let mut dir = self.root.join(&ts);
        let mut n = 1;
        while dir.exists() {
            dir = self.root.join(format!("{}_{}", ts, n));
            n += 1;
        }
        fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;
        Ok(dir)
    }
}

/// Copy every file in `snapshot` into `dest`, replacing what is there.
pub fn restore(snapshot: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(snapshot)
        .with_context(|| format!("reading {:?}", snapshot))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    if files.is_empty() {
        bail!("backup {:?} is empty", snapshot);
    }
    files.sort();

    fs::create_dir_all(dest).with_context(|| format!("creating {:?}", dest))?;
    let mut restored = Vec::with_capacity(files.len());
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = dest.join(name);
        fs::copy(&file, &target)
            .with_context(|| format!("copying {:?} -> {:?}", file, target))?;
        info!(file = %target.display(), "restored");
        restored.push(target);
    }
    Ok(restored)
}

/// One-shot helper: snapshot `files` under `root`.
pub fn backup_files(root: impl Into<PathBuf>, files: &[&Path]) -> Result<PathBuf> {
    Backups::new(root)?.snapshot(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn snapshots_are_distinct_and_ordered() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("players.csv");
        fs::write(&file, "a")?;

        let store = Backups::new(dir.path().join("backups"))?;
        let first = store.snapshot(&[file.as_path()])?;
        fs::write(&file, "b")?;
        let missing = dir.path().join("missing.csv");
        let second = store.snapshot(&[file.as_path(), missing.as_path()])?;

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(first.join("players.csv"))?, "a");
        assert_eq!(fs::read_to_string(second.join("players.csv"))?, "b");
        assert!(!second.join("missing.csv").exists());
        assert_eq!(store.snapshots()?.len(), 2);
        Ok(())
    }

    #[test]
    fn restores_chosen_snapshot() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("prospects.csv");
        let root = dir.path().join("backups");

        fs::write(&file, "old")?;
        let older = backup_files(&root, &[file.as_path()])?;
        fs::write(&file, "newer")?;
        let newer = backup_files(&root, &[file.as_path()])?;
        fs::write(&file, "current")?;

        let store = Backups::open(&root)?;
        assert_eq!(store.find(None)?, newer);
        assert_eq!(store.find(Some("1"))?, newer);
        assert_eq!(store.find(Some("2"))?, older);
        let name = older.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert_eq!(store.find(Some(name))?, older);
        assert!(store.find(Some("3")).is_err());
        assert!(store.find(Some("0")).is_err());

        let restored = restore(&older, dir.path())?;
        assert_eq!(restored, vec![file.clone()]);
        assert_eq!(fs::read_to_string(&file)?, "old");
        Ok(())
    }

    #[test]
    fn restore_needs_existing_backups() -> Result<()> {
        let dir = tempdir()?;
        assert!(Backups::open(dir.path().join("backups")).is_err());

        let store = Backups::new(dir.path().join("backups"))?;
        assert!(store.find(None).is_err());

        let empty = dir.path().join("backups/2026-01-25T14-30-00");
        fs::create_dir_all(&empty)?;
        assert_eq!(store.find(None)?, empty);
        assert!(restore(&empty, dir.path()).is_err());
        Ok(())
    }
}
