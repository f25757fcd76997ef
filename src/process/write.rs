use anyhow::{Context, Result};
use chrono::Utc;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::info;

use crate::backup;
use crate::model::Board;

/// Leading columns of every board file; source columns follow.
pub const BOARD_COLUMNS: &[&str] = &[
    "player_name",
    "position",
    "school",
    "year",
    "rank",
    "consensus_rank",
    "fantasy_rank",
    "tier",
];

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Also write `<stem>_timestamp.txt` beside the output.
    pub stamp: bool,
    /// Copy an existing output here before replacing it.
    pub backup_dir: Option<PathBuf>,
}

/// Integral values keep a trailing `.0` so the column reads as float downstream.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

/// Write the board's CSV bytes to any writer.
pub fn write_board_to<W: Write>(board: &Board, out: W) -> Result<()> {
    let mut w = csv::Writer::from_writer(out);

    let mut header: Vec<&str> = BOARD_COLUMNS.to_vec();
    header.extend(board.sources.iter().map(String::as_str));
    w.write_record(&header).context("writing header")?;

    for row in &board.rows {
        let mut rec = vec![
            row.player_name.clone(),
            row.position.clone(),
            row.school.clone(),
            row.year.clone().unwrap_or_default(),
            format_number(row.rank),
            row.consensus_rank.map(format_number).unwrap_or_default(),
            format_number(row.fantasy_rank),
            row.tier.to_string(),
        ];
        rec.extend(board.sources.iter().map(|s| {
            row.source_ranks
                .get(s)
                .copied()
                .map(format_number)
                .unwrap_or_default()
        }));
        w.write_record(&rec)
            .with_context(|| format!("writing row for {:?}", row.player_name))?;
    }

    w.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Replace `path` with the board, creating the parent directory if needed.
///
/// Bytes go to a temp file in the same directory which is then renamed over
/// `path`. Returns the number of rows written.
pub fn write_board<P: AsRef<Path>>(board: &Board, path: P, opts: &WriteOptions) -> Result<usize> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {:?}", dir))?;

    if let Some(backup_root) = &opts.backup_dir {
        if path.exists() {
            let saved = backup::backup_files(backup_root, &[path])?;
            info!(dir = %saved.display(), "backed up previous output");
        }
    }

    let mut tmp =
        NamedTempFile::new_in(&dir).with_context(|| format!("creating temp file in {:?}", dir))?;
    write_board_to(board, tmp.as_file_mut())?;
    tmp.as_file().sync_all().context("syncing temp file")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("renaming temp file over {:?}", path))?;

    if opts.stamp {
        let stamp = write_stamp(path)?;
        info!(path = %stamp.display(), "wrote timestamp");
    }

    info!(rows = board.rows.len(), path = %path.display(), "wrote board");
    Ok(board.rows.len())
}

/// `data/board.csv` → `data/board_timestamp.txt`.
pub fn stamp_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!("{}_timestamp.txt", stem))
}

fn write_stamp(path: &Path) -> Result<PathBuf> {
    let stamp = stamp_path(path);
    let line = format!(
        "Last updated: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    fs::write(&stamp, line).with_context(|| format!("writing {:?}", stamp))?;
    Ok(stamp)
}
