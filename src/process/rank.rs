// src/process/rank.rs

use std::cmp::Ordering;
use tracing::debug;

use super::utils::round_to;
use crate::model::{Board, ProspectRow};

/// Fantasy weight per position; anything unlisted weighs 1.0.
pub fn multiplier(position: &str) -> f64 {
    match position {
        "QB" => 1.0,
        "RB" => 1.5,
        "WR" => 1.4,
        "TE" => 1.2,
        _ => 1.0,
    }
}

pub fn fantasy_rank(rank: f64, position: &str) -> f64 {
    round_to(rank / multiplier(position), 2)
}

/// 1 for the top 24, 2 through 60, 3 after.
pub fn tier(rank: f64) -> u8 {
    if rank <= 24.0 {
        1
    } else if rank <= 60.0 {
        2
    } else {
        3
    }
}

pub fn rank_row(row: &mut ProspectRow) {
    row.fantasy_rank = fantasy_rank(row.rank, &row.position);
    row.tier = tier(row.rank);
}

/// Fill in derived columns and sort ascending by fantasy rank.
/// The sort is stable so equal ranks keep their input order.
pub fn rank_board(board: &mut Board) {
    board.rows.iter_mut().for_each(rank_row);
    board
        .rows
        .sort_by(|a, b| a.fantasy_rank.partial_cmp(&b.fantasy_rank).unwrap_or(Ordering::Equal));
    debug!(rows = board.rows.len(), "ranked board");
}
