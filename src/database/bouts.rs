use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::params;

use super::connection::DbConn;
use super::models::BoutRow;
use crate::domain::{BoutOutcome, DeBout, PlayerId, PoolBout};

const COLUMNS: &str = "id, event_id, phase, round_number, pool_number, match_number, \
                       first_player_id, second_player_id, winner_player_id, winner_score, \
                       loser_score, outcome, is_bye, date";

const INSERT: &str = "INSERT OR IGNORE INTO bouts \
                      (event_id, phase, round_number, pool_number, match_number, \
                       first_player_id, second_player_id, winner_player_id, winner_score, \
                       loser_score, outcome, is_bye, date) \
                      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)";

/// Insert one pool bout. Returns false when the natural key already
/// exists, which is the normal case on re-ingestion.
pub fn insert_pool_bout(
    conn: &mut DbConn,
    event_id: i64,
    bout: &PoolBout,
    first_id: PlayerId,
    second_id: PlayerId,
    winner_id: PlayerId,
    date: NaiveDate,
) -> Result<bool> {
    let (winner_score, loser_score) = scores_of(&bout.outcome);
    let changed = conn
        .execute(
            INSERT,
            params![
                event_id,
                "pool",
                bout.round_number,
                bout.pool_number,
                0,
                first_id,
                second_id,
                winner_id,
                winner_score,
                loser_score,
                bout.outcome.code(),
                false,
                date,
            ],
        )
        .context("Failed to insert pool bout")?;
    Ok(changed > 0)
}

pub fn insert_de_bout(
    conn: &mut DbConn,
    event_id: i64,
    bout: &DeBout,
    first_id: PlayerId,
    second_id: Option<PlayerId>,
    winner_id: PlayerId,
    date: NaiveDate,
) -> Result<bool> {
    let winner_score = winner_slot_score(bout);
    let loser_score = bout.loser().and_then(|l| l.score);
    let changed = conn
        .execute(
            INSERT,
            params![
                event_id,
                "de",
                bout.round_size,
                0,
                bout.match_number,
                first_id,
                second_id,
                winner_id,
                winner_score,
                loser_score,
                if bout.is_bye { "B" } else { "V" },
                bout.is_bye,
                date,
            ],
        )
        .context("Failed to insert elimination bout")?;
    Ok(changed > 0)
}

fn scores_of(outcome: &BoutOutcome) -> (Option<u8>, Option<u8>) {
    match outcome {
        BoutOutcome::Completed {
            winner_score,
            loser_score,
        } => (Some(*winner_score), Some(*loser_score)),
        _ => (None, None),
    }
}

fn winner_slot_score(bout: &DeBout) -> Option<u8> {
    if bout.first.seed == bout.winner_seed {
        bout.first.score
    } else {
        bout.second.as_ref().and_then(|s| s.score)
    }
}

pub fn count_for_event(conn: &mut DbConn, event_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bouts WHERE event_id = ?1",
        params![event_id],
        |row| row.get(0),
    )
    .context("Failed to count bouts")
}

pub fn list_for_player(conn: &mut DbConn, player_id: PlayerId) -> Result<Vec<BoutRow>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM bouts \
         WHERE first_player_id = ?1 OR second_player_id = ?1 ORDER BY date"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![player_id], parse_bout_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn parse_bout_row(row: &rusqlite::Row) -> rusqlite::Result<BoutRow> {
    Ok(BoutRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        phase: row.get(2)?,
        round_number: row.get(3)?,
        pool_number: row.get(4)?,
        match_number: row.get(5)?,
        first_player_id: row.get(6)?,
        second_player_id: row.get(7)?,
        winner_player_id: row.get(8)?,
        winner_score: row.get(9)?,
        loser_score: row.get(10)?,
        outcome: row.get(11)?,
        is_bye: row.get(12)?,
        date: row.get(13)?,
    })
}
