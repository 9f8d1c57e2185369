use anyhow::{Context, Result};
use rusqlite::params;

use super::connection::DbConn;
use super::models::FinalRankingRow;
use crate::domain::PlayerId;

pub fn insert_final_ranking(
    conn: &mut DbConn,
    event_id: i64,
    player_id: PlayerId,
    rank_position: u32,
) -> Result<bool> {
    let changed = conn
        .execute(
            "INSERT OR IGNORE INTO final_rankings (event_id, player_id, rank_position) \
             VALUES (?1, ?2, ?3)",
            params![event_id, player_id, rank_position],
        )
        .context("Failed to insert final ranking row")?;
    Ok(changed > 0)
}

pub fn list_for_event(conn: &mut DbConn, event_id: i64) -> Result<Vec<FinalRankingRow>> {
    let sql = "SELECT id, event_id, player_id, rank_position FROM final_rankings \
               WHERE event_id = ?1 ORDER BY rank_position";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(FinalRankingRow {
                id: row.get(0)?,
                event_id: row.get(1)?,
                player_id: row.get(2)?,
                rank_position: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}
