use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use super::models::DbPlayer;
use crate::identity::{PlayerRecord, PlayerStatus};

const COLUMNS: &str = "id, name, normalized_name, affiliation, birth_year, gender, \
                       age_bracket, primary_weapon, status, redirect_to, provisional, last_seen";

/// Write a registry record to the players table. Registry ids are
/// authoritative, so the row id is supplied explicitly. `redirect_to`
/// holds the merge target or the split source, depending on status.
pub fn sync_player(conn: &mut DbConn, record: &PlayerRecord) -> Result<()> {
    let (status, redirect_to) = match record.status {
        PlayerStatus::Active => ("active", None),
        PlayerStatus::Merged { into } => ("merged", Some(into)),
        PlayerStatus::Split { from } => ("split", Some(from)),
    };

    let sql = "INSERT INTO players \
               (id, name, normalized_name, affiliation, birth_year, gender, age_bracket, \
                primary_weapon, status, redirect_to, provisional, last_seen) \
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
               ON CONFLICT (id) DO UPDATE SET \
               affiliation = excluded.affiliation, birth_year = excluded.birth_year, \
               gender = excluded.gender, age_bracket = excluded.age_bracket, \
               primary_weapon = excluded.primary_weapon, status = excluded.status, \
               redirect_to = excluded.redirect_to, provisional = excluded.provisional, \
               last_seen = excluded.last_seen";

    conn.execute(
        sql,
        params![
            record.id,
            record.display_name,
            record.normalized_name,
            record.affiliations.last(),
            record.birth_year,
            record.gender.map(|g| g.as_str()),
            record.age_bracket.map(|b| b.as_str()),
            record.primary_weapon.map(|w| w.as_str()),
            status,
            redirect_to,
            record.provisional,
            record.last_seen,
        ],
    )
    .context("Failed to sync player")?;
    Ok(())
}

pub fn find_by_id(conn: &mut DbConn, id: i64) -> Result<Option<DbPlayer>> {
    let sql = format!("SELECT {COLUMNS} FROM players WHERE id = ?1");

    conn.query_row(&sql, params![id], parse_player_row)
        .optional()
        .context("Failed to query player by id")
}

pub fn list_all(conn: &mut DbConn) -> Result<Vec<DbPlayer>> {
    let sql = format!("SELECT {COLUMNS} FROM players ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_player_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Re-point every row referencing `loser` at `survivor` in one
/// transaction, then mark the loser merged. Ranking rows that would
/// collide with an existing survivor row are dropped rather than
/// duplicated.
pub fn merge_references(conn: &mut DbConn, loser: i64, survivor: i64) -> Result<()> {
    let tx = conn.transaction().context("Failed to open merge transaction")?;

    tx.execute(
        "UPDATE bouts SET first_player_id = ?2 WHERE first_player_id = ?1",
        params![loser, survivor],
    )?;
    tx.execute(
        "UPDATE bouts SET second_player_id = ?2 WHERE second_player_id = ?1",
        params![loser, survivor],
    )?;
    tx.execute(
        "UPDATE bouts SET winner_player_id = ?2 WHERE winner_player_id = ?1",
        params![loser, survivor],
    )?;
    tx.execute(
        "UPDATE OR IGNORE final_rankings SET player_id = ?2 WHERE player_id = ?1",
        params![loser, survivor],
    )?;
    tx.execute("DELETE FROM final_rankings WHERE player_id = ?1", params![loser])?;
    tx.execute(
        "UPDATE OR IGNORE ranking_points SET player_id = ?2 WHERE player_id = ?1",
        params![loser, survivor],
    )?;
    tx.execute("DELETE FROM ranking_points WHERE player_id = ?1", params![loser])?;

    tx.execute(
        "UPDATE players SET status = 'merged', redirect_to = ?2 WHERE id = ?1",
        params![loser, survivor],
    )?;
    tx.execute(
        "INSERT INTO player_lineage (player_id, related_id, kind) VALUES (?1, ?2, 'merged_into')",
        params![loser, survivor],
    )?;

    tx.commit().context("Failed to commit merge")
}

/// Move results dated on or after `from_date` from `source` onto the new
/// player `target`, inside one transaction.
pub fn split_references(
    conn: &mut DbConn,
    source: i64,
    target: i64,
    from_date: NaiveDate,
) -> Result<()> {
    let tx = conn.transaction().context("Failed to open split transaction")?;

    tx.execute(
        "INSERT INTO players (id, name, normalized_name, affiliation, birth_year, gender, \
         age_bracket, primary_weapon, status, redirect_to, provisional, last_seen) \
         SELECT ?2, name, normalized_name, affiliation, birth_year, gender, age_bracket, \
         primary_weapon, 'split', ?1, 1, last_seen \
         FROM players WHERE id = ?1",
        params![source, target],
    )?;

    tx.execute(
        "UPDATE bouts SET first_player_id = ?2 WHERE first_player_id = ?1 AND date >= ?3",
        params![source, target, from_date],
    )?;
    tx.execute(
        "UPDATE bouts SET second_player_id = ?2 WHERE second_player_id = ?1 AND date >= ?3",
        params![source, target, from_date],
    )?;
    tx.execute(
        "UPDATE bouts SET winner_player_id = ?2 WHERE winner_player_id = ?1 AND date >= ?3",
        params![source, target, from_date],
    )?;
    tx.execute(
        "UPDATE final_rankings SET player_id = ?2 WHERE player_id = ?1 AND event_id IN \
         (SELECT e.id FROM events e JOIN competitions c ON c.id = e.competition_id \
          WHERE c.start_date >= ?3)",
        params![source, target, from_date],
    )?;
    tx.execute(
        "UPDATE ranking_points SET player_id = ?2 WHERE player_id = ?1 AND competition_date >= ?3",
        params![source, target, from_date],
    )?;

    tx.execute(
        "INSERT INTO player_lineage (player_id, related_id, kind) VALUES (?1, ?2, 'split_from')",
        params![target, source],
    )?;

    tx.commit().context("Failed to commit split")
}

fn parse_player_row(row: &rusqlite::Row) -> rusqlite::Result<DbPlayer> {
    Ok(DbPlayer {
        id: row.get(0)?,
        name: row.get(1)?,
        normalized_name: row.get(2)?,
        affiliation: row.get(3)?,
        birth_year: row.get(4)?,
        gender: row.get(5)?,
        age_bracket: row.get(6)?,
        primary_weapon: row.get(7)?,
        status: row.get(8)?,
        redirect_to: row.get(9)?,
        provisional: row.get(10)?,
        last_seen: row.get(11)?,
    })
}
