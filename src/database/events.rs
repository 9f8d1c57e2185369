use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use super::models::Event;

const COLUMNS: &str = "id, competition_id, code, name, weapon, gender, age_bracket, category, \
                       participant_count, warnings, created_at";

#[allow(clippy::too_many_arguments)]
pub fn upsert_event(
    conn: &mut DbConn,
    competition_id: i64,
    code: &str,
    name: &str,
    weapon: &str,
    gender: &str,
    age_bracket: Option<&str>,
    category: &str,
    participant_count: i64,
    warnings: Option<&str>,
) -> Result<Event> {
    if let Some(existing) = find_by_code(conn, competition_id, code)? {
        return Ok(existing);
    }

    let sql = format!(
        "INSERT INTO events (competition_id, code, name, weapon, gender, age_bracket, category, \
         participant_count, warnings) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING {COLUMNS}"
    );
    conn.query_row(
        &sql,
        params![
            competition_id,
            code,
            name,
            weapon,
            gender,
            age_bracket,
            category,
            participant_count,
            warnings
        ],
        parse_event_row,
    )
    .context("Failed to insert event")
}

pub fn find_by_code(conn: &mut DbConn, competition_id: i64, code: &str) -> Result<Option<Event>> {
    let sql = format!("SELECT {COLUMNS} FROM events WHERE competition_id = ?1 AND code = ?2");

    conn.query_row(&sql, params![competition_id, code], parse_event_row)
        .optional()
        .context("Failed to query event by code")
}

pub fn list_for_competition(conn: &mut DbConn, competition_id: i64) -> Result<Vec<Event>> {
    let sql = format!("SELECT {COLUMNS} FROM events WHERE competition_id = ?1 ORDER BY code");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![competition_id], parse_event_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn parse_event_row(row: &rusqlite::Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        competition_id: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        weapon: row.get(4)?,
        gender: row.get(5)?,
        age_bracket: row.get(6)?,
        category: row.get(7)?,
        participant_count: row.get(8)?,
        warnings: row.get(9)?,
        created_at: row.get(10)?,
    })
}
