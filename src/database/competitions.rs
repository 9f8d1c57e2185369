use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use super::models::Competition;

const COLUMNS: &str = "id, code, name, tier, status, start_date, end_date, venue, created_at";

#[allow(clippy::too_many_arguments)]
pub fn upsert_competition(
    conn: &mut DbConn,
    code: &str,
    name: &str,
    tier: &str,
    status: &str,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    venue: Option<&str>,
) -> Result<Competition> {
    if let Some(existing) = find_by_code(conn, code)? {
        return Ok(existing);
    }

    let sql = format!(
        "INSERT INTO competitions (code, name, tier, status, start_date, end_date, venue) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {COLUMNS}"
    );
    conn.query_row(
        &sql,
        params![code, name, tier, status, start_date, end_date, venue],
        parse_competition_row,
    )
    .context("Failed to insert competition")
}

pub fn find_by_code(conn: &mut DbConn, code: &str) -> Result<Option<Competition>> {
    let sql = format!("SELECT {COLUMNS} FROM competitions WHERE code = ?1");

    conn.query_row(&sql, params![code], parse_competition_row)
        .optional()
        .context("Failed to query competition by code")
}

pub fn list_all(conn: &mut DbConn) -> Result<Vec<Competition>> {
    let sql = format!("SELECT {COLUMNS} FROM competitions ORDER BY start_date");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_competition_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

fn parse_competition_row(row: &rusqlite::Row) -> rusqlite::Result<Competition> {
    Ok(Competition {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        tier: row.get(3)?,
        status: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        venue: row.get(7)?,
        created_at: row.get(8)?,
    })
}
