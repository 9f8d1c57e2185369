use anyhow::{Context, Result};
use rusqlite::params;

use super::connection::DbConn;
use crate::domain::{AgeBracket, Gender, RankingPointRecord, Weapon};

const COLUMNS: &str = "player_id, weapon, gender, age_bracket, competition_name, \
                       competition_date, rank_position, base_points, rank_ratio, \
                       participant_factor, age_weight, points";

pub fn insert_point_record(
    conn: &mut DbConn,
    event_id: i64,
    record: &RankingPointRecord,
) -> Result<bool> {
    let sql = format!(
        "INSERT OR IGNORE INTO ranking_points (event_id, {COLUMNS}) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
    );
    let changed = conn
        .execute(
            &sql,
            params![
                event_id,
                record.player_id,
                record.weapon.as_str(),
                record.gender.as_str(),
                record.age_bracket.as_str(),
                record.competition_name,
                record.competition_date,
                record.rank,
                record.base_points,
                record.rank_ratio,
                record.participant_factor,
                record.age_weight,
                record.points,
            ],
        )
        .context("Failed to insert ranking point record")?;
    Ok(changed > 0)
}

/// All point records of one (weapon, gender, age bracket) category, the
/// unit the rolling leaderboard is computed over.
pub fn list_by_category(
    conn: &mut DbConn,
    weapon: Weapon,
    gender: Gender,
    age_bracket: AgeBracket,
) -> Result<Vec<RankingPointRecord>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM ranking_points \
         WHERE weapon = ?1 AND gender = ?2 AND age_bracket = ?3 ORDER BY competition_date"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![weapon.as_str(), gender.as_str(), age_bracket.as_str()],
            parse_point_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn count_all(conn: &mut DbConn) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM ranking_points", [], |row| row.get(0))
        .context("Failed to count ranking points")
}

fn parse_point_row(row: &rusqlite::Row) -> rusqlite::Result<RankingPointRecord> {
    let weapon: String = row.get(1)?;
    let gender: String = row.get(2)?;
    let age_bracket: String = row.get(3)?;
    Ok(RankingPointRecord {
        player_id: row.get(0)?,
        weapon: Weapon::parse(&weapon).unwrap_or(Weapon::Epee),
        gender: Gender::parse(&gender).unwrap_or(Gender::Male),
        age_bracket: AgeBracket::parse(&age_bracket).unwrap_or(AgeBracket::Senior),
        competition_name: row.get(4)?,
        competition_date: row.get(5)?,
        rank: row.get(6)?,
        base_points: row.get(7)?,
        rank_ratio: row.get(8)?,
        participant_factor: row.get(9)?,
        age_weight: row.get(10)?,
        points: row.get(11)?,
    })
}
