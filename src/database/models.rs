use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone)]
pub struct Competition {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub tier: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub competition_id: i64,
    pub code: String,
    pub name: String,
    pub weapon: String,
    pub gender: String,
    pub age_bracket: Option<String>,
    pub category: String,
    pub participant_count: i64,
    pub warnings: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct DbPlayer {
    pub id: i64,
    pub name: String,
    pub normalized_name: String,
    pub affiliation: Option<String>,
    pub birth_year: Option<i32>,
    pub gender: Option<String>,
    pub age_bracket: Option<String>,
    pub primary_weapon: Option<String>,
    pub status: String,
    pub redirect_to: Option<i64>,
    pub provisional: bool,
    pub last_seen: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct BoutRow {
    pub id: i64,
    pub event_id: i64,
    pub phase: String,
    pub round_number: i64,
    pub pool_number: i64,
    pub match_number: i64,
    pub first_player_id: i64,
    pub second_player_id: Option<i64>,
    pub winner_player_id: i64,
    pub winner_score: Option<i64>,
    pub loser_score: Option<i64>,
    pub outcome: String,
    pub is_bye: bool,
    pub date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct FinalRankingRow {
    pub id: i64,
    pub event_id: i64,
    pub player_id: i64,
    pub rank_position: i64,
}
