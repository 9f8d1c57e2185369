use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw record shapes as delivered by the extraction collaborator.
///
/// Everything here is untrusted input: fields are optional or defaulted
/// wherever the feed has been seen to omit them, and nothing is
/// interpreted until the parsers and validators run.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBatch {
    pub competitions: Vec<RawCompetition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCompetition {
    pub code: String,
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub age_bracket: Option<String>,
    #[serde(default)]
    pub participant_count: u32,
    #[serde(default)]
    pub pool_rounds: Vec<RawPoolRound>,
    #[serde(default)]
    pub de_bracket: Option<RawDeBracket>,
    #[serde(default)]
    pub final_ranking: Vec<RawRankingRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPoolRound {
    pub round_number: u32,
    pub pool_number: u32,
    #[serde(default)]
    pub piste: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub referee: Option<String>,
    pub results: Vec<RawPoolRow>,
}

/// One row of a pool score grid. `scores[j]` is this fencer's cell
/// against the fencer in row j: absent, a victory marker, or a loss
/// touch count. Rows may be ragged; missing trailing cells read as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPoolRow {
    pub position: u32,
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub scores: Vec<Option<RawScoreCell>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScoreCell {
    /// "V" for a win marker, "L" for a plain touch count.
    #[serde(rename = "type")]
    pub kind: String,
    pub score: u8,
}

impl RawScoreCell {
    pub fn is_victory(&self) -> bool {
        self.kind.eq_ignore_ascii_case("v")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDeBracket {
    #[serde(default)]
    pub bracket_size: u32,
    #[serde(default)]
    pub participant_count: u32,
    #[serde(default)]
    pub seeding: Vec<RawSeedRow>,
    /// Flat per-round elimination entries, earliest round first.
    #[serde(default)]
    pub rounds: Vec<RawRound>,
    /// Pre-paired bouts, when the feed provides them instead of rounds.
    #[serde(default)]
    pub bouts: Vec<RawDeBout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSeedRow {
    pub seed: u32,
    pub name: String,
    #[serde(default)]
    pub team: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRound {
    #[serde(default)]
    pub name: Option<String>,
    pub round_order: u32,
    pub entries: Vec<RawRoundEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRoundEntry {
    pub seed: u32,
    pub name: String,
    #[serde(default)]
    pub team: String,
    /// Touch count recorded against the opponent in this round, if listed.
    #[serde(default)]
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDeBout {
    #[serde(default)]
    pub round: Option<String>,
    pub round_order: u32,
    pub match_number: u32,
    pub player1: Option<RawBoutSlot>,
    #[serde(default)]
    pub player2: Option<RawBoutSlot>,
    #[serde(default)]
    pub winner_seed: Option<u32>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_bye: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBoutSlot {
    pub seed: u32,
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRankingRow {
    pub rank: u32,
    pub name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
}
