use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Arena-style player identifier assigned by the identity registry.
pub type PlayerId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weapon {
    Foil,
    Epee,
    Sabre,
}

impl Weapon {
    /// Parse a raw feed value. Korean and English spellings both occur.
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "foil" | "fl" | "플러레" | "플뢰레" | "플로레" => Some(Weapon::Foil),
            "epee" | "ep" | "에뻬" | "에페" => Some(Weapon::Epee),
            "sabre" | "saber" | "sa" | "사브르" | "세이버" => Some(Weapon::Sabre),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weapon::Foil => "foil",
            Weapon::Epee => "epee",
            Weapon::Sabre => "sabre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "m" | "male" | "men" | "남" | "남자" | "남성" => Some(Gender::Male),
            "f" | "female" | "women" | "여" | "여자" | "여성" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Age brackets in competitive order. The ordering backs the
/// no-regression invariant: a player's bracket only ever advances.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AgeBracket {
    Y8,
    Y10,
    Y12,
    Y14,
    Cadet,
    Junior,
    Senior,
}

impl AgeBracket {
    /// Fixed ranking weight, increasing from youngest to senior.
    pub fn weight(&self) -> f64 {
        match self {
            AgeBracket::Y8 => 0.4,
            AgeBracket::Y10 => 0.5,
            AgeBracket::Y12 => 0.6,
            AgeBracket::Y14 => 0.7,
            AgeBracket::Cadet => 0.8,
            AgeBracket::Junior => 0.9,
            AgeBracket::Senior => 1.0,
        }
    }

    /// Parse global codes, legacy codes and Korean labels from the feed.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Y8" | "E1" | "초등1-2" => Some(AgeBracket::Y8),
            "Y10" | "E2" | "초등3-4" => Some(AgeBracket::Y10),
            "Y12" | "E3" | "초등5-6" | "초등" | "초등부" => Some(AgeBracket::Y12),
            "Y14" | "MS" | "중등" | "중등부" => Some(AgeBracket::Y14),
            "Cadet" | "HS" | "고등" | "고등부" => Some(AgeBracket::Cadet),
            "Junior" | "UNI" | "대학" | "대학부" => Some(AgeBracket::Junior),
            "Senior" | "SR" | "일반" | "일반부" | "시니어" => Some(AgeBracket::Senior),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::Y8 => "Y8",
            AgeBracket::Y10 => "Y10",
            AgeBracket::Y12 => "Y12",
            AgeBracket::Y14 => "Y14",
            AgeBracket::Cadet => "Cadet",
            AgeBracket::Junior => "Junior",
            AgeBracket::Senior => "Senior",
        }
    }
}

/// Competition prestige classification used to scale ranking points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    S,
    A,
    B,
    C,
    D,
}

impl Tier {
    pub fn base_points(&self) -> f64 {
        match self {
            Tier::S => 1000.0,
            Tier::A => 800.0,
            Tier::B => 500.0,
            Tier::C => 300.0,
            Tier::D => 400.0,
        }
    }

    /// Classify a competition by name keywords. Falls back to C (club/open).
    pub fn classify(competition_name: &str) -> Self {
        let name = competition_name;
        if ["전국체전", "회장배", "대통령배"]
            .iter()
            .any(|k| name.contains(k))
        {
            return Tier::S;
        }
        if ["선수권", "챔피언십", "Championship"]
            .iter()
            .any(|k| name.contains(k))
        {
            return Tier::A;
        }
        if ["인터내셔널", "International", "국제"]
            .iter()
            .any(|k| name.contains(k))
        {
            return Tier::D;
        }
        if ["협회장배", "도지사배", "시장배", "시도대항"]
            .iter()
            .any(|k| name.contains(k))
        {
            return Tier::B;
        }
        Tier::C
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "S" => Some(Tier::S),
            "A" => Some(Tier::A),
            "B" => Some(Tier::B),
            "C" => Some(Tier::C),
            "D" => Some(Tier::D),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::S => "S",
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionStatus {
    Scheduled,
    Active,
    Completed,
}

impl CompetitionStatus {
    /// Derived from the date range; single-day competitions use the
    /// start date as their end date.
    pub fn derive(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let end = end.unwrap_or(start);
        if end < today {
            CompetitionStatus::Completed
        } else if start > today {
            CompetitionStatus::Scheduled
        } else {
            CompetitionStatus::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionStatus::Scheduled => "scheduled",
            CompetitionStatus::Active => "active",
            CompetitionStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    Individual,
    Team,
}

impl EventCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "individual" | "개인" | "개인전" => Some(EventCategory::Individual),
            "team" | "단체" | "단체전" => Some(EventCategory::Team),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Individual => "individual",
            EventCategory::Team => "team",
        }
    }
}

/// How a bout ended. Non-completed variants always carry an explicit
/// winner on the bout itself; the variant only records why no full score
/// pair exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoutOutcome {
    Completed { winner_score: u8, loser_score: u8 },
    Walkover,
    Forfeit,
    Disqualification,
    Penalty,
}

impl BoutOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, BoutOutcome::Completed { .. })
    }

    pub fn code(&self) -> &'static str {
        match self {
            BoutOutcome::Completed { .. } => "V",
            BoutOutcome::Walkover => "W",
            BoutOutcome::Forfeit => "F",
            BoutOutcome::Disqualification => "D",
            BoutOutcome::Penalty => "P",
        }
    }
}

/// Which side of a bout a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    First,
    Second,
}

/// A (name, team) sighting before identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub team: String,
}

/// One round-robin bout derived from a pool score matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolBout {
    pub round_number: u32,
    pub pool_number: u32,
    pub first: Participant,
    pub second: Participant,
    pub winner: Side,
    pub outcome: BoutOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededEntry {
    pub seed: u32,
    pub name: String,
    pub team: String,
}

/// One slot of a direct-elimination bout. `score` is the touch count this
/// fencer recorded against the opponent, when the source listed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeSlot {
    pub seed: u32,
    pub name: String,
    pub team: String,
    pub score: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeBout {
    /// Tableau size of the round this bout belongs to (16 for round of 16).
    pub round_size: u32,
    /// 1-based position of the round, starting round first.
    pub round_order: u32,
    /// Assigned by source order within the round, not recomputed.
    pub match_number: u32,
    pub first: DeSlot,
    pub second: Option<DeSlot>,
    pub winner_seed: u32,
    pub is_completed: bool,
    pub is_bye: bool,
}

impl DeBout {
    pub fn loser(&self) -> Option<&DeSlot> {
        let second = self.second.as_ref()?;
        if self.first.seed == self.winner_seed {
            Some(second)
        } else {
            Some(&self.first)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketRound {
    pub size: u32,
    pub label: String,
    pub bouts: Vec<DeBout>,
}

/// A reconstructed direct-elimination bracket. Slot counts are always a
/// power of two; unfilled slots surface as explicit bye bouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bracket {
    pub bracket_size: u32,
    pub participant_count: u32,
    pub seeding: Vec<SeededEntry>,
    pub rounds: Vec<BracketRound>,
}

impl Bracket {
    pub fn bye_count(&self) -> usize {
        self.rounds
            .iter()
            .flat_map(|r| r.bouts.iter())
            .filter(|b| b.is_bye)
            .count()
    }

    pub fn starting_round_label(&self) -> Option<&str> {
        self.rounds.first().map(|r| r.label.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalRankingEntry {
    pub rank: u32,
    pub player: Participant,
}

/// Per-competition ranking points with the four multiplicative factors
/// retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingPointRecord {
    pub player_id: PlayerId,
    pub weapon: Weapon,
    pub gender: Gender,
    pub age_bracket: AgeBracket,
    pub competition_name: String,
    pub competition_date: NaiveDate,
    pub rank: u32,
    pub base_points: f64,
    pub rank_ratio: f64,
    pub participant_factor: f64,
    pub age_weight: f64,
    pub points: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_parses_both_scripts() {
        assert_eq!(Weapon::parse("에뻬"), Some(Weapon::Epee));
        assert_eq!(Weapon::parse("에페"), Some(Weapon::Epee));
        assert_eq!(Weapon::parse("Foil"), Some(Weapon::Foil));
        assert_eq!(Weapon::parse("수영"), None);
    }

    #[test]
    fn age_brackets_are_ordered() {
        assert!(AgeBracket::Y8 < AgeBracket::Y14);
        assert!(AgeBracket::Cadet < AgeBracket::Senior);
        assert!(AgeBracket::Senior.weight() > AgeBracket::Cadet.weight());
    }

    #[test]
    fn tier_classification_falls_back_to_club() {
        assert_eq!(Tier::classify("제50회 전국체전 펜싱"), Tier::S);
        assert_eq!(Tier::classify("전국선수권대회"), Tier::A);
        assert_eq!(Tier::classify("익산 International Open"), Tier::D);
        assert_eq!(Tier::classify("동네 오픈"), Tier::C);
    }
}
