use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::config::settings::RankingSettings;
use crate::domain::{PlayerId, RankingPointRecord};
use crate::ranking::points::round2;

/// One leaderboard row. Medal and entry counts are computed over the
/// same window as the points and drive the tie-breaks.
#[derive(Debug, Clone)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub total_points: f64,
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
    pub competitions: u32,
    pub last_competition: NaiveDate,
}

fn in_window(record: &RankingPointRecord, as_of: NaiveDate, window_days: i64) -> bool {
    record.competition_date <= as_of
        && record.competition_date > as_of - Duration::days(window_days)
}

/// Best-N total for one player's records in one category. Pure; feeding
/// the same records twice changes nothing.
pub fn rolling_total(
    records: &[RankingPointRecord],
    as_of: NaiveDate,
    settings: &RankingSettings,
) -> f64 {
    let mut in_range: Vec<f64> = records
        .iter()
        .filter(|r| in_window(r, as_of, settings.rolling_window_days))
        .map(|r| r.points)
        .collect();

    in_range.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    round2(in_range.iter().take(settings.best_n).sum())
}

/// Build a sorted leaderboard from point records of one (weapon, gender,
/// age bracket) category. Ordering: points, then gold, silver, bronze,
/// entries, most recent competition.
pub fn build_leaderboard(
    records: &[RankingPointRecord],
    names: &HashMap<PlayerId, String>,
    as_of: NaiveDate,
    settings: &RankingSettings,
) -> Vec<PlayerStanding> {
    let mut per_player: HashMap<PlayerId, Vec<&RankingPointRecord>> = HashMap::new();
    for record in records {
        if in_window(record, as_of, settings.rolling_window_days) {
            per_player.entry(record.player_id).or_default().push(record);
        }
    }

    let mut standings: Vec<PlayerStanding> = per_player
        .into_iter()
        .map(|(player_id, rows)| {
            let owned: Vec<RankingPointRecord> = rows.iter().map(|&r| r.clone()).collect();
            let last = rows
                .iter()
                .map(|r| r.competition_date)
                .max()
                .unwrap_or(as_of);
            PlayerStanding {
                player_id,
                name: names.get(&player_id).cloned().unwrap_or_default(),
                total_points: rolling_total(&owned, as_of, settings),
                gold: rows.iter().filter(|r| r.rank == 1).count() as u32,
                silver: rows.iter().filter(|r| r.rank == 2).count() as u32,
                bronze: rows.iter().filter(|r| r.rank == 3).count() as u32,
                competitions: rows.len() as u32,
                last_competition: last,
            }
        })
        .collect();

    standings.sort_by(compare_standings);
    standings.truncate(settings.leaderboard_size);
    standings
}

fn compare_standings(a: &PlayerStanding, b: &PlayerStanding) -> Ordering {
    b.total_points
        .partial_cmp(&a.total_points)
        .unwrap_or(Ordering::Equal)
        .then(b.gold.cmp(&a.gold))
        .then(b.silver.cmp(&a.silver))
        .then(b.bronze.cmp(&a.bronze))
        .then(b.competitions.cmp(&a.competitions))
        .then(b.last_competition.cmp(&a.last_competition))
}

/// Operator-facing table for the `rankings` subcommand.
pub fn format_leaderboard(standings: &[PlayerStanding]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<5} {:<20} {:>9} {:>4} {:>4} {:>4} {:>6}\n",
        "Rank", "Player", "Points", "G", "S", "B", "Comps"
    ));
    for (idx, s) in standings.iter().enumerate() {
        out.push_str(&format!(
            "{:<5} {:<20} {:>9.2} {:>4} {:>4} {:>4} {:>6}\n",
            idx + 1,
            s.name,
            s.total_points,
            s.gold,
            s.silver,
            s.bronze,
            s.competitions
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgeBracket, Gender, Weapon};

    fn record(player_id: PlayerId, date: &str, rank: u32, points: f64) -> RankingPointRecord {
        RankingPointRecord {
            player_id,
            weapon: Weapon::Epee,
            gender: Gender::Female,
            age_bracket: AgeBracket::Senior,
            competition_name: "대회".into(),
            competition_date: date.parse().unwrap(),
            rank,
            base_points: 0.0,
            rank_ratio: 0.0,
            participant_factor: 0.0,
            age_weight: 0.0,
            points,
        }
    }

    fn settings() -> RankingSettings {
        RankingSettings::default()
    }

    #[test]
    fn keeps_best_four_inside_the_window() {
        let as_of: NaiveDate = "2026-01-01".parse().unwrap();
        let records = vec![
            record(1, "2025-03-01", 1, 500.0),
            record(1, "2025-05-01", 2, 400.0),
            record(1, "2025-07-01", 3, 300.0),
            record(1, "2025-09-01", 5, 200.0),
            record(1, "2025-11-01", 9, 100.0),
        ];

        // Five results, only the best four count.
        assert_eq!(rolling_total(&records, as_of, &settings()), 1400.0);
    }

    #[test]
    fn results_outside_twelve_months_drop_off() {
        let records = vec![
            record(1, "2024-06-01", 1, 500.0),
            record(1, "2025-06-01", 2, 400.0),
        ];

        let as_of: NaiveDate = "2025-12-01".parse().unwrap();
        assert_eq!(rolling_total(&records, as_of, &settings()), 400.0);

        let earlier: NaiveDate = "2024-12-01".parse().unwrap();
        assert_eq!(rolling_total(&records, earlier, &settings()), 500.0);
    }

    #[test]
    fn medals_break_point_ties() {
        let as_of: NaiveDate = "2026-01-01".parse().unwrap();
        let records = vec![
            record(1, "2025-05-01", 1, 300.0),
            record(2, "2025-05-01", 2, 300.0),
        ];
        let names = HashMap::from([(1, "금".to_string()), (2, "은".to_string())]);

        let board = build_leaderboard(&records, &names, as_of, &settings());
        assert_eq!(board[0].player_id, 1);
        assert_eq!(board[0].gold, 1);
        assert_eq!(board[1].player_id, 2);
    }

    #[test]
    fn recomputing_is_idempotent() {
        let as_of: NaiveDate = "2026-01-01".parse().unwrap();
        let records = vec![
            record(1, "2025-03-01", 1, 500.0),
            record(1, "2025-05-01", 4, 250.0),
        ];

        let first = rolling_total(&records, as_of, &settings());
        let second = rolling_total(&records, as_of, &settings());
        assert_eq!(first, second);
        assert_eq!(first, 750.0);
    }
}
