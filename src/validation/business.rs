use std::collections::HashSet;

use crate::domain::{Bracket, BoutOutcome, CompetitionStatus, Gender, PlayerId, PoolBout};
use crate::validation::{Severity, ValidationReport};

/// Cross-record checks run after identity resolution, when bout sides
/// are concrete player ids.

const UNOFFICIAL_KEYWORDS: [&str; 5] = ["테스트", "test", "practice", "연습", "친선"];

pub fn check_competition_name(report: &mut ValidationReport, name: &str) {
    let lower = name.to_lowercase();
    if UNOFFICIAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
        report.add(
            "B001",
            Severity::Low,
            "competition name",
            format!("{name:?} looks like an unofficial competition"),
        );
    }
}

/// A completed competition's events must carry a final ranking; without
/// one the event yields no standings and no ranking points.
pub fn check_final_ranking(
    report: &mut ValidationReport,
    status: CompetitionStatus,
    ranking_len: usize,
) {
    if status == CompetitionStatus::Completed && ranking_len == 0 {
        report.add(
            "B007",
            Severity::Critical,
            "final ranking",
            "no final ranking for an event of a completed competition",
        );
    }
}

/// Natural key for a pool bout within one event: round, pool, unordered
/// player pair. A repeat is the same bout reported twice.
pub fn check_duplicate_pool_bouts(
    report: &mut ValidationReport,
    bouts: &[(PoolBout, PlayerId, PlayerId)],
) {
    let mut seen = HashSet::new();
    for (bout, first, second) in bouts {
        let (a, b) = if first <= second {
            (*first, *second)
        } else {
            (*second, *first)
        };
        if !seen.insert((bout.round_number, bout.pool_number, a, b)) {
            report.add(
                "B002",
                Severity::High,
                "pool bouts",
                format!(
                    "duplicate bout between {} and {} in round {} pool {}",
                    bout.first.name, bout.second.name, bout.round_number, bout.pool_number
                ),
            );
        }
    }
}

pub fn check_same_player_bouts(
    report: &mut ValidationReport,
    bouts: &[(PoolBout, PlayerId, PlayerId)],
) {
    for (bout, first, second) in bouts {
        if first == second {
            report.add(
                "B003",
                Severity::Critical,
                "pool bouts",
                format!(
                    "{} is recorded on both sides of a bout in round {} pool {}",
                    bout.first.name, bout.round_number, bout.pool_number
                ),
            );
        }
    }
}

/// Players carry one gender for life; an appearance in the other
/// gender's event is contradictory data, not an update.
pub fn check_event_gender(
    report: &mut ValidationReport,
    event_gender: Gender,
    player_name: &str,
    player_gender: Option<Gender>,
) {
    if let Some(known) = player_gender {
        if known != event_gender {
            report.add(
                "B004",
                Severity::Critical,
                "event gender",
                format!(
                    "{player_name} is recorded as {} but appears in a {} event",
                    known.as_str(),
                    event_gender.as_str()
                ),
            );
        }
    }
}

/// Match numbers are bounded by the bouts a tableau round can hold.
pub fn check_match_numbers(report: &mut ValidationReport, bracket: &Bracket) {
    for round in &bracket.rounds {
        let ceiling = round.size / 2;
        for bout in &round.bouts {
            if bout.match_number > ceiling {
                report.add(
                    "B005",
                    Severity::High,
                    "elimination bouts",
                    format!(
                        "match number {} exceeds the {} bouts of the {}",
                        bout.match_number, ceiling, round.label
                    ),
                );
            }
        }
    }
}

pub fn check_tie_scores(report: &mut ValidationReport, bouts: &[(PoolBout, PlayerId, PlayerId)]) {
    for (bout, _, _) in bouts {
        if let BoutOutcome::Completed {
            winner_score,
            loser_score,
        } = bout.outcome
        {
            if winner_score == loser_score {
                report.add(
                    "B006",
                    Severity::Medium,
                    "pool bouts",
                    format!(
                        "tied score {}:{} between {} and {}",
                        winner_score, loser_score, bout.first.name, bout.second.name
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Participant, Side};
    use crate::validation::Decision;

    fn bout(round: u32, pool: u32, a: &str, b: &str) -> PoolBout {
        PoolBout {
            round_number: round,
            pool_number: pool,
            first: Participant {
                name: a.into(),
                team: String::new(),
            },
            second: Participant {
                name: b.into(),
                team: String::new(),
            },
            winner: Side::First,
            outcome: BoutOutcome::Completed {
                winner_score: 5,
                loser_score: 3,
            },
        }
    }

    #[test]
    fn duplicate_bout_is_flagged_regardless_of_side_order() {
        let mut report = ValidationReport::new();
        let bouts = vec![(bout(1, 1, "가", "나"), 1, 2), (bout(1, 1, "나", "가"), 2, 1)];
        check_duplicate_pool_bouts(&mut report, &bouts);
        assert_eq!(report.findings().len(), 1);
    }

    #[test]
    fn same_player_on_both_sides_rejects() {
        let mut report = ValidationReport::new();
        check_same_player_bouts(&mut report, &[(bout(1, 1, "가", "가"), 7, 7)]);
        assert_eq!(report.decision(), Decision::Reject);
    }

    #[test]
    fn gender_mismatch_rejects() {
        let mut report = ValidationReport::new();
        check_event_gender(&mut report, Gender::Female, "김철수", Some(Gender::Male));
        assert_eq!(report.decision(), Decision::Reject);

        let mut clean = ValidationReport::new();
        check_event_gender(&mut clean, Gender::Female, "김영희", None);
        assert_eq!(clean.decision(), Decision::Accept);
    }

    #[test]
    fn missing_final_ranking_rejects_only_completed_competitions() {
        let mut report = ValidationReport::new();
        check_final_ranking(&mut report, CompetitionStatus::Completed, 0);
        assert_eq!(report.decision(), Decision::Reject);

        let mut active = ValidationReport::new();
        check_final_ranking(&mut active, CompetitionStatus::Active, 0);
        assert_eq!(active.decision(), Decision::Accept);

        let mut filled = ValidationReport::new();
        check_final_ranking(&mut filled, CompetitionStatus::Completed, 8);
        assert_eq!(filled.decision(), Decision::Accept);
    }

    #[test]
    fn unofficial_name_only_warns() {
        let mut report = ValidationReport::new();
        check_competition_name(&mut report, "동호회 친선 대회");
        assert_eq!(report.decision(), Decision::AcceptWithWarning);
    }
}
