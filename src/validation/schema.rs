use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::config::settings::ValidationSettings;
use crate::domain::raw::{RawCompetition, RawEvent};
use crate::domain::{Gender, Weapon};
use crate::validation::{Severity, ValidationReport};

static TIME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}$").expect("valid time regex"));

static CONTAINS_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("valid regex"));

/// Field-level checks that need no cross-record context. Any critical
/// finding here rejects the record before the business pass runs.
pub fn validate_competition(raw: &RawCompetition, today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::new();

    if raw.code.trim().is_empty() {
        report.add("S001", Severity::Critical, "code", "competition code is empty");
    }
    if raw.name.trim().is_empty() {
        report.add("S002", Severity::Critical, "name", "competition name is empty");
    }
    if raw.start_date > today {
        report.add(
            "S003",
            Severity::Critical,
            "start_date",
            format!("start date {} is in the future", raw.start_date),
        );
    }
    if let Some(end) = raw.end_date {
        if end < raw.start_date {
            report.add(
                "S004",
                Severity::High,
                "end_date",
                format!("end date {} precedes start date {}", end, raw.start_date),
            );
        }
    }

    report
}

pub fn validate_event(raw: &RawEvent, settings: &ValidationSettings) -> ValidationReport {
    let mut report = ValidationReport::new();
    let field = |name: &str| format!("event {}: {}", raw.code, name);

    match &raw.weapon {
        Some(value) if Weapon::parse(value).is_none() => {
            report.add(
                "S010",
                Severity::Critical,
                field("weapon"),
                format!("unrecognized weapon {value:?}"),
            );
        }
        None => report.add("S010", Severity::Critical, field("weapon"), "weapon missing"),
        _ => {}
    }

    match &raw.gender {
        Some(value) if Gender::parse(value).is_none() => {
            report.add(
                "S011",
                Severity::Critical,
                field("gender"),
                format!("unrecognized gender {value:?}"),
            );
        }
        None => report.add("S011", Severity::Critical, field("gender"), "gender missing"),
        _ => {}
    }

    for row in &raw.final_ranking {
        if row.rank == 0 {
            report.add(
                "S012",
                Severity::Critical,
                field("final_ranking"),
                format!("non-positive rank for {}", row.name),
            );
        }
        check_name(&mut report, &field("final_ranking"), &row.name, settings);
    }

    for round in &raw.pool_rounds {
        if let Some(time) = &round.time {
            if !TIME_FORMAT.is_match(time) {
                report.add(
                    "S013",
                    Severity::Low,
                    field("pool time"),
                    format!("unexpected time format {time:?}"),
                );
            }
        }
        for row in &round.results {
            check_name(&mut report, &field("pool"), &row.name, settings);
            for cell in row.scores.iter().flatten() {
                if cell.score > settings.max_pool_touches {
                    report.add(
                        "S014",
                        Severity::Medium,
                        field("pool score"),
                        format!("{} touches by {} exceeds pool maximum", cell.score, row.name),
                    );
                }
            }
        }
    }

    if let Some(bracket) = &raw.de_bracket {
        for round in &bracket.rounds {
            for entry in &round.entries {
                if let Some(score) = entry.score {
                    if score > settings.max_de_touches {
                        report.add(
                            "S015",
                            Severity::Medium,
                            field("elimination score"),
                            format!("{score} touches by {} exceeds bout maximum", entry.name),
                        );
                    }
                }
            }
        }
    }

    report
}

fn check_name(
    report: &mut ValidationReport,
    field: &str,
    name: &str,
    settings: &ValidationSettings,
) {
    if name.trim().is_empty() {
        report.add("S020", Severity::Critical, field, "empty player name");
        return;
    }
    if CONTAINS_DIGIT.is_match(name) {
        report.add(
            "S021",
            Severity::Low,
            field,
            format!("player name {name:?} contains digits"),
        );
    }
    if name.chars().count() > settings.max_name_chars {
        report.add(
            "S022",
            Severity::Low,
            field,
            format!("player name {name:?} is unusually long"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Decision;

    fn settings() -> ValidationSettings {
        ValidationSettings::default()
    }

    fn competition() -> RawCompetition {
        RawCompetition {
            code: "C1".into(),
            name: "전국선수권".into(),
            start_date: "2025-05-01".parse().unwrap(),
            end_date: None,
            venue: None,
            tier: None,
            events: vec![],
        }
    }

    fn today() -> NaiveDate {
        "2025-06-01".parse().unwrap()
    }

    #[test]
    fn clean_competition_is_accepted() {
        let report = validate_competition(&competition(), today());
        assert_eq!(report.decision(), Decision::Accept);
    }

    #[test]
    fn future_start_date_rejects() {
        let mut raw = competition();
        raw.start_date = "2027-01-01".parse().unwrap();
        let report = validate_competition(&raw, today());
        assert_eq!(report.decision(), Decision::Reject);
    }

    #[test]
    fn missing_weapon_rejects_the_event() {
        let raw = RawEvent {
            code: "E1".into(),
            name: "에뻬".into(),
            weapon: None,
            gender: Some("여".into()),
            category: None,
            age_bracket: None,
            participant_count: 0,
            pool_rounds: vec![],
            de_bracket: None,
            final_ranking: vec![],
        };
        assert_eq!(
            validate_event(&raw, &settings()).decision(),
            Decision::Reject
        );
    }

    #[test]
    fn digit_in_name_only_warns() {
        let mut report = ValidationReport::new();
        check_name(&mut report, "pool", "김철수2", &settings());
        assert_eq!(report.decision(), Decision::AcceptWithWarning);
    }
}
