use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use log::{error, info, warn};

use crate::cache::Cache;
use crate::config::settings::AppConfig;
use crate::database::{self, DbConn, DbPool};
use crate::domain::raw::{RawBatch, RawCompetition, RawEvent};
use crate::domain::{
    AgeBracket, Bracket, CompetitionStatus, EventCategory, Gender, PlayerId, PoolBout, Side, Tier,
    Weapon,
};
use crate::errors::PipelineError;
use crate::identity::{Registry, Sighting};
use crate::ranking;
use crate::validation::{business, schema, Decision, ValidationMetrics, ValidationReport};
use crate::{bracket, pool};

/// Counters reported at the end of a batch run.
#[derive(Debug, Default, Clone)]
pub struct BatchSummary {
    pub competitions: usize,
    pub events_committed: usize,
    pub events_rejected: usize,
    pub bouts_inserted: usize,
    pub bouts_skipped: usize,
    pub rankings_inserted: usize,
    pub points_inserted: usize,
    pub conflicts: usize,
}

pub struct PipelineService {
    config: AppConfig,
    cache: Cache,
}

impl PipelineService {
    pub fn new(config: AppConfig) -> Result<Self> {
        Ok(Self {
            config,
            cache: Cache::new("cache")?,
        })
    }

    pub async fn run(&self) -> Result<()> {
        let db_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "fencing_ranking.db".to_string());

        info!("=== Starting batch processing ===");
        info!("Target DB: {db_path}");

        let pool = database::create_pool(&db_path)?;
        let competitions = self.load_competitions()?;
        info!("Loaded {} competitions from cache", competitions.len());

        let summary = process_batch(&pool, &self.config, competitions).await?;
        info!(
            "=== Batch complete: {}/{} events committed, {} bouts, {} ranking rows, \
             {} point records, {} identity conflicts ===",
            summary.events_committed,
            summary.events_committed + summary.events_rejected,
            summary.bouts_inserted,
            summary.rankings_inserted,
            summary.points_inserted,
            summary.conflicts
        );
        Ok(())
    }

    fn load_competitions(&self) -> Result<Vec<RawCompetition>> {
        let mut competitions = Vec::new();
        for key in self.cache.list_parsed()? {
            if let Some(batch) = self.cache.load_parsed::<RawBatch>(&key)? {
                competitions.extend(batch.competitions);
            }
        }
        Ok(competitions)
    }
}

/// Run one batch against the given pool. Parsing fans out to blocking
/// tasks; identity resolution and commits stay on this task, so there is
/// exactly one writer.
pub async fn process_batch(
    pool: &DbPool,
    config: &AppConfig,
    competitions: Vec<RawCompetition>,
) -> Result<BatchSummary> {
    let mut conn = database::get_connection(pool)?;
    database::setup::init_database(&mut conn)?;

    let today = Utc::now().date_naive();
    let mut metrics = ValidationMetrics::new();
    let mut summary = BatchSummary::default();

    // Seed the registry from the players table so ids assigned in
    // earlier runs stay authoritative.
    let mut registry = Registry::new(&config.identity);
    registry.hydrate(&database::players::list_all(&mut conn)?)?;

    for competition in competitions {
        summary.competitions += 1;

        let comp_report = schema::validate_competition(&competition, today);
        metrics.record_schema(&comp_report);
        comp_report.log(&competition.code);
        if comp_report.decision() == Decision::Reject {
            warn!(
                "{}",
                PipelineError::validation(format!(
                    "competition {} rejected by schema validation",
                    competition.code
                ))
            );
            summary.events_rejected += competition.events.len();
            continue;
        }

        let tier = competition
            .tier
            .as_deref()
            .and_then(Tier::parse)
            .unwrap_or_else(|| Tier::classify(&competition.name));

        let status =
            CompetitionStatus::derive(competition.start_date, competition.end_date, today);
        let db_comp = database::competitions::upsert_competition(
            &mut conn,
            &competition.code,
            &competition.name,
            tier.as_str(),
            status.as_str(),
            competition.start_date,
            competition.end_date,
            competition.venue.as_deref(),
        )?;

        for outcome in parse_events(&competition).await {
            match outcome {
                Err(err) => {
                    error!("{err}");
                    summary.events_rejected += 1;
                }
                Ok(parsed) => {
                    let committed = commit_event(
                        &mut conn,
                        config,
                        &mut registry,
                        &mut metrics,
                        &competition,
                        db_comp.id,
                        tier,
                        status,
                        parsed,
                    )?;
                    match committed {
                        Some(stats) => {
                            summary.events_committed += 1;
                            summary.bouts_inserted += stats.bouts;
                            summary.bouts_skipped += stats.skipped;
                            summary.rankings_inserted += stats.rankings;
                            summary.points_inserted += stats.points;
                        }
                        None => summary.events_rejected += 1,
                    }
                }
            }
        }
    }

    // Write final registry state so merge redirects and late profile
    // updates land in the players table.
    for record in registry.players() {
        database::players::sync_player(&mut conn, record)?;
    }

    summary.conflicts = registry.conflicts().len();
    for conflict in registry.conflicts() {
        warn!(
            "unresolved: {}; results held on provisional player {}",
            PipelineError::conflict(&conflict.name, &conflict.reason),
            conflict.provisional
        );
    }
    metrics.log_summary();

    Ok(summary)
}

struct ParsedEvent {
    raw: RawEvent,
    pool_bouts: Vec<PoolBout>,
    bracket: Option<Bracket>,
}

/// Parse every event of one competition in parallel. Each task is pure
/// CPU work on its own copy of the raw data.
async fn parse_events(
    competition: &RawCompetition,
) -> Vec<Result<ParsedEvent, PipelineError>> {
    let mut handles = Vec::with_capacity(competition.events.len());
    for event in competition.events.clone() {
        let code = format!("{}/{}", competition.code, event.code);
        handles.push(tokio::task::spawn_blocking(move || {
            parse_event(&code, event)
        }));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(join_err) => outcomes.push(Err(PipelineError::parse(
                &competition.code,
                format!("parser task failed: {join_err}"),
            ))),
        }
    }
    outcomes
}

fn parse_event(code: &str, raw: RawEvent) -> Result<ParsedEvent, PipelineError> {
    let mut pool_bouts = Vec::new();
    for round in &raw.pool_rounds {
        pool_bouts.extend(pool::parse_pool_round(code, round)?);
    }

    let bracket = match &raw.de_bracket {
        Some(raw_bracket) => Some(bracket::reconstruct(code, raw_bracket)?),
        None => None,
    };

    Ok(ParsedEvent {
        raw,
        pool_bouts,
        bracket,
    })
}

#[derive(Default)]
struct EventStats {
    bouts: usize,
    /// Bouts whose natural key was already stored, normal on re-ingestion.
    skipped: usize,
    rankings: usize,
    points: usize,
}

/// Validate, resolve and commit one parsed event. Returns None when the
/// event was rejected; the transaction guarantees nothing partial is
/// visible in that case.
#[allow(clippy::too_many_arguments)]
fn commit_event(
    conn: &mut DbConn,
    config: &AppConfig,
    registry: &mut Registry,
    metrics: &mut ValidationMetrics,
    competition: &RawCompetition,
    competition_id: i64,
    tier: Tier,
    status: CompetitionStatus,
    parsed: ParsedEvent,
) -> Result<Option<EventStats>> {
    let raw = &parsed.raw;
    let code = format!("{}/{}", competition.code, raw.code);

    let schema_report = schema::validate_event(raw, &config.validation);
    metrics.record_schema(&schema_report);
    schema_report.log(&code);
    if schema_report.decision() == Decision::Reject {
        warn!(
            "{}",
            PipelineError::validation(format!("event {code} rejected by schema validation"))
        );
        return Ok(None);
    }

    // Both are guaranteed parseable once the schema pass accepts.
    let (Some(weapon), Some(gender)) = (
        raw.weapon.as_deref().and_then(Weapon::parse),
        raw.gender.as_deref().and_then(Gender::parse),
    ) else {
        return Ok(None);
    };
    let age_bracket = raw.age_bracket.as_deref().and_then(AgeBracket::parse);
    let category = raw
        .category
        .as_deref()
        .and_then(EventCategory::parse)
        .unwrap_or(EventCategory::Individual);
    let date = competition.start_date;

    let resolved_pool: Vec<(PoolBout, PlayerId, PlayerId)> = parsed
        .pool_bouts
        .into_iter()
        .map(|bout| {
            let first = resolve_id(registry, &bout.first.name, &bout.first.team, None, weapon, gender, age_bracket, date);
            let second = resolve_id(registry, &bout.second.name, &bout.second.team, None, weapon, gender, age_bracket, date);
            (bout, first, second)
        })
        .collect();

    let seed_ids: HashMap<u32, PlayerId> = parsed
        .bracket
        .as_ref()
        .map(|b| {
            b.seeding
                .iter()
                .map(|s| {
                    (
                        s.seed,
                        resolve_id(registry, &s.name, &s.team, None, weapon, gender, age_bracket, date),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let resolved_ranking: Vec<(u32, PlayerId)> = raw
        .final_ranking
        .iter()
        .map(|row| {
            (
                row.rank,
                resolve_id(registry, &row.name, &row.team, row.birth_year, weapon, gender, age_bracket, date),
            )
        })
        .collect();

    let mut business_report = ValidationReport::new();
    business::check_competition_name(&mut business_report, &competition.name);
    business::check_final_ranking(&mut business_report, status, resolved_ranking.len());
    business::check_duplicate_pool_bouts(&mut business_report, &resolved_pool);
    business::check_same_player_bouts(&mut business_report, &resolved_pool);
    business::check_tie_scores(&mut business_report, &resolved_pool);
    if let Some(b) = &parsed.bracket {
        business::check_match_numbers(&mut business_report, b);
    }
    for (_, player_id) in &resolved_ranking {
        if let Some(record) = registry.get(*player_id) {
            business::check_event_gender(
                &mut business_report,
                gender,
                &record.display_name,
                record.gender,
            );
        }
    }

    metrics.record_business(&business_report);
    business_report.log(&code);
    if business_report.decision() == Decision::Reject {
        warn!(
            "{}",
            PipelineError::validation(format!("event {code} rejected by business validation"))
        );
        return Ok(None);
    }

    let mut combined = schema_report;
    combined.merge(business_report);
    let warnings = combined.warnings();
    let warnings_json = if warnings.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&warnings).context("Failed to serialize warnings")?)
    };

    let participant_count = effective_participant_count(raw, &resolved_pool);

    conn.execute_batch("BEGIN")
        .context("Failed to begin event transaction")?;
    let written = write_event(
        conn,
        registry,
        competition_id,
        raw,
        weapon,
        gender,
        age_bracket,
        category,
        tier,
        competition,
        participant_count,
        warnings_json.as_deref(),
        &resolved_pool,
        &seed_ids,
        parsed.bracket.as_ref(),
        &resolved_ranking,
    );
    match written {
        Ok(stats) => {
            conn.execute_batch("COMMIT")
                .context("Failed to commit event transaction")?;
            if stats.skipped > 0 {
                warn!("event {code}: {} bouts already recorded, skipped", stats.skipped);
            }
            Ok(Some(stats))
        }
        Err(err) => {
            conn.execute_batch("ROLLBACK")
                .context("Failed to roll back event transaction")?;
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_id(
    registry: &mut Registry,
    name: &str,
    team: &str,
    birth_year: Option<i32>,
    weapon: Weapon,
    gender: Gender,
    age_bracket: Option<AgeBracket>,
    date: NaiveDate,
) -> PlayerId {
    registry
        .resolve(&Sighting {
            name: name.to_string(),
            affiliation: team.to_string(),
            birth_year,
            weapon: Some(weapon),
            gender: Some(gender),
            age_bracket,
            date,
        })
        .player_id()
}

fn effective_participant_count(
    raw: &RawEvent,
    resolved_pool: &[(PoolBout, PlayerId, PlayerId)],
) -> u32 {
    if raw.participant_count > 0 {
        return raw.participant_count;
    }
    if !raw.final_ranking.is_empty() {
        return raw.final_ranking.len() as u32;
    }
    let mut ids: Vec<PlayerId> = resolved_pool
        .iter()
        .flat_map(|(_, a, b)| [*a, *b])
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len() as u32
}

#[allow(clippy::too_many_arguments)]
fn write_event(
    conn: &mut DbConn,
    registry: &Registry,
    competition_id: i64,
    raw: &RawEvent,
    weapon: Weapon,
    gender: Gender,
    age_bracket: Option<AgeBracket>,
    category: EventCategory,
    tier: Tier,
    competition: &RawCompetition,
    participant_count: u32,
    warnings_json: Option<&str>,
    resolved_pool: &[(PoolBout, PlayerId, PlayerId)],
    seed_ids: &HashMap<u32, PlayerId>,
    de_bracket: Option<&Bracket>,
    resolved_ranking: &[(u32, PlayerId)],
) -> Result<EventStats> {
    let event = database::events::upsert_event(
        conn,
        competition_id,
        &raw.code,
        &raw.name,
        weapon.as_str(),
        gender.as_str(),
        age_bracket.map(|b| b.as_str()),
        category.as_str(),
        participant_count as i64,
        warnings_json,
    )?;

    // Players must exist before bouts reference them.
    let mut touched: Vec<PlayerId> = resolved_pool
        .iter()
        .flat_map(|(_, a, b)| [*a, *b])
        .chain(seed_ids.values().copied())
        .chain(resolved_ranking.iter().map(|(_, id)| *id))
        .collect();
    touched.sort_unstable();
    touched.dedup();
    for id in touched {
        if let Some(record) = registry.get(id) {
            database::players::sync_player(conn, record)?;
        }
    }

    let mut stats = EventStats::default();
    let date = competition.start_date;

    for (bout, first, second) in resolved_pool {
        let winner = match bout.winner {
            Side::First => *first,
            Side::Second => *second,
        };
        if database::bouts::insert_pool_bout(conn, event.id, bout, *first, *second, winner, date)? {
            stats.bouts += 1;
        } else {
            stats.skipped += 1;
        }
    }

    if let Some(bracket) = de_bracket {
        for round in &bracket.rounds {
            for bout in &round.bouts {
                let Some(&first) = seed_ids.get(&bout.first.seed) else {
                    continue;
                };
                let second = bout.second.as_ref().and_then(|s| seed_ids.get(&s.seed)).copied();
                let Some(&winner) = seed_ids.get(&bout.winner_seed) else {
                    continue;
                };
                if database::bouts::insert_de_bout(conn, event.id, bout, first, second, winner, date)? {
                    stats.bouts += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }
    }

    let point_bracket = age_bracket.unwrap_or(AgeBracket::Senior);
    for &(rank, player_id) in resolved_ranking {
        if database::rankings::insert_final_ranking(conn, event.id, player_id, rank)? {
            stats.rankings += 1;
        }

        let record = build_point_record(
            player_id,
            weapon,
            gender,
            point_bracket,
            competition,
            tier,
            rank,
            participant_count,
        );
        if database::points::insert_point_record(conn, event.id, &record)? {
            stats.points += 1;
        }
    }

    Ok(stats)
}

#[allow(clippy::too_many_arguments)]
fn build_point_record(
    player_id: PlayerId,
    weapon: Weapon,
    gender: Gender,
    age_bracket: AgeBracket,
    competition: &RawCompetition,
    tier: Tier,
    rank: u32,
    participant_count: u32,
) -> crate::domain::RankingPointRecord {
    crate::domain::RankingPointRecord {
        player_id,
        weapon,
        gender,
        age_bracket,
        competition_name: competition.name.clone(),
        competition_date: competition.start_date,
        rank,
        base_points: tier.base_points(),
        rank_ratio: ranking::rank_ratio(rank),
        participant_factor: ranking::participant_factor(participant_count),
        age_weight: age_bracket.weight(),
        points: ranking::calculate_points(tier, rank, participant_count, age_bracket),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::raw::{RawPoolRound, RawPoolRow, RawRankingRow, RawScoreCell};

    fn v(score: u8) -> Option<RawScoreCell> {
        Some(RawScoreCell {
            kind: "V".into(),
            score,
        })
    }

    fn l(score: u8) -> Option<RawScoreCell> {
        Some(RawScoreCell {
            kind: "L".into(),
            score,
        })
    }

    fn pool_row(position: u32, name: &str, scores: Vec<Option<RawScoreCell>>) -> RawPoolRow {
        RawPoolRow {
            position,
            name: name.into(),
            team: "서울클럽".into(),
            scores,
        }
    }

    fn ranking_row(rank: u32, name: &str) -> RawRankingRow {
        RawRankingRow {
            rank,
            name: name.into(),
            team: "서울클럽".into(),
            birth_year: None,
        }
    }

    fn roster_competition(code: &str, names: [&str; 3]) -> RawCompetition {
        RawCompetition {
            code: code.into(),
            name: "전국선수권대회".into(),
            start_date: "2025-05-10".parse().unwrap(),
            end_date: None,
            venue: Some("서울".into()),
            tier: None,
            events: vec![RawEvent {
                code: "WE-SR".into(),
                name: "여자 에뻬 일반부".into(),
                weapon: Some("에뻬".into()),
                gender: Some("여".into()),
                category: Some("개인".into()),
                age_bracket: Some("일반부".into()),
                participant_count: 3,
                pool_rounds: vec![RawPoolRound {
                    round_number: 1,
                    pool_number: 1,
                    piste: None,
                    time: Some("09:30".into()),
                    referee: None,
                    results: vec![
                        pool_row(1, names[0], vec![None, v(5), v(5)]),
                        pool_row(2, names[1], vec![l(3), None, v(5)]),
                        pool_row(3, names[2], vec![l(2), l(4), None]),
                    ],
                }],
                de_bracket: None,
                final_ranking: vec![
                    ranking_row(1, names[0]),
                    ranking_row(2, names[1]),
                    ranking_row(3, names[2]),
                ],
            }],
        }
    }

    fn sample_competition() -> RawCompetition {
        roster_competition("KFC2025", ["김영희", "이수민", "박지우"])
    }

    #[tokio::test]
    async fn commits_a_small_event_end_to_end() {
        let pool = database::create_memory_pool().unwrap();
        let config = AppConfig::new();

        let summary = process_batch(&pool, &config, vec![sample_competition()])
            .await
            .unwrap();

        assert_eq!(summary.events_committed, 1);
        assert_eq!(summary.events_rejected, 0);
        assert_eq!(summary.bouts_inserted, 3);
        assert_eq!(summary.rankings_inserted, 3);
        assert_eq!(summary.points_inserted, 3);
        assert_eq!(summary.conflicts, 0);

        // A-tier championship, 3 participants, senior: 800 * 1.0 * 0.4 * 1.0
        let mut conn = database::get_connection(&pool).unwrap();
        let points = database::points::list_by_category(
            &mut conn,
            Weapon::Epee,
            Gender::Female,
            AgeBracket::Senior,
        )
        .unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points.iter().find(|p| p.rank == 1).unwrap().points, 320.0);
    }

    #[tokio::test]
    async fn reingestion_inserts_nothing_new() {
        let pool = database::create_memory_pool().unwrap();
        let config = AppConfig::new();

        let first = process_batch(&pool, &config, vec![sample_competition()])
            .await
            .unwrap();
        assert_eq!(first.bouts_inserted, 3);
        assert_eq!(first.bouts_skipped, 0);

        let second = process_batch(&pool, &config, vec![sample_competition()])
            .await
            .unwrap();
        assert_eq!(second.events_committed, 1);
        assert_eq!(second.bouts_inserted, 0);
        assert_eq!(second.bouts_skipped, 3);
        assert_eq!(second.rankings_inserted, 0);
        assert_eq!(second.points_inserted, 0);

        let mut conn = database::get_connection(&pool).unwrap();
        assert_eq!(database::points::count_all(&mut conn).unwrap(), 3);
    }

    #[tokio::test]
    async fn inconsistent_pool_rejects_only_that_event() {
        let mut competition = sample_competition();
        let mut broken = competition.events[0].clone();
        broken.code = "ME-SR".into();
        broken.gender = Some("남".into());
        broken.pool_rounds[0].results = vec![
            pool_row(1, "강민준", vec![None, v(5)]),
            pool_row(2, "정도윤", vec![v(5), None]),
        ];
        broken.final_ranking.clear();
        competition.events.push(broken);

        let pool = database::create_memory_pool().unwrap();
        let config = AppConfig::new();
        let summary = process_batch(&pool, &config, vec![competition]).await.unwrap();

        assert_eq!(summary.events_committed, 1);
        assert_eq!(summary.events_rejected, 1);
    }

    #[tokio::test]
    async fn later_batches_extend_the_player_roster() {
        let pool = database::create_memory_pool().unwrap();
        let config = AppConfig::new();

        process_batch(&pool, &config, vec![sample_competition()])
            .await
            .unwrap();
        let second = roster_competition("KFC2025-GY", ["최하늘", "강서연", "윤지아"]);
        let summary = process_batch(&pool, &config, vec![second]).await.unwrap();
        assert_eq!(summary.bouts_inserted, 3);

        let mut conn = database::get_connection(&pool).unwrap();
        let players = database::players::list_all(&mut conn).unwrap();
        assert_eq!(players.len(), 6);

        // The new roster got its own rows; the first batch's results
        // stayed where they were.
        let haneul = players.iter().find(|p| p.name == "최하늘").unwrap();
        assert_eq!(database::bouts::list_for_player(&mut conn, haneul.id).unwrap().len(), 2);
        let younghee = players.iter().find(|p| p.name == "김영희").unwrap();
        assert_eq!(database::bouts::list_for_player(&mut conn, younghee.id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn completed_event_without_final_ranking_is_rejected() {
        let mut competition = sample_competition();
        competition.events[0].final_ranking.clear();

        let pool = database::create_memory_pool().unwrap();
        let config = AppConfig::new();
        let summary = process_batch(&pool, &config, vec![competition]).await.unwrap();

        assert_eq!(summary.events_committed, 0);
        assert_eq!(summary.events_rejected, 1);
    }
}
