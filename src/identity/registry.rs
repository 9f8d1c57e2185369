use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use chrono::NaiveDate;
use log::{info, warn};

use crate::config::settings::IdentitySettings;
use crate::database::models::DbPlayer;
use crate::database::{self, DbConn};
use crate::domain::{AgeBracket, Gender, PlayerId, Weapon};
use crate::normalize::{identity_key, IdentityKey};

/// One appearance of a (name, affiliation) pair in source data.
#[derive(Debug, Clone)]
pub struct Sighting {
    pub name: String,
    pub affiliation: String,
    pub birth_year: Option<i32>,
    pub weapon: Option<Weapon>,
    pub gender: Option<Gender>,
    pub age_bracket: Option<AgeBracket>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Active,
    Merged { into: PlayerId },
    Split { from: PlayerId },
}

#[derive(Debug, Clone)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub display_name: String,
    pub normalized_name: String,
    /// Affiliation history, oldest first. The last entry is current.
    pub affiliations: Vec<String>,
    pub birth_year: Option<i32>,
    /// The weapon first seen for this player.
    pub primary_weapon: Option<Weapon>,
    pub gender: Option<Gender>,
    pub age_bracket: Option<AgeBracket>,
    pub last_seen: NaiveDate,
    pub status: PlayerStatus,
    pub provisional: bool,
}

impl PlayerRecord {
    pub fn is_active(&self) -> bool {
        matches!(self.status, PlayerStatus::Active | PlayerStatus::Split { .. })
    }
}

#[derive(Debug, Clone)]
pub enum Resolution {
    Existing(PlayerId),
    Created(PlayerId),
    /// More than one plausible match, or a stale same-name candidate.
    /// A provisional player holds the results until an operator decides.
    Ambiguous {
        provisional: PlayerId,
        candidates: Vec<PlayerId>,
    },
    /// Contradictory evidence on an exact key match. Never auto-applied.
    Conflict {
        provisional: PlayerId,
        reason: String,
    },
}

impl Resolution {
    pub fn player_id(&self) -> PlayerId {
        match self {
            Resolution::Existing(id) | Resolution::Created(id) => *id,
            Resolution::Ambiguous { provisional, .. } => *provisional,
            Resolution::Conflict { provisional, .. } => *provisional,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConflictRecord {
    pub name: String,
    pub reason: String,
    pub provisional: PlayerId,
    pub candidates: Vec<PlayerId>,
}

/// In-memory player registry. The single mutable owner of identity state;
/// all resolution runs on one task, so no interior locking is needed.
pub struct Registry {
    players: Vec<PlayerRecord>,
    by_key: HashMap<IdentityKey, PlayerId>,
    by_name: HashMap<String, Vec<PlayerId>>,
    conflicts: Vec<ConflictRecord>,
    recency_window_days: i64,
}

impl Registry {
    pub fn new(settings: &IdentitySettings) -> Self {
        Self {
            players: Vec::new(),
            by_key: HashMap::new(),
            by_name: HashMap::new(),
            conflicts: Vec::new(),
            recency_window_days: settings.recency_window_days,
        }
    }

    /// Rebuild registry state from persisted player rows so arena ids
    /// stay aligned with the players table across batch runs. Rows must
    /// arrive ordered by id without gaps; the registry is the only
    /// writer of that table, so the invariant holds.
    ///
    /// Only the current affiliation key is restored; sightings under an
    /// older club resolve through the same-name transfer path.
    pub fn hydrate(&mut self, rows: &[DbPlayer]) -> Result<()> {
        for row in rows {
            if row.id != self.players.len() as PlayerId + 1 {
                bail!("players table has a gap at id {}", row.id);
            }

            let status = match (row.status.as_str(), row.redirect_to) {
                ("merged", Some(into)) => PlayerStatus::Merged { into },
                ("split", Some(from)) => PlayerStatus::Split { from },
                _ => PlayerStatus::Active,
            };
            let record = PlayerRecord {
                id: row.id,
                display_name: row.name.clone(),
                normalized_name: row.normalized_name.clone(),
                affiliations: row.affiliation.iter().cloned().collect(),
                birth_year: row.birth_year,
                primary_weapon: row.primary_weapon.as_deref().and_then(Weapon::parse),
                gender: row.gender.as_deref().and_then(Gender::parse),
                age_bracket: row.age_bracket.as_deref().and_then(AgeBracket::parse),
                last_seen: row.last_seen.unwrap_or(NaiveDate::MIN),
                status,
                provisional: row.provisional,
            };

            self.by_name
                .entry(record.normalized_name.clone())
                .or_default()
                .push(record.id);
            if record.is_active() && !record.provisional {
                if let Some(affiliation) = record.affiliations.last() {
                    self.by_key.insert(
                        IdentityKey {
                            name: record.normalized_name.clone(),
                            affiliation: affiliation.clone(),
                        },
                        record.id,
                    );
                }
            }
            self.players.push(record);
        }
        Ok(())
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerRecord> {
        if id < 1 {
            return None;
        }
        self.players.get(id as usize - 1)
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    /// Resolve a sighting to a player id. Conflicting or ambiguous
    /// sightings get a provisional player so the event can still commit;
    /// the conflict queue records what needs review.
    pub fn resolve(&mut self, sighting: &Sighting) -> Resolution {
        let key = identity_key(&sighting.name, &sighting.affiliation);

        if let Some(&id) = self.by_key.get(&key) {
            let id = self.root_of(id);
            return self.resolve_exact(id, sighting);
        }

        let candidates = self.same_name_candidates(&key.name);
        match candidates.as_slice() {
            [] => Resolution::Created(self.create(sighting, &key, false)),
            &[candidate] => self.resolve_transfer(candidate, sighting, &key),
            _ => {
                let provisional = self.create(sighting, &key, true);
                self.queue_conflict(
                    &sighting.name,
                    "multiple same-name players match",
                    provisional,
                    candidates.clone(),
                );
                Resolution::Ambiguous {
                    provisional,
                    candidates,
                }
            }
        }
    }

    fn resolve_exact(&mut self, id: PlayerId, sighting: &Sighting) -> Resolution {
        if let Some(reason) = self.contradiction(id, sighting) {
            let key = identity_key(&sighting.name, &sighting.affiliation);
            let provisional = self.create_detached(sighting, &key);
            self.queue_conflict(&sighting.name, &reason, provisional, vec![id]);
            return Resolution::Conflict {
                provisional,
                reason,
            };
        }

        self.observe(id, sighting);
        Resolution::Existing(id)
    }

    /// Same normalized name, new affiliation. Inside the recency window
    /// and without contradicting evidence this is a club transfer.
    fn resolve_transfer(
        &mut self,
        candidate: PlayerId,
        sighting: &Sighting,
        key: &IdentityKey,
    ) -> Resolution {
        let recent = self
            .get(candidate)
            .map(|p| (sighting.date - p.last_seen).num_days() <= self.recency_window_days)
            .unwrap_or(false);

        if recent && self.contradiction(candidate, sighting).is_none() {
            let record = &mut self.players[candidate as usize - 1];
            record.affiliations.push(key.affiliation.clone());
            info!(
                "player {} transferred to {}",
                record.display_name, sighting.affiliation
            );
            self.by_key.insert(key.clone(), candidate);
            self.observe(candidate, sighting);
            return Resolution::Existing(candidate);
        }

        let provisional = self.create(sighting, key, true);
        self.queue_conflict(
            &sighting.name,
            if recent {
                "same-name candidate with conflicting profile"
            } else {
                "same-name candidate outside recency window"
            },
            provisional,
            vec![candidate],
        );
        Resolution::Ambiguous {
            provisional,
            candidates: vec![candidate],
        }
    }

    /// Gender and birth year never change; age brackets only advance.
    fn contradiction(&self, id: PlayerId, sighting: &Sighting) -> Option<String> {
        let record = self.get(id)?;

        if let (Some(known), Some(seen)) = (record.birth_year, sighting.birth_year) {
            if known != seen {
                return Some(format!("birth year {seen} contradicts recorded {known}"));
            }
        }
        if let (Some(known), Some(seen)) = (record.gender, sighting.gender) {
            if known != seen {
                return Some(format!(
                    "gender {} contradicts recorded {}",
                    seen.as_str(),
                    known.as_str()
                ));
            }
        }
        if let (Some(known), Some(seen)) = (record.age_bracket, sighting.age_bracket) {
            if seen < known {
                return Some(format!(
                    "age bracket {} regresses from {}",
                    seen.as_str(),
                    known.as_str()
                ));
            }
        }
        None
    }

    fn observe(&mut self, id: PlayerId, sighting: &Sighting) {
        let record = &mut self.players[id as usize - 1];
        if sighting.date > record.last_seen {
            record.last_seen = sighting.date;
        }
        if record.gender.is_none() {
            record.gender = sighting.gender;
        }
        if record.primary_weapon.is_none() {
            record.primary_weapon = sighting.weapon;
        }
        if record.birth_year.is_none() {
            record.birth_year = sighting.birth_year;
        }
        match (record.age_bracket, sighting.age_bracket) {
            (None, Some(seen)) => record.age_bracket = Some(seen),
            (Some(known), Some(seen)) if seen > known => record.age_bracket = Some(seen),
            _ => {}
        }
    }

    fn create(&mut self, sighting: &Sighting, key: &IdentityKey, provisional: bool) -> PlayerId {
        let id = self.create_detached(sighting, key);
        self.by_key.insert(key.clone(), id);
        self.by_name.entry(key.name.clone()).or_default().push(id);
        self.players[id as usize - 1].provisional = provisional;
        id
    }

    /// Create a record without indexing its key, for provisional players
    /// that must not shadow the contested key.
    fn create_detached(&mut self, sighting: &Sighting, key: &IdentityKey) -> PlayerId {
        let id = self.players.len() as PlayerId + 1;
        self.players.push(PlayerRecord {
            id,
            display_name: sighting.name.trim().to_string(),
            normalized_name: key.name.clone(),
            affiliations: vec![key.affiliation.clone()],
            birth_year: sighting.birth_year,
            primary_weapon: sighting.weapon,
            gender: sighting.gender,
            age_bracket: sighting.age_bracket,
            last_seen: sighting.date,
            status: PlayerStatus::Active,
            provisional: true,
        });
        id
    }

    fn same_name_candidates(&self, normalized_name: &str) -> Vec<PlayerId> {
        self.by_name
            .get(normalized_name)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .map(|id| self.root_of(id))
                    .filter(|&id| self.get(id).is_some_and(|p| p.is_active() && !p.provisional))
                    .collect::<HashSet<_>>()
                    .into_iter()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn queue_conflict(
        &mut self,
        name: &str,
        reason: &str,
        provisional: PlayerId,
        candidates: Vec<PlayerId>,
    ) {
        warn!("identity conflict for {name}: {reason}");
        self.conflicts.push(ConflictRecord {
            name: name.to_string(),
            reason: reason.to_string(),
            provisional,
            candidates,
        });
    }

    /// Merge `loser` into `survivor`: every stored row pointing at the
    /// loser is re-pointed inside one transaction, then the in-memory
    /// record becomes a redirect.
    pub fn merge(&mut self, conn: &mut DbConn, loser: PlayerId, survivor: PlayerId) -> Result<()> {
        if loser == survivor {
            bail!("cannot merge player {loser} into itself");
        }
        let survivor = self.canonical(survivor)?;
        if self.canonical(loser)? == survivor {
            return Ok(());
        }

        database::players::merge_references(conn, loser, survivor)?;

        let (loser_affils, loser_name) = {
            let record = &mut self.players[loser as usize - 1];
            record.status = PlayerStatus::Merged { into: survivor };
            (record.affiliations.clone(), record.display_name.clone())
        };
        let record = &mut self.players[survivor as usize - 1];
        for affiliation in loser_affils {
            if !record.affiliations.contains(&affiliation) {
                record.affiliations.push(affiliation);
            }
        }
        info!("merged player {loser_name} ({loser}) into {survivor}");
        Ok(())
    }

    /// Split results recorded on or after `from_date` off onto a new
    /// player, for cases where two people were wrongly unified.
    pub fn split(
        &mut self,
        conn: &mut DbConn,
        player: PlayerId,
        from_date: NaiveDate,
    ) -> Result<PlayerId> {
        let player = self.canonical(player)?;
        let source = self
            .get(player)
            .ok_or_else(|| anyhow::anyhow!("unknown player {player}"))?
            .clone();

        let new_id = self.players.len() as PlayerId + 1;
        self.players.push(PlayerRecord {
            id: new_id,
            display_name: source.display_name.clone(),
            normalized_name: source.normalized_name.clone(),
            affiliations: source.affiliations.clone(),
            birth_year: source.birth_year,
            primary_weapon: source.primary_weapon,
            gender: source.gender,
            age_bracket: source.age_bracket,
            last_seen: source.last_seen,
            status: PlayerStatus::Split { from: player },
            provisional: true,
        });
        self.by_name
            .entry(source.normalized_name.clone())
            .or_default()
            .push(new_id);

        database::players::split_references(conn, player, new_id, from_date)?;
        info!(
            "split player {} ({player}): results from {from_date} now on {new_id}",
            source.display_name
        );
        Ok(new_id)
    }

    /// Follow merge redirects to the live record.
    pub fn canonical(&self, id: PlayerId) -> Result<PlayerId> {
        let mut visited = HashSet::new();
        let mut current = id;
        loop {
            if !visited.insert(current) {
                bail!("redirect cycle detected at player {current}");
            }
            match self.get(current).map(|p| p.status) {
                Some(PlayerStatus::Merged { into }) => current = into,
                Some(_) => return Ok(current),
                None => bail!("unknown player {current}"),
            }
        }
    }

    fn root_of(&self, id: PlayerId) -> PlayerId {
        self.canonical(id).unwrap_or(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn settings() -> IdentitySettings {
        IdentitySettings::default()
    }

    fn sighting(name: &str, team: &str, date: &str) -> Sighting {
        Sighting {
            name: name.into(),
            affiliation: team.into(),
            birth_year: None,
            weapon: Some(Weapon::Epee),
            gender: Some(Gender::Male),
            age_bracket: Some(AgeBracket::Cadet),
            date: date.parse().unwrap(),
        }
    }

    #[test]
    fn exact_key_resolves_to_same_player() {
        let mut reg = Registry::new(&settings());
        let a = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01"));
        let b = reg.resolve(&sighting("김철수", "서울클럽", "2025-04-01"));
        assert!(matches!(a, Resolution::Created(_)));
        assert!(matches!(b, Resolution::Existing(id) if id == a.player_id()));
    }

    #[test]
    fn recent_transfer_keeps_identity_and_history() {
        let mut reg = Registry::new(&settings());
        let a = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01"));
        let b = reg.resolve(&sighting("김철수", "부산클럽", "2025-09-01"));
        assert_eq!(a.player_id(), b.player_id());

        let record = reg.get(a.player_id()).unwrap();
        assert_eq!(record.affiliations.len(), 2);
    }

    #[test]
    fn stale_transfer_is_ambiguous() {
        let mut reg = Registry::new(&settings());
        let a = reg.resolve(&sighting("김철수", "서울클럽", "2020-03-01"));
        let b = reg.resolve(&sighting("김철수", "부산클럽", "2025-09-01"));
        assert_ne!(a.player_id(), b.player_id());
        assert!(matches!(b, Resolution::Ambiguous { .. }));
        assert_eq!(reg.conflicts().len(), 1);
    }

    #[test]
    fn gender_flip_is_a_conflict_not_an_update() {
        let mut reg = Registry::new(&settings());
        let a = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01"));

        let mut flipped = sighting("김철수", "서울클럽", "2025-04-01");
        flipped.gender = Some(Gender::Female);
        let b = reg.resolve(&flipped);

        assert!(matches!(b, Resolution::Conflict { .. }));
        assert_ne!(a.player_id(), b.player_id());
        assert_eq!(reg.get(a.player_id()).unwrap().gender, Some(Gender::Male));
    }

    #[test]
    fn age_bracket_advances_but_never_regresses() {
        let mut reg = Registry::new(&settings());
        let a = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01"));

        let mut older = sighting("김철수", "서울클럽", "2026-03-01");
        older.age_bracket = Some(AgeBracket::Junior);
        assert!(matches!(reg.resolve(&older), Resolution::Existing(_)));
        assert_eq!(
            reg.get(a.player_id()).unwrap().age_bracket,
            Some(AgeBracket::Junior)
        );

        let mut younger = sighting("김철수", "서울클럽", "2026-06-01");
        younger.age_bracket = Some(AgeBracket::Y12);
        assert!(matches!(reg.resolve(&younger), Resolution::Conflict { .. }));
    }

    #[test]
    fn canonical_follows_redirects() {
        let mut reg = Registry::new(&settings());
        let a = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01")).player_id();
        let b = reg.resolve(&sighting("김영희", "서울클럽", "2025-03-01")).player_id();

        // Wire the redirect directly; no database involved here.
        reg.players[b as usize - 1].status = PlayerStatus::Merged { into: a };
        assert_eq!(reg.canonical(b).unwrap(), a);

        reg.players[a as usize - 1].status = PlayerStatus::Merged { into: b };
        assert!(reg.canonical(a).is_err());
    }

    #[test]
    fn birth_year_mismatch_is_a_conflict() {
        let mut reg = Registry::new(&settings());
        let mut first = sighting("김철수", "서울클럽", "2025-03-01");
        first.birth_year = Some(2008);
        let a = reg.resolve(&first);

        let mut later = sighting("김철수", "서울클럽", "2025-04-01");
        later.birth_year = Some(2011);
        assert!(matches!(reg.resolve(&later), Resolution::Conflict { .. }));
        assert_eq!(reg.get(a.player_id()).unwrap().birth_year, Some(2008));
    }

    #[test]
    fn hydration_preserves_ids_across_restarts() {
        let pool = database::create_memory_pool().unwrap();
        let mut conn = database::get_connection(&pool).unwrap();
        database::setup::init_database(&mut conn).unwrap();

        let mut reg = Registry::new(&settings());
        let a = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01")).player_id();
        let b = reg.resolve(&sighting("김영희", "부산클럽", "2025-03-01")).player_id();
        for record in reg.players() {
            database::players::sync_player(&mut conn, record).unwrap();
        }

        let mut fresh = Registry::new(&settings());
        fresh
            .hydrate(&database::players::list_all(&mut conn).unwrap())
            .unwrap();

        // Known key resolves to the stored id, a new name continues after it.
        assert!(matches!(
            fresh.resolve(&sighting("김철수", "서울클럽", "2025-04-01")),
            Resolution::Existing(id) if id == a
        ));
        let c = fresh.resolve(&sighting("최하늘", "서울클럽", "2025-04-01")).player_id();
        assert_eq!(c, b + 1);
    }

    fn seed_event_rows(conn: &mut DbConn) {
        conn.execute(
            "INSERT INTO competitions (code, name, tier, status, start_date) \
             VALUES ('C1', '전국선수권대회', 'A', 'completed', '2025-03-01')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO events (competition_id, code, name, weapon, gender) \
             VALUES (1, 'E1', '남자 에뻬', 'epee', 'male')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn merge_repoints_stored_results() {
        let pool = database::create_memory_pool().unwrap();
        let mut conn = database::get_connection(&pool).unwrap();
        database::setup::init_database(&mut conn).unwrap();

        let mut reg = Registry::new(&settings());
        let survivor = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01")).player_id();
        let loser = reg.resolve(&sighting("KIM Chulsoo", "서울클럽", "2025-03-01")).player_id();
        for record in reg.players() {
            database::players::sync_player(&mut conn, record).unwrap();
        }

        seed_event_rows(&mut conn);
        conn.execute(
            "INSERT INTO bouts (event_id, phase, round_number, pool_number, match_number, \
             first_player_id, second_player_id, winner_player_id, outcome, date) \
             VALUES (1, 'pool', 1, 1, 0, ?1, ?2, ?1, 'V', '2025-03-01')",
            params![loser, survivor],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO final_rankings (event_id, player_id, rank_position) VALUES (1, ?1, 2)",
            params![loser],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ranking_points (player_id, event_id, weapon, gender, age_bracket, \
             competition_name, competition_date, rank_position, base_points, rank_ratio, \
             participant_factor, age_weight, points) \
             VALUES (?1, 1, 'epee', 'male', 'Senior', '전국선수권대회', '2025-03-01', 2, \
             800.0, 0.8, 0.4, 1.0, 256.0)",
            params![loser],
        )
        .unwrap();

        reg.merge(&mut conn, loser, survivor).unwrap();

        assert!(database::bouts::list_for_player(&mut conn, loser).unwrap().is_empty());
        let bouts = database::bouts::list_for_player(&mut conn, survivor).unwrap();
        assert_eq!(bouts.len(), 1);
        assert_eq!(bouts[0].first_player_id, survivor);

        let rankings = database::rankings::list_for_event(&mut conn, 1).unwrap();
        assert_eq!(rankings[0].player_id, survivor);

        let points: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM ranking_points WHERE player_id = ?1",
                params![survivor],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(points, 1);

        let kind: String = conn
            .query_row(
                "SELECT kind FROM player_lineage WHERE player_id = ?1 AND related_id = ?2",
                params![loser, survivor],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(kind, "merged_into");
        assert_eq!(reg.canonical(loser).unwrap(), survivor);
    }

    #[test]
    fn split_moves_results_from_the_cut_date() {
        let pool = database::create_memory_pool().unwrap();
        let mut conn = database::get_connection(&pool).unwrap();
        database::setup::init_database(&mut conn).unwrap();

        let mut reg = Registry::new(&settings());
        let player = reg.resolve(&sighting("김철수", "서울클럽", "2024-01-10")).player_id();
        let opponent = reg.resolve(&sighting("박지우", "부산클럽", "2024-01-10")).player_id();
        for record in reg.players() {
            database::players::sync_player(&mut conn, record).unwrap();
        }

        seed_event_rows(&mut conn);
        conn.execute(
            "INSERT INTO events (competition_id, code, name, weapon, gender) \
             VALUES (1, 'E2', '남자 에뻬 2', 'epee', 'male')",
            [],
        )
        .unwrap();
        for (event_id, date) in [(1, "2024-01-10"), (2, "2025-06-10")] {
            conn.execute(
                "INSERT INTO bouts (event_id, phase, round_number, pool_number, match_number, \
                 first_player_id, second_player_id, winner_player_id, outcome, date) \
                 VALUES (?1, 'pool', 1, 1, 0, ?2, ?3, ?2, 'V', ?4)",
                params![event_id, player, opponent, date],
            )
            .unwrap();
        }

        let new_id = reg.split(&mut conn, player, "2025-01-01".parse().unwrap()).unwrap();
        assert_eq!(new_id, 3);

        let kept = database::bouts::list_for_player(&mut conn, player).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].event_id, 1);
        let moved = database::bouts::list_for_player(&mut conn, new_id).unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].event_id, 2);

        let row = database::players::find_by_id(&mut conn, new_id).unwrap().unwrap();
        assert_eq!(row.status, "split");
        let kind: String = conn
            .query_row(
                "SELECT kind FROM player_lineage WHERE player_id = ?1 AND related_id = ?2",
                params![new_id, player],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(kind, "split_from");
    }

    #[test]
    fn failed_split_rolls_back_cleanly() {
        let pool = database::create_memory_pool().unwrap();
        let mut conn = database::get_connection(&pool).unwrap();
        database::setup::init_database(&mut conn).unwrap();

        let mut reg = Registry::new(&settings());
        let player = reg.resolve(&sighting("김철수", "서울클럽", "2025-03-01")).player_id();
        let opponent = reg.resolve(&sighting("박지우", "부산클럽", "2025-03-01")).player_id();
        for record in reg.players() {
            database::players::sync_player(&mut conn, record).unwrap();
        }

        seed_event_rows(&mut conn);
        conn.execute(
            "INSERT INTO bouts (event_id, phase, round_number, pool_number, match_number, \
             first_player_id, second_player_id, winner_player_id, outcome, date) \
             VALUES (1, 'pool', 1, 1, 0, ?1, ?2, ?1, 'V', '2025-06-10')",
            params![player, opponent],
        )
        .unwrap();

        // The target id already exists, so the opening row copy fails and
        // the whole transaction must unwind.
        let result = database::players::split_references(
            &mut conn,
            player,
            opponent,
            "2025-01-01".parse().unwrap(),
        );
        assert!(result.is_err());

        assert_eq!(database::bouts::list_for_player(&mut conn, player).unwrap().len(), 1);
        let lineage: i64 = conn
            .query_row("SELECT COUNT(*) FROM player_lineage", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lineage, 0);
    }
}
