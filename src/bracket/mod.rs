use std::collections::{HashMap, HashSet};

use log::debug;

use crate::domain::raw::{RawDeBracket, RawDeBout, RawRound, RawRoundEntry};
use crate::domain::{Bracket, BracketRound, DeBout, DeSlot, SeededEntry};
use crate::errors::PipelineError;

/// Tableau sizes are capped at 128 entries, matching the largest draw the
/// federation runs.
const MAX_BRACKET_SIZE: u32 = 128;

/// Smallest power-of-two tableau that fits the field.
pub fn bracket_size_for(participant_count: u32) -> u32 {
    let mut size = 2;
    while size < participant_count && size < MAX_BRACKET_SIZE {
        size *= 2;
    }
    size
}

pub fn round_label(size: u32) -> String {
    match size {
        2 => "final".to_string(),
        4 => "semifinal".to_string(),
        8 => "quarterfinal".to_string(),
        n => format!("round of {n}"),
    }
}

/// Rebuild a typed elimination bracket from per-round entry listings.
///
/// Some feeds deliver pre-paired bouts instead of round listings; those
/// are converted to the listing shape first so one reconstruction path
/// serves both.
pub fn reconstruct(event: &str, raw: &RawDeBracket) -> Result<Bracket, PipelineError> {
    let rounds = if raw.rounds.is_empty() {
        rounds_from_bouts(&raw.bouts)
    } else {
        let mut rounds = raw.rounds.clone();
        rounds.sort_by_key(|r| r.round_order);
        rounds
    };

    if rounds.is_empty() {
        return Err(PipelineError::parse(event, "elimination table has no rounds"));
    }

    let seeding = seeding_of(raw, &rounds);
    let participant_count = participant_count_of(raw, &seeding, &rounds);
    let bracket_size = bracket_size_for(participant_count);

    if rounds.len() as u32 > bracket_size.ilog2() {
        return Err(PipelineError::parse(
            event,
            format!(
                "{} rounds do not fit a tableau of {}",
                rounds.len(),
                bracket_size
            ),
        ));
    }

    let mut built = Vec::with_capacity(rounds.len());
    for (idx, round) in rounds.iter().enumerate() {
        let size = bracket_size >> idx;
        let next_seeds = rounds.get(idx + 1).map(seed_counts);
        let mut bouts = pair_round(event, round, size, idx as u32 + 1, next_seeds.as_ref())?;

        if idx == 0 {
            append_byes(&seeding, round, size, &mut bouts);
        }

        check_advancement(event, &bouts, next_seeds.as_ref())?;
        built.push(BracketRound {
            size,
            label: round_label(size),
            bouts,
        });
    }

    Ok(Bracket {
        bracket_size,
        participant_count,
        seeding,
        rounds: built,
    })
}

fn seeding_of(raw: &RawDeBracket, rounds: &[RawRound]) -> Vec<SeededEntry> {
    if !raw.seeding.is_empty() {
        return raw
            .seeding
            .iter()
            .map(|s| SeededEntry {
                seed: s.seed,
                name: s.name.clone(),
                team: s.team.clone(),
            })
            .collect();
    }

    // No explicit seeding list; recover one from the earliest appearance
    // of each seed across the rounds.
    let mut seen = HashSet::new();
    let mut seeding = Vec::new();
    for round in rounds {
        for entry in &round.entries {
            if seen.insert(entry.seed) {
                seeding.push(SeededEntry {
                    seed: entry.seed,
                    name: entry.name.clone(),
                    team: entry.team.clone(),
                });
            }
        }
    }
    seeding.sort_by_key(|s| s.seed);
    seeding
}

fn participant_count_of(raw: &RawDeBracket, seeding: &[SeededEntry], rounds: &[RawRound]) -> u32 {
    if raw.participant_count > 0 {
        return raw.participant_count;
    }
    if !seeding.is_empty() {
        return seeding.len() as u32;
    }
    let distinct: HashSet<u32> = rounds
        .iter()
        .flat_map(|r| r.entries.iter().map(|e| e.seed))
        .collect();
    distinct.len() as u32
}

fn seed_counts(round: &RawRound) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    for entry in &round.entries {
        *counts.entry(entry.seed).or_insert(0) += 1;
    }
    counts
}

fn slot(entry: &RawRoundEntry) -> DeSlot {
    DeSlot {
        seed: entry.seed,
        name: entry.name.clone(),
        team: entry.team.clone(),
        score: entry.score,
    }
}

/// Pair consecutive entries of one round into bouts, source order kept.
fn pair_round(
    event: &str,
    round: &RawRound,
    size: u32,
    round_order: u32,
    next_seeds: Option<&HashMap<u32, usize>>,
) -> Result<Vec<DeBout>, PipelineError> {
    let mut bouts = Vec::new();

    for (k, pair) in round.entries.chunks(2).enumerate() {
        let match_number = k as u32 + 1;
        let first = slot(&pair[0]);

        if pair.len() == 1 {
            // Odd leftover entry advances unopposed.
            bouts.push(bye_bout(size, round_order, match_number, first));
            continue;
        }

        let second = slot(&pair[1]);
        let winner_seed = decide_winner(event, &first, &second, next_seeds)?;
        bouts.push(DeBout {
            round_size: size,
            round_order,
            match_number,
            first,
            second: Some(second),
            winner_seed,
            is_completed: true,
            is_bye: false,
        });
    }

    Ok(bouts)
}

/// Winner of a paired bout: score comparison first, then the sole entry
/// carrying a score, then presence in the following round.
fn decide_winner(
    event: &str,
    first: &DeSlot,
    second: &DeSlot,
    next_seeds: Option<&HashMap<u32, usize>>,
) -> Result<u32, PipelineError> {
    match (first.score, second.score) {
        (Some(a), Some(b)) if a > b => return Ok(first.seed),
        (Some(a), Some(b)) if b > a => return Ok(second.seed),
        (Some(a), Some(b)) => {
            return Err(PipelineError::parse(
                event,
                format!(
                    "tied elimination score {a}:{b} between seeds {} and {}",
                    first.seed, second.seed
                ),
            ));
        }
        (Some(_), None) => return Ok(first.seed),
        (None, Some(_)) => return Ok(second.seed),
        (None, None) => {}
    }

    if let Some(next) = next_seeds {
        match (
            next.contains_key(&first.seed),
            next.contains_key(&second.seed),
        ) {
            (true, false) => return Ok(first.seed),
            (false, true) => return Ok(second.seed),
            _ => {}
        }
    }

    Err(PipelineError::parse(
        event,
        format!(
            "cannot determine winner between seeds {} and {}: no scores, no advancement",
            first.seed, second.seed
        ),
    ))
}

/// Seeded players missing from the starting round entered on a bye.
fn append_byes(seeding: &[SeededEntry], round: &RawRound, size: u32, bouts: &mut Vec<DeBout>) {
    let present: HashSet<u32> = round.entries.iter().map(|e| e.seed).collect();
    let mut match_number = bouts.len() as u32;

    for seeded in seeding {
        if present.contains(&seeded.seed) {
            continue;
        }
        match_number += 1;
        debug!("seed {} receives a bye in round of {}", seeded.seed, size);
        bouts.push(bye_bout(
            size,
            1,
            match_number,
            DeSlot {
                seed: seeded.seed,
                name: seeded.name.clone(),
                team: seeded.team.clone(),
                score: None,
            },
        ));
    }
}

fn bye_bout(size: u32, round_order: u32, match_number: u32, first: DeSlot) -> DeBout {
    let winner_seed = first.seed;
    DeBout {
        round_size: size,
        round_order,
        match_number,
        first,
        second: None,
        winner_seed,
        is_completed: true,
        is_bye: true,
    }
}

/// Every winner must fence exactly once in the following round, and no
/// loser may reappear. Violations mean the table references fencers
/// inconsistently and the event cannot be trusted.
fn check_advancement(
    event: &str,
    bouts: &[DeBout],
    next_seeds: Option<&HashMap<u32, usize>>,
) -> Result<(), PipelineError> {
    let Some(next) = next_seeds else {
        return Ok(());
    };

    for bout in bouts {
        match next.get(&bout.winner_seed).copied().unwrap_or(0) {
            0 => {
                return Err(PipelineError::integrity(
                    event,
                    format!(
                        "seed {} won in round of {} but is absent from the next round",
                        bout.winner_seed, bout.round_size
                    ),
                ));
            }
            1 => {}
            n => {
                return Err(PipelineError::integrity(
                    event,
                    format!(
                        "seed {} appears {n} times in the round after round of {}",
                        bout.winner_seed, bout.round_size
                    ),
                ));
            }
        }
        if let Some(loser) = bout.loser() {
            if next.contains_key(&loser.seed) {
                return Err(PipelineError::integrity(
                    event,
                    format!(
                        "seed {} lost in round of {} but reappears in the next round",
                        loser.seed, bout.round_size
                    ),
                ));
            }
        }
    }

    Ok(())
}

/// Flatten a pre-paired bout feed into round entry listings.
fn rounds_from_bouts(bouts: &[RawDeBout]) -> Vec<RawRound> {
    let mut orders: Vec<u32> = bouts.iter().map(|b| b.round_order).collect();
    orders.sort_unstable();
    orders.dedup();

    orders
        .into_iter()
        .map(|order| {
            let mut entries = Vec::new();
            for bout in bouts.iter().filter(|b| b.round_order == order) {
                for player in [&bout.player1, &bout.player2].into_iter().flatten() {
                    entries.push(RawRoundEntry {
                        seed: player.seed,
                        name: player.name.clone(),
                        team: player.team.clone(),
                        score: player.score,
                    });
                }
            }
            RawRound {
                name: None,
                round_order: order,
                entries,
            }
        })
        .collect()
}
