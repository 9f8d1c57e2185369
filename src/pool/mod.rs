use log::debug;

use crate::domain::raw::{RawPoolRound, RawPoolRow, RawScoreCell};
use crate::domain::{BoutOutcome, Participant, PoolBout, Side};
use crate::errors::PipelineError;

/// Reconstruct individual bouts from a pool score matrix.
///
/// The grid is read pairwise: row i's cell j and row j's cell i describe
/// the same bout from the two fencers' perspectives. An inconsistent pair
/// rejects the entire pool round; score grids are never repaired.
pub fn parse_pool_round(event: &str, round: &RawPoolRound) -> Result<Vec<PoolBout>, PipelineError> {
    let rows = &round.results;
    let mut bouts = Vec::new();

    for i in 0..rows.len() {
        for j in (i + 1)..rows.len() {
            let cell_ij = cell_at(&rows[i], j);
            let cell_ji = cell_at(&rows[j], i);

            let Some((winner, outcome)) = interpret_pair(event, round, i, j, cell_ij, cell_ji)?
            else {
                continue;
            };

            bouts.push(PoolBout {
                round_number: round.round_number,
                pool_number: round.pool_number,
                first: participant(&rows[i]),
                second: participant(&rows[j]),
                winner,
                outcome,
            });
        }
    }

    Ok(bouts)
}

/// Ragged rows are common in the feed; an out-of-range index reads as an
/// absent cell rather than an error.
fn cell_at<'a>(row: &'a RawPoolRow, index: usize) -> Option<&'a RawScoreCell> {
    row.scores.get(index).and_then(|c| c.as_ref())
}

fn participant(row: &RawPoolRow) -> Participant {
    Participant {
        name: row.name.clone(),
        team: row.team.clone(),
    }
}

/// Decide winner and outcome for one mirrored cell pair, from row i's
/// perspective. `None` means the pair was not fenced.
fn interpret_pair(
    event: &str,
    round: &RawPoolRound,
    i: usize,
    j: usize,
    cell_ij: Option<&RawScoreCell>,
    cell_ji: Option<&RawScoreCell>,
) -> Result<Option<(Side, BoutOutcome)>, PipelineError> {
    match (cell_ij, cell_ji) {
        (None, None) => {
            debug!(
                "pool {}-{}: pair ({}, {}) not fenced",
                round.round_number, round.pool_number, i, j
            );
            Ok(None)
        }
        (Some(a), Some(b)) => match (a.is_victory(), b.is_victory()) {
            (true, false) => Ok(Some((
                Side::First,
                BoutOutcome::Completed {
                    winner_score: a.score,
                    loser_score: b.score,
                },
            ))),
            (false, true) => Ok(Some((
                Side::Second,
                BoutOutcome::Completed {
                    winner_score: b.score,
                    loser_score: a.score,
                },
            ))),
            (true, true) => Err(inconsistent(event, round, i, j, "both cells marked V")),
            (false, false) => Err(inconsistent(event, round, i, j, "no victory marker")),
        },
        // Lone V: the owner won and the opponent never fenced back.
        (Some(a), None) if a.is_victory() => Ok(Some((Side::First, BoutOutcome::Walkover))),
        (None, Some(b)) if b.is_victory() => Ok(Some((Side::Second, BoutOutcome::Walkover))),
        // Lone loss count: the other fencer took the bout by walkover.
        (Some(_), None) => Ok(Some((Side::Second, BoutOutcome::Walkover))),
        (None, Some(_)) => Ok(Some((Side::First, BoutOutcome::Walkover))),
    }
}

fn inconsistent(
    event: &str,
    round: &RawPoolRound,
    i: usize,
    j: usize,
    detail: &str,
) -> PipelineError {
    PipelineError::parse(
        event,
        format!(
            "inconsistent pool matrix in round {} pool {}, rows {} and {}: {}",
            round.round_number, round.pool_number, i, j, detail
        ),
    )
}
