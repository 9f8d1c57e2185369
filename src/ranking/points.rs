use crate::domain::{AgeBracket, Tier};

/// Share of the tier's base points awarded at a final rank. Steps follow
/// the federation's published table.
pub fn rank_ratio(rank: u32) -> f64 {
    match rank {
        0 => 0.0,
        1 => 1.0,
        2 => 0.80,
        3 => 0.65,
        4 => 0.55,
        5..=8 => 0.40,
        9..=16 => 0.25,
        17..=32 => 0.15,
        33..=64 => 0.08,
        _ => 0.04,
    }
}

/// Larger fields award fuller points.
pub fn participant_factor(count: u32) -> f64 {
    match count {
        c if c >= 64 => 1.0,
        c if c >= 32 => 0.9,
        c if c >= 16 => 0.8,
        c if c >= 8 => 0.6,
        _ => 0.4,
    }
}

/// Points for one final-ranking row, rounded to two decimals.
pub fn calculate_points(tier: Tier, rank: u32, participant_count: u32, bracket: AgeBracket) -> f64 {
    let raw = tier.base_points()
        * rank_ratio(rank)
        * participant_factor(participant_count)
        * bracket.weight();
    round2(raw)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_games_third_place_in_a_field_of_fifty() {
        // 1000 * 0.65 * 0.9 * 1.0
        let points = calculate_points(Tier::S, 3, 50, AgeBracket::Senior);
        assert_eq!(points, 585.0);
    }

    #[test]
    fn better_rank_never_scores_less() {
        for tier in [Tier::S, Tier::A, Tier::B, Tier::C, Tier::D] {
            for count in [4, 10, 20, 40, 80] {
                let mut previous = f64::MAX;
                for rank in 1..=70 {
                    let p = calculate_points(tier, rank, count, AgeBracket::Senior);
                    assert!(p <= previous, "rank {rank} scored more than rank above");
                    previous = p;
                }
            }
        }
    }

    #[test]
    fn participant_factor_steps() {
        assert_eq!(participant_factor(64), 1.0);
        assert_eq!(participant_factor(63), 0.9);
        assert_eq!(participant_factor(16), 0.8);
        assert_eq!(participant_factor(8), 0.6);
        assert_eq!(participant_factor(7), 0.4);
    }

    #[test]
    fn youth_brackets_scale_down() {
        let senior = calculate_points(Tier::A, 1, 32, AgeBracket::Senior);
        let y10 = calculate_points(Tier::A, 1, 32, AgeBracket::Y10);
        assert_eq!(senior, 720.0);
        assert_eq!(y10, 360.0);
    }
}
