pub mod points;
pub mod rolling;

pub use points::{calculate_points, participant_factor, rank_ratio};
pub use rolling::{build_leaderboard, format_leaderboard, rolling_total, PlayerStanding};
