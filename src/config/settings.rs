pub struct RankingSettings {
    /// How many results per category count toward the rolling total.
    pub best_n: usize,
    /// Trailing window for the rolling total.
    pub rolling_window_days: i64,
    pub leaderboard_size: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            best_n: 4,
            rolling_window_days: 365,
            leaderboard_size: 100,
        }
    }
}

pub struct IdentitySettings {
    /// A same-name sighting with a new affiliation is treated as a club
    /// transfer only if the player was last seen within this window.
    pub recency_window_days: i64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            recency_window_days: 730,
        }
    }
}

pub struct ValidationSettings {
    pub max_de_touches: u8,
    pub max_pool_touches: u8,
    pub max_name_chars: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_de_touches: 15,
            max_pool_touches: 5,
            max_name_chars: 40,
        }
    }
}

pub struct AppConfig {
    pub ranking: RankingSettings,
    pub identity: IdentitySettings,
    pub validation: ValidationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            ranking: RankingSettings::default(),
            identity: IdentitySettings::default(),
            validation: ValidationSettings::default(),
        }
    }
}
