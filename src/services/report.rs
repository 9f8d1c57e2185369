use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::Utc;

use crate::config::settings::AppConfig;
use crate::database::{self, DbConn};
use crate::domain::{AgeBracket, Gender, PlayerId, Weapon};
use crate::ranking;

/// Renders the rolling leaderboard of one category for the CLI.
pub struct ReportService {
    config: AppConfig,
}

impl ReportService {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, weapon: &str, gender: &str, age_bracket: &str) -> Result<()> {
        let weapon = Weapon::parse(weapon).ok_or_else(|| anyhow!("unknown weapon {weapon:?}"))?;
        let gender = Gender::parse(gender).ok_or_else(|| anyhow!("unknown gender {gender:?}"))?;
        let age_bracket = AgeBracket::parse(age_bracket)
            .ok_or_else(|| anyhow!("unknown age bracket {age_bracket:?}"))?;

        let db_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "fencing_ranking.db".to_string());
        let pool = database::create_pool(&db_path)?;
        let mut conn = database::get_connection(&pool)?;

        let records = database::points::list_by_category(&mut conn, weapon, gender, age_bracket)?;
        let names = player_names(&mut conn)?;
        let standings = ranking::build_leaderboard(
            &records,
            &names,
            Utc::now().date_naive(),
            &self.config.ranking,
        );

        println!(
            "{} {} {} rankings ({} players)",
            gender.as_str(),
            weapon.as_str(),
            age_bracket.as_str(),
            standings.len()
        );
        print!("{}", ranking::format_leaderboard(&standings));
        Ok(())
    }
}

fn player_names(conn: &mut DbConn) -> Result<HashMap<PlayerId, String>> {
    Ok(database::players::list_all(conn)?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}
