pub mod bracket;
pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod identity;
pub mod normalize;
pub mod pool;
pub mod ranking;
pub mod services;
pub mod validation;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::services::pipeline::PipelineService;
use crate::services::report::ReportService;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_process() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = PipelineService::new(config)?;
        service.run().await
    })
}

pub fn handle_rankings(weapon: &str, gender: &str, age_bracket: &str) -> Result<()> {
    let config = AppConfig::new();
    let service = ReportService::new(config);
    service.run(weapon, gender, age_bracket)
}
