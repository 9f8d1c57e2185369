use anyhow::Result;

use fencing_ranking::cli::Command;
use fencing_ranking::{handle_process, handle_rankings, interpret};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Process => handle_process(),
        Command::Rankings {
            weapon,
            gender,
            age_bracket,
        } => handle_rankings(weapon, gender, age_bracket),
    }
}
