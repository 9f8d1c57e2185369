use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "fencing tournament normalization and ranking engine")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Normalize cached competition extracts into the database
    Process,
    /// Print the rolling leaderboard for one category
    Rankings {
        /// Weapon (foil, epee, sabre)
        #[arg(short, long, default_value = "epee")]
        weapon: String,
        /// Gender (m, f)
        #[arg(short, long, default_value = "f")]
        gender: String,
        /// Age bracket (Y8..Y14, Cadet, Junior, Senior)
        #[arg(short, long, default_value = "Senior")]
        age_bracket: String,
    },
}
