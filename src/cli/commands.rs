use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "keycop")]
#[command(version, about = "Finds, verifies, and responsibly discloses leaked API keys", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the platform for leaked keys of one credential type
    Search {
        /// Credential type to search for (e.g. OPENAI, GEMINI)
        key_type: String,
    },

    /// Verify found keys against their issuing providers
    Verify,

    /// Open disclosure issues for confirmed-live keys
    Notify {
        /// Only notify for this repository (owner/name)
        #[arg(short, long)]
        repo: Option<String>,

        /// Render reports without creating issues or changing statuses
        #[arg(long)]
        dry_run: bool,
    },

    /// Probe a single key and print the outcome
    Test {
        /// The key to probe
        key: String,

        /// Credential type (e.g. OPENAI, GEMINI)
        #[arg(short, long)]
        key_type: String,
    },

    /// List the registered credential-type providers
    List,
}
