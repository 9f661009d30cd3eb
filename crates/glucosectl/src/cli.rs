//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};

/// Glucose Voice control CLI
#[derive(Parser, Debug)]
#[command(name = "glucosectl")]
#[command(about = "Glucose Voice - Nightscout readings for Alexa", long_about = None)]
#[command(version = env!("GLUCOSE_VOICE_VERSION"))]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Log to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Fetch the latest reading and print what Alexa would say
    Reading {
        /// Print the raw entry as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Send a test request to a running glucosed
    Ask {
        /// Intent name (launch request when omitted)
        intent: Option<String>,

        /// Skill endpoint URL (overrides $GLUCOSED_URL and the default)
        #[arg(long)]
        url: Option<String>,
    },

    /// Show the settings a skill request would use right now
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reading() {
        let cli = Cli::try_parse_from(["glucosectl", "reading", "--json"]).unwrap();
        assert_eq!(cli.command, Commands::Reading { json: true });
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from([
            "glucosectl",
            "-vv",
            "ask",
            "GetGlucoseIntent",
            "--url",
            "http://localhost:9000/alexa",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Ask {
                intent: Some("GetGlucoseIntent".to_string()),
                url: Some("http://localhost:9000/alexa".to_string()),
            }
        );
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_parse_ask_without_intent() {
        let cli = Cli::try_parse_from(["glucosectl", "ask"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Ask {
                intent: None,
                url: None
            }
        );
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["glucosectl"]).is_err());
    }
}
