// fusion_sim/src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fusion: replay or synthesize lidar/radar logs through the CTRV
/// unscented Kalman filter.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional TOML file layered over the built-in defaults.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (DEBUG level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the filter over a measurement log and print one CSV row per record.
    Replay {
        /// Whitespace-separated measurement records, one per line.
        #[arg(short, long)]
        input: PathBuf,

        /// Abort on the first record the filter rejects instead of skipping it.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Generate a seeded target trajectory and print its measurement records.
    Synth {
        /// Number of records to generate; overrides the configured value.
        #[arg(long)]
        steps: Option<usize>,

        /// Seed for the noise generator; overrides the configured value.
        #[arg(long)]
        seed: Option<u64>,

        /// Run the filter over the generated records and print its CSV instead.
        #[arg(long, default_value_t = false)]
        run: bool,
    },

    /// Print the effective configuration, after every layer, as TOML.
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from(["fusion_sim", "replay", "--input", "log.txt", "-v", "--strict"]);
        assert!(cli.verbose);
        assert!(cli.config.is_none());
        match cli.command {
            Command::Replay { input, strict } => {
                assert_eq!(input, PathBuf::from("log.txt"));
                assert!(strict);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_command_takes_no_arguments() {
        let cli = Cli::parse_from(["fusion_sim", "config", "-c", "fusion.toml"]);
        assert!(matches!(cli.command, Command::Config));
        assert_eq!(cli.config, Some(PathBuf::from("fusion.toml")));
    }

    #[test]
    fn synth_overrides_are_optional() {
        let cli = Cli::parse_from(["fusion_sim", "--config", "a.toml", "synth", "--steps", "40"]);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        match cli.command {
            Command::Synth { steps, seed, run } => {
                assert_eq!(steps, Some(40));
                assert_eq!(seed, None);
                assert!(!run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
