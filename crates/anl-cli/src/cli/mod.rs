use std::path::PathBuf;

use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `anl` binary.
#[derive(Debug, Parser)]
#[command(
    name = "anl",
    version,
    about = "annoloop - move IDOL documents through Doccano and train on the annotations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra config file, merged over the user and project files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            config: self.config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, Commands, OutputFormat};
    use crate::cli::subcommands::TrainCommands;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "anl",
            "--format",
            "raw",
            "--config",
            "local.toml",
            "--verbose",
            "login",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, OutputFormat::Raw);
        assert_eq!(cli.config, Some(PathBuf::from("local.toml")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Login));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["anl", "export", "Reviews", "--quiet"])
            .expect("cli should parse");

        assert!(cli.quiet);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Export(ref args) if args.name == "Reviews"));
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["anl", "--format", "table", "login"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn pull_index_flag_defaults_off() {
        let cli = Cli::try_parse_from(["anl", "pull", "Reviews"]).expect("cli should parse");
        assert!(matches!(cli.command, Commands::Pull(ref args) if !args.index));

        let cli = Cli::try_parse_from(["anl", "pull", "Reviews", "--index"])
            .expect("cli should parse");
        assert!(matches!(cli.command, Commands::Pull(ref args) if args.index));
    }

    #[test]
    fn train_ner_defaults() {
        let cli = Cli::try_parse_from(["anl", "train", "ner"]).expect("cli should parse");
        let Commands::Train { action: TrainCommands::Ner(args) } = cli.command else {
            panic!("expected train ner");
        };
        assert_eq!(args.iterations, 100);
        assert!(args.data.is_none());
        assert!(args.model.is_none());
    }

    #[test]
    fn train_sentiment_options() {
        let cli = Cli::try_parse_from([
            "anl",
            "train",
            "sentiment",
            "--data",
            "data/sentiment.csv",
            "--output",
            "models/sentiment",
            "--texts",
            "500",
            "--limit",
            "1000",
            "--seed",
            "7",
        ])
        .expect("cli should parse");
        let Commands::Train { action: TrainCommands::Sentiment(args) } = cli.command else {
            panic!("expected train sentiment");
        };
        assert_eq!(args.data, Some(PathBuf::from("data/sentiment.csv")));
        assert_eq!(args.output, Some(PathBuf::from("models/sentiment")));
        assert_eq!(args.iterations, 20);
        assert_eq!(args.texts, 500);
        assert_eq!(args.limit, 1000);
        assert_eq!(args.seed, Some(7));
    }
}
