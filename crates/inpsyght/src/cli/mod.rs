//! Command-line interface for inpsyght.
//!
//! This module provides the CLI structure for the `inpsyght` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AnswerCommand, ConfigCommand, FormsCommand, HistoryCommand, OutputFormat, ProgressCommand,
    ResetCommand, ResultsCommand, StatusCommand, TakeCommand,
};

/// inpsyght - Big Five personality questionnaires in the terminal
///
/// Fetches questionnaires from a Strapi CMS, keeps your answers locally
/// while you go, and scores them per facet and factor.
#[derive(Debug, Parser)]
#[command(name = "inpsyght")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read forms from a JSON file instead of the CMS
    #[arg(long, global = true, value_name = "FILE")]
    pub source_file: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List available forms
    Forms(FormsCommand),

    /// Answer a form interactively
    Take(TakeCommand),

    /// Record a single answer
    Answer(AnswerCommand),

    /// Show how far a form has been answered
    Progress(ProgressCommand),

    /// Score cached answers
    Results(ResultsCommand),

    /// Discard cached answers and start over
    Reset(ResetCommand),

    /// Browse completed attempts
    #[command(subcommand)]
    History(HistoryCommand),

    /// Show storage and CMS status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            source_file: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "inpsyght");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_forms() {
        let cli = Cli::try_parse_from(["inpsyght", "forms", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Forms(FormsCommand { json: true })));
    }

    #[test]
    fn test_parse_take() {
        let cli = Cli::try_parse_from(["inpsyght", "take", "abc123"]).unwrap();
        match cli.command {
            Command::Take(cmd) => assert_eq!(cmd.form_id, "abc123"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_answer() {
        let cli = Cli::try_parse_from(["inpsyght", "answer", "form-1", "q1", "4"]).unwrap();
        match cli.command {
            Command::Answer(cmd) => {
                assert_eq!(cmd.form_id, "form-1");
                assert_eq!(cmd.question_id, "q1");
                assert_eq!(cmd.value, 4);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_answer_rejects_out_of_range() {
        assert!(Cli::try_parse_from(["inpsyght", "answer", "form-1", "q1", "0"]).is_err());
        assert!(Cli::try_parse_from(["inpsyght", "answer", "form-1", "q1", "6"]).is_err());
    }

    #[test]
    fn test_parse_results_format() {
        let cli =
            Cli::try_parse_from(["inpsyght", "results", "form-1", "-f", "table", "--no-archive"])
                .unwrap();
        match cli.command {
            Command::Results(cmd) => {
                assert_eq!(cmd.format, OutputFormat::Table);
                assert!(cmd.no_archive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_history_list() {
        let cli = Cli::try_parse_from(["inpsyght", "history", "list", "--form", "form-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History(HistoryCommand::List { form: Some(_), limit: None, json: false })
        ));
    }

    #[test]
    fn test_parse_history_show() {
        let cli = Cli::try_parse_from(["inpsyght", "history", "show", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::History(HistoryCommand::Show { id: 7, .. })
        ));
    }

    #[test]
    fn test_parse_reset_yes() {
        let cli = Cli::try_parse_from(["inpsyght", "reset", "form-1", "-y"]).unwrap();
        assert!(matches!(cli.command, Command::Reset(ResetCommand { yes: true, .. })));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["inpsyght", "-c", "/custom/config.toml", "status"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_source_file_after_subcommand() {
        let cli = Cli::try_parse_from(["inpsyght", "forms", "--source-file", "forms.json"]).unwrap();
        assert_eq!(cli.source_file, Some(PathBuf::from("forms.json")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["inpsyght", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["inpsyght", "-q", "status"]).unwrap();
        assert!(cli.quiet);
    }
}
