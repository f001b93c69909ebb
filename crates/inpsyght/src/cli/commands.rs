//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Forms command arguments.
#[derive(Debug, Args)]
pub struct FormsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Take command arguments.
#[derive(Debug, Args)]
pub struct TakeCommand {
    /// Document id of the form
    pub form_id: String,
}

/// Answer command arguments.
#[derive(Debug, Args)]
pub struct AnswerCommand {
    /// Document id of the form
    pub form_id: String,

    /// Question id
    pub question_id: String,

    /// Answer value (1 = strongly disagree, 5 = strongly agree)
    #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
    pub value: u8,
}

/// Progress command arguments.
#[derive(Debug, Args)]
pub struct ProgressCommand {
    /// Document id of the form
    pub form_id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Results command arguments.
#[derive(Debug, Args)]
pub struct ResultsCommand {
    /// Document id of the form
    pub form_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Don't store the results in history
    #[arg(long)]
    pub no_archive: bool,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Document id of the form
    pub form_id: String,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// History commands.
#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List completed attempts
    List {
        /// Only show attempts for this form
        #[arg(short, long)]
        form: Option<String>,

        /// Maximum number of entries (defaults to `storage.history_limit`)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show an archived report
    Show {
        /// History entry id
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Delete an archived report
    Delete {
        /// History entry id
        id: i64,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Full text report
    #[default]
    Plain,
    /// Per-factor summary table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(
            OutputFormat::from_str("table", true).unwrap(),
            OutputFormat::Table
        );
        assert!(OutputFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn test_history_command_debug() {
        let cmd = HistoryCommand::List {
            form: Some("form-1".to_string()),
            limit: None,
            json: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("List"));
        assert!(debug_str.contains("form-1"));
    }

    #[test]
    fn test_results_command_debug() {
        let cmd = ResultsCommand {
            form_id: "form-1".to_string(),
            format: OutputFormat::Json,
            no_archive: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("no_archive: true"));
        assert!(debug_str.contains("Json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
