//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// worklens - Azure DevOps work-item status CLI
///
/// Query work items, sprints, and user stories from Azure DevOps and
/// report on them, or scan a local markdown planning tree for status
/// counts.
///
/// Connection settings come from the environment (AZURE_DEVOPS_ORG,
/// AZURE_DEVOPS_PROJECT, AZURE_DEVOPS_PAT); a .env file is honored.
///
/// Examples:
///   worklens active
///   worklens active --user "Jane Smith" --group-by priority
///   worklens active --csv --no-unassigned
///   worklens stories --state Active --limit 20
///   worklens sprint --all
///   worklens status ./planning
///   worklens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .worklens.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write output to this file instead of stdout
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Generate a default .worklens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show active work items, grouped and summarized
    Active(QueryArgs),

    /// List user stories
    Stories(QueryArgs),

    /// Show the team's sprints
    Sprint {
        /// List all sprints instead of only the current one
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan a local markdown planning tree for PRD/epic/task counts
    Status {
        /// Root directory of the planning tree (default from config)
        #[arg(value_name = "DIR")]
        root: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Flags shared by the work-item query commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Only items assigned to this user (substring match on display name)
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Only items in this state (exact match, case-insensitive)
    #[arg(long, value_name = "STATE")]
    pub state: Option<String>,

    /// Only items of this work-item type (e.g. Task, Bug, "User Story")
    #[arg(long = "type", value_name = "TYPE")]
    pub item_type: Option<String>,

    /// Grouping dimension for the main table section
    #[arg(long, value_enum, default_value = "assignee", value_name = "DIM")]
    pub group_by: GroupBy,

    /// Output format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, conflicts_with_all = ["format", "csv"])]
    pub json: bool,

    /// Output as CSV (shorthand for --format csv)
    #[arg(long, conflicts_with = "format")]
    pub csv: bool,

    /// Drop items with no assignee
    #[arg(long)]
    pub no_unassigned: bool,

    /// Cap the number of items (applied before aggregation)
    #[arg(long, value_name = "COUNT")]
    pub limit: Option<usize>,
}

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Text table grouped per --group-by (default)
    #[default]
    Table,
    /// JSON document
    Json,
    /// CSV rows with a fixed header
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }

    /// Parse a config-file format name, defaulting to the table form.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

/// Grouping dimension for the main table section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GroupBy {
    /// Items per assignee (default)
    #[default]
    Assignee,
    /// Counts per state
    State,
    /// Counts per work-item type
    Type,
    /// Items per priority
    Priority,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A command is required (try 'worklens active' or --help)".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(query) = self.query_args() {
            if query.limit == Some(0) {
                return Err("Limit must be at least 1".to_string());
            }
        }

        Ok(())
    }

    /// The query flags, when the chosen command has them.
    pub fn query_args(&self) -> Option<&QueryArgs> {
        match &self.command {
            Some(Command::Active(query)) | Some(Command::Stories(query)) => Some(query),
            _ => None,
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl QueryArgs {
    /// The explicitly requested format name, if any.
    pub fn format_name(&self) -> Option<&'static str> {
        if self.json {
            Some("json")
        } else if self.csv {
            Some("csv")
        } else {
            self.format.map(|f| f.as_str())
        }
    }

    /// Resolve the output format against the config-file default.
    pub fn effective_format(&self, config_default: &str) -> OutputFormat {
        match self.format_name() {
            Some(name) => OutputFormat::from_name(name),
            None => OutputFormat::from_name(config_default),
        }
    }
}
