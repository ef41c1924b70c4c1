//! Command-line interface for dxq
//!
//! This module provides the command-line argument parsing and CLI structure
//! for dxq. It uses clap to define the command-line interface and provides
//! a configuration structure with the overrides given on the command line.

use clap::{Parser, Subcommand};
use dxq_filter::MissingAttribute;
use std::path::PathBuf;

/// dxq - converts SQL WHERE-style filters into grid filters
///
/// Filter strings may refer to values that are only known at run time through
/// `{Entity.Attribute}` placeholders. dxq resolves them against a JSON data
/// map and emits DevExtreme-style nested-array filters.
#[derive(Parser, Debug)]
#[command(name = "dxq")]
#[command(author, version, about)]
#[command(
    long_about = "dxq - converts SQL WHERE-style filters into grid filters\n\n\
    Filter strings may carry {Entity.Attribute} placeholders. dxq resolves them\n\
    against a JSON data map, folds conditions that can be decided up front and\n\
    prints the remaining filter as nested JSON arrays."
)]
#[command(after_help = "EXAMPLES:\n  \
    # Convert a filter against a data file\n  \
    dxq convert 'CompanyID = {Company.ID} AND Status IN (1, 2)' -d data.json\n\n  \
    # Inline data\n  \
    dxq convert 'A = {X.Y}' --data-json '{\"X\": {\"Y\": 5}}'\n\n  \
    # Positional placeholders\n  \
    dxq convert 'BranchID = {0} | [Branch.ID]' -d data.json\n\n  \
    # Inspect the parse tree\n  \
    dxq parse 'A = 1 OR ISNULL(B, 0) = 0'")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file to use
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the filter text comes from
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterSource {
    /// The filter expression (stdin if neither this nor --filter-file is given)
    #[arg(value_name = "FILTER")]
    pub filter: Option<String>,

    /// File containing the filter expression
    #[arg(short = 'f', long, value_name = "FILE", conflicts_with = "filter")]
    pub filter_file: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a filter into a grid filter
    #[command(after_help = "EXAMPLES:\n  \
        dxq convert 'A = {X.Y}' -d data.json\n  \
        dxq convert -f filter.sql --data-json '{\"X.Y\": 5}' --no-short-circuit")]
    Convert {
        #[command(flatten)]
        source: FilterSource,

        /// JSON file holding the data map
        #[arg(short = 'd', long, value_name = "FILE", conflicts_with = "data_json")]
        data: Option<PathBuf>,

        /// Data map given inline as JSON
        #[arg(long, value_name = "JSON")]
        data_json: Option<String>,

        /// Keep conditions that could be decided up front
        #[arg(long)]
        no_short_circuit: bool,

        /// Emit `in` lists instead of expanding them into `=` conditions
        #[arg(long)]
        no_expand_in: bool,

        /// What a missing attribute resolves to (first-property, unresolved)
        #[arg(long, value_name = "POLICY")]
        missing_attribute: Option<MissingAttribute>,

        /// Maximum expression nesting depth
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,

        /// Use compact output (no pretty-printing)
        #[arg(short, long)]
        compact: bool,
    },

    /// Print the syntax tree and placeholder names of a filter
    Parse {
        #[command(flatten)]
        source: FilterSource,

        /// Maximum expression nesting depth
        #[arg(long, value_name = "N")]
        max_depth: Option<usize>,

        /// Use compact output (no pretty-printing)
        #[arg(short, long)]
        compact: bool,
    },

    /// Print the token stream of a filter
    Tokens {
        #[command(flatten)]
        source: FilterSource,

        /// Use compact output (no pretty-printing)
        #[arg(short, long)]
        compact: bool,
    },

    /// Rewrite positional placeholders into inline ones
    Canonicalize {
        #[command(flatten)]
        source: FilterSource,

        /// Use compact output (no pretty-printing)
        #[arg(short, long)]
        compact: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init {
        /// Path to create config file
        #[arg(default_value = "dxq.toml")]
        path: PathBuf,

        /// Force overwrite if file exists
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration file
    Check {
        /// Configuration file to check
        path: PathBuf,
    },
}

/// CLI configuration derived from parsed arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliConfig {
    // Conversion overrides
    pub short_circuit: Option<bool>,
    pub expand_in: Option<bool>,
    pub missing_attribute: Option<MissingAttribute>,

    // Parser overrides
    pub max_depth: Option<usize>,

    // Output options
    pub compact: bool,

    // Debug options
    pub verbose: u8,

    // Other options
    pub config_file: Option<PathBuf>,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        let mut config = CliConfig {
            verbose: cli.verbose,
            config_file: cli.config.clone(),
            ..CliConfig::default()
        };

        match &cli.command {
            Commands::Convert {
                no_short_circuit,
                no_expand_in,
                missing_attribute,
                max_depth,
                compact,
                ..
            } => {
                config.short_circuit = no_short_circuit.then_some(false);
                config.expand_in = no_expand_in.then_some(false);
                config.missing_attribute = *missing_attribute;
                config.max_depth = *max_depth;
                config.compact = *compact;
            }
            Commands::Parse {
                max_depth, compact, ..
            } => {
                config.max_depth = *max_depth;
                config.compact = *compact;
            }
            Commands::Tokens { compact, .. } | Commands::Canonicalize { compact, .. } => {
                config.compact = *compact;
            }
            Commands::Completions { .. } | Commands::Config { .. } => {}
        }

        config
    }
}

/// Parse command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Parse command-line arguments from a vector (for testing)
#[allow(dead_code)]
pub fn parse_args_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}
