//! Command-line option registry
//!
//! Declares every flag the driver recognizes. Concrete drivers may register
//! extra flags before parsing; their values stay available in the retained
//! [`ArgMatches`].

use crate::{
    config::{DEFAULT_MAX_ITER, DriverOptions},
    error::{DriverError, Result},
};
use clap::{Arg, ArgAction, ArgMatches, Command, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use tracing::{debug, instrument};

/// Recommender driver - validates options and runs a recommender
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rec-driver",
    about = "Command-line driver for recommender algorithms",
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true
)]
pub struct DriverArgs {
    /// Training data file
    #[arg(long = "training-file", value_name = "FILE", help_heading = "Files")]
    pub training_file: Option<String>,

    /// Test data file
    #[arg(long = "test-file", value_name = "FILE", help_heading = "Files")]
    pub test_file: Option<String>,

    /// Load all files from DIR
    #[arg(long = "data-dir", value_name = "DIR", help_heading = "Files")]
    pub data_dir: Option<String>,

    /// File containing user attributes
    #[arg(long = "user-attributes", value_name = "FILE", help_heading = "Files")]
    pub user_attributes: Option<String>,

    /// File containing item attributes
    #[arg(long = "item-attributes", value_name = "FILE", help_heading = "Files")]
    pub item_attributes: Option<String>,

    /// File containing user relations
    #[arg(long = "user-relations", value_name = "FILE", help_heading = "Files")]
    pub user_relations: Option<String>,

    /// File containing item relations
    #[arg(long = "item-relations", value_name = "FILE", help_heading = "Files")]
    pub item_relations: Option<String>,

    /// Save the trained model to FILE
    #[arg(long = "save-model", value_name = "FILE", help_heading = "Files")]
    pub save_model: Option<String>,

    /// Load a trained model from FILE
    #[arg(long = "load-model", value_name = "FILE", help_heading = "Files")]
    pub load_model: Option<String>,

    /// Save the user ID mapping to FILE
    #[arg(long = "save-user-mapping", value_name = "FILE", help_heading = "Files")]
    pub save_user_mapping: Option<String>,

    /// Save the item ID mapping to FILE
    #[arg(long = "save-item-mapping", value_name = "FILE", help_heading = "Files")]
    pub save_item_mapping: Option<String>,

    /// Load the user ID mapping from FILE
    #[arg(long = "load-user-mapping", value_name = "FILE", help_heading = "Files")]
    pub load_user_mapping: Option<String>,

    /// Load the item ID mapping from FILE
    #[arg(long = "load-item-mapping", value_name = "FILE", help_heading = "Files")]
    pub load_item_mapping: Option<String>,

    /// Write predictions to FILE
    #[arg(long = "prediction-file", value_name = "FILE", help_heading = "Files")]
    pub prediction_file: Option<String>,

    /// Recommender method to use
    #[arg(long = "recommender", value_name = "METHOD", help_heading = "Recommender")]
    pub recommender: Option<String>,

    /// Options passed to the recommender; repeated occurrences accumulate
    #[arg(
        long = "recommender-options",
        value_name = "OPTIONS",
        action = ArgAction::Append,
        allow_hyphen_values = true,
        help_heading = "Recommender"
    )]
    pub recommender_options: Vec<String>,

    /// Display fit on the training data
    #[arg(long = "compute-fit", help_heading = "Execution")]
    pub compute_fit: bool,

    /// Do not map user and item IDs to internal IDs, keep the original IDs
    #[arg(long = "no-id-mapping", help_heading = "Execution")]
    pub no_id_mapping: bool,

    /// Initialize the random number generator with N
    #[arg(
        long = "random-seed",
        value_name = "N",
        allow_negative_numbers = true,
        help_heading = "Execution"
    )]
    pub random_seed: Option<i64>,

    /// Perform K-fold cross-validation on the training data
    #[arg(
        long = "cross-validation",
        value_name = "K",
        default_value_t = 0,
        help_heading = "Execution"
    )]
    pub cross_validation: u32,

    /// Use a ratio of the training data for testing
    #[arg(
        long = "test-ratio",
        value_name = "NUM",
        default_value_t = 0.0,
        help_heading = "Execution"
    )]
    pub test_ratio: f64,

    /// Perform at most N iterations
    #[arg(
        long = "max-iter",
        value_name = "N",
        default_value_t = DEFAULT_MAX_ITER,
        allow_negative_numbers = true,
        help_heading = "Iteration search"
    )]
    pub max_iter: i32,

    /// Evaluation measure used for the iteration search
    #[arg(long = "measure", value_name = "NAME", help_heading = "Iteration search")]
    pub measure: Option<String>,

    /// Stop when the measure moves more than NUM away from the best result
    #[arg(
        long = "epsilon",
        value_name = "NUM",
        default_value_t = 0.0,
        help_heading = "Iteration search"
    )]
    pub epsilon: f64,

    /// Stop when the measure crosses NUM
    #[arg(
        long = "cutoff",
        value_name = "NUM",
        default_value_t = f64::INFINITY,
        help_heading = "Iteration search"
    )]
    pub cutoff: f64,

    /// Evaluate every N iterations
    #[arg(
        long = "find-iter",
        value_name = "N",
        default_value_t = 0,
        allow_negative_numbers = true,
        help_heading = "Iteration search"
    )]
    pub find_iter: i32,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Display this help and exit
    #[arg(long)]
    pub help: bool,

    /// Display version information and exit
    #[arg(long)]
    pub version: bool,

    /// Arguments not claimed by any flag
    #[arg(value_name = "ARGS", hide = true)]
    pub positionals: Vec<String>,
}

/// Result of option processing
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    /// Populated configuration
    pub options: DriverOptions,
    /// `--help` was given
    pub show_help: bool,
    /// `--version` was given
    pub show_version: bool,
    /// Positional arguments no flag consumed, in order
    pub positionals: Vec<String>,
    /// Raw matches, including flags registered by concrete drivers
    pub matches: ArgMatches,
}

/// Registry of recognized flags
#[derive(Debug, Clone)]
pub struct OptionRegistry {
    command: Command,
}

impl OptionRegistry {
    /// Create a registry holding the base flags
    pub fn new(program: &'static str) -> Self {
        Self {
            command: DriverArgs::command().name(program).bin_name(program),
        }
    }

    /// Register an additional flag; must happen before parsing
    pub fn register(mut self, arg: Arg) -> Self {
        debug!("Registering additional option: {}", arg.get_id());
        self.command = self.command.arg(arg);
        self
    }

    /// Rendered usage and option help
    pub fn usage(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// Parse a full argument vector (program name first)
    #[instrument(skip_all)]
    pub fn parse<I, T>(&self, args: I) -> Result<ParsedArgs>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command
            .clone()
            .try_get_matches_from(args)
            .map_err(|e| DriverError::options(e.to_string()))?;
        let args = DriverArgs::from_arg_matches(&matches)
            .map_err(|e| DriverError::options(e.to_string()))?;

        debug!(
            "Parsed options: help={}, version={}, positionals={:?}",
            args.help, args.version, args.positionals
        );

        Ok(ParsedArgs {
            options: DriverOptions::from_args(&args),
            show_help: args.help,
            show_version: args.version,
            positionals: args.positionals,
            matches,
        })
    }
}
