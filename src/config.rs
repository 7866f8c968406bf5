//! Configuration management for the recommender driver
//!
//! Holds the parsed option values for one run, grouped by concern.

use crate::cli::DriverArgs;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default maximum number of training iterations
pub const DEFAULT_MAX_ITER: i32 = 100;

/// Parsed configuration values for a single run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverOptions {
    /// Enable debug logging
    pub debug: bool,
    /// Input, output and persistence paths
    pub files: FileOptions,
    /// Recommender selection
    pub selection: SelectionOptions,
    /// Held-out evaluation and ID handling
    pub evaluation: EvaluationOptions,
    /// Iteration search controls
    pub search: SearchOptions,
}

/// File and directory paths. `None` means the flag was not given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileOptions {
    pub training_file: Option<String>,
    pub test_file: Option<String>,
    pub data_dir: Option<String>,
    pub user_attributes: Option<String>,
    pub item_attributes: Option<String>,
    pub user_relations: Option<String>,
    pub item_relations: Option<String>,
    pub save_model: Option<String>,
    pub load_model: Option<String>,
    pub save_user_mapping: Option<String>,
    pub save_item_mapping: Option<String>,
    pub load_user_mapping: Option<String>,
    pub load_item_mapping: Option<String>,
    pub prediction_file: Option<String>,
}

/// Recommender selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionOptions {
    /// Recommender method name
    pub method: Option<String>,
    /// Accumulated recommender options, each fragment prefixed by a space
    pub recommender_options: String,
}

/// Execution and held-out evaluation controls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOptions {
    /// Compute fit on the training data
    pub compute_fit: bool,
    /// Use numeric IDs directly instead of mapping them
    pub no_id_mapping: bool,
    /// Seed for randomized recommender logic; `None` when not supplied
    pub random_seed: Option<i64>,
    /// Number of cross-validation folds; 0 disables cross-validation
    pub cross_validation: u32,
    /// Share of the training data held out for testing
    pub test_ratio: f64,
}

/// Iteration search controls
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOptions {
    /// Values of 0 or below allow no further iterations
    pub max_iter: i32,
    pub measure: Option<String>,
    pub epsilon: f64,
    /// Unbounded (`f64::INFINITY`) unless given
    pub cutoff: f64,
    /// Evaluate every N iterations; 0 or below disables the search
    pub find_iter: i32,
}

/// Held-out evaluation strategy implied by the options
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationPlan {
    /// Aggregate metrics over K folds
    CrossValidation { folds: u32 },
    /// Split the training data by ratio
    TestRatio { ratio: f64 },
    /// Evaluate against a separate test file
    TestFile,
    /// Train only
    TrainingOnly,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            debug: false,
            files: FileOptions::default(),
            selection: SelectionOptions::default(),
            evaluation: EvaluationOptions::default(),
            search: SearchOptions::default(),
        }
    }
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            compute_fit: false,
            no_id_mapping: false,
            random_seed: None,
            cross_validation: 0,
            test_ratio: 0.0,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            measure: None,
            epsilon: 0.0,
            cutoff: f64::INFINITY,
            find_iter: 0,
        }
    }
}

impl DriverOptions {
    /// Create options from parsed command line arguments
    pub fn from_args(args: &DriverArgs) -> Self {
        let recommender_options = args
            .recommender_options
            .iter()
            .map(|fragment| format!(" {fragment}"))
            .collect();

        Self {
            debug: args.debug,
            files: FileOptions {
                training_file: args.training_file.clone(),
                test_file: args.test_file.clone(),
                data_dir: args.data_dir.clone(),
                user_attributes: args.user_attributes.clone(),
                item_attributes: args.item_attributes.clone(),
                user_relations: args.user_relations.clone(),
                item_relations: args.item_relations.clone(),
                save_model: args.save_model.clone(),
                load_model: args.load_model.clone(),
                save_user_mapping: args.save_user_mapping.clone(),
                save_item_mapping: args.save_item_mapping.clone(),
                load_user_mapping: args.load_user_mapping.clone(),
                load_item_mapping: args.load_item_mapping.clone(),
                prediction_file: args.prediction_file.clone(),
            },
            selection: SelectionOptions {
                method: args.recommender.clone(),
                recommender_options,
            },
            evaluation: EvaluationOptions {
                compute_fit: args.compute_fit,
                no_id_mapping: args.no_id_mapping,
                random_seed: args.random_seed,
                cross_validation: args.cross_validation,
                test_ratio: args.test_ratio,
            },
            search: SearchOptions {
                max_iter: args.max_iter,
                measure: args.measure.clone(),
                epsilon: args.epsilon,
                cutoff: args.cutoff,
                find_iter: args.find_iter,
            },
        }
    }

    /// Held-out evaluation strategy for this run
    pub fn evaluation_plan(&self) -> EvaluationPlan {
        if self.evaluation.cross_validation > 1 {
            EvaluationPlan::CrossValidation {
                folds: self.evaluation.cross_validation,
            }
        } else if self.evaluation.test_ratio != 0.0 {
            EvaluationPlan::TestRatio {
                ratio: self.evaluation.test_ratio,
            }
        } else if self.files.test_file.is_some() {
            EvaluationPlan::TestFile
        } else {
            EvaluationPlan::TrainingOnly
        }
    }
}

impl FileOptions {
    /// Resolve a file name against `--data-dir`; absolute paths are kept
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        match &self.data_dir {
            Some(dir) if path.is_relative() => Path::new(dir).join(path),
            _ => path.to_path_buf(),
        }
    }
}
