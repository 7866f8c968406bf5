//! Command-line interface module
//!
//! Provides the option registry, cross-field validation and the binary's
//! delegated run.

pub mod args;
pub mod commands;
pub mod validate;

pub use args::{DriverArgs, OptionRegistry, ParsedArgs};
pub use commands::execute_dry_run;
pub use validate::{ValidationRule, validate};
