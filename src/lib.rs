//! # Recommender Driver
//!
//! A command-line driver skeleton for recommender executables. It declares
//! a shared set of options, validates their combinations before a
//! recommender runs, dumps timing statistics on interrupt, and aggregates
//! timings across training iterations, fit computation and evaluation.
//!
//! ## Features
//!
//! - Option registry with flags for I/O paths, model and ID-mapping
//!   persistence, side inputs, evaluation and iteration search
//! - Ordered cross-field validation with one deterministic message per run
//! - Capability-gated requirements for attribute and relation files
//! - Interrupt-triggered statistics report that does not stop the run
//!
//! ## Example
//!
//! ```no_run
//! use rec_driver::core::{CatalogRecommender, Driver, Launch};
//!
//! let parsed = Driver::new("rec-driver").parse(std::env::args_os())?;
//! match parsed.launch(CatalogRecommender::create)? {
//!     Launch::Version(text) | Launch::Help(text) => println!("{text}"),
//!     Launch::Ready(session) => println!("running {}", session.recommender.entry.name),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging on stderr with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
