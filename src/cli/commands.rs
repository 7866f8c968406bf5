//! Delegated run for the binary
//!
//! The binary ships no recommender algorithms: once options are validated it
//! reports the resolved run plan, persists requested ID mappings and prints
//! the timing report.

use crate::{
    config::{DriverOptions, EvaluationPlan},
    core::{
        catalog::CatalogRecommender,
        driver::Session,
        recommender::{Capabilities, Recommender, RecommenderOptions},
    },
};
use anyhow::Context;
use serde::Serialize;
use std::io::Write;
use tracing::{info, instrument};

/// Resolved configuration of a validated run
#[derive(Debug, Serialize)]
pub struct RunPlan<'a> {
    pub recommender: &'a str,
    pub capabilities: Capabilities,
    pub iterative: bool,
    pub evaluation: EvaluationPlan,
    pub recommender_options: &'a RecommenderOptions,
    pub options: &'a DriverOptions,
}

impl<'a> RunPlan<'a> {
    pub fn new(session: &'a Session<CatalogRecommender>) -> Self {
        Self {
            recommender: session.recommender.name(),
            capabilities: session.recommender.capabilities(),
            iterative: session.recommender.entry.iterative,
            evaluation: session.options.evaluation_plan(),
            recommender_options: &session.recommender.options,
            options: &session.options,
        }
    }
}

/// Write the run plan to `out`, save mappings, and report statistics to `diag`
#[instrument(skip_all)]
pub fn execute_dry_run<W: Write, D: Write>(
    session: &Session<CatalogRecommender>,
    out: &mut W,
    diag: &mut D,
) -> anyhow::Result<()> {
    info!("Preparing run plan for {}", session.recommender.name());

    let plan = RunPlan::new(session);
    serde_json::to_writer_pretty(&mut *out, &plan).context("Failed to write run plan")?;
    writeln!(out).context("Failed to write run plan")?;

    let saved = session
        .save_mappings()
        .context("Failed to save ID mappings")?;
    for path in &saved {
        info!("ID mapping written to {}", path.display());
    }

    session
        .report_stats(diag)
        .context("Failed to write statistics")?;
    Ok(())
}
