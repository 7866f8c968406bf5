//! Driver lifecycle
//!
//! A run moves through `Driver` (constructed) → [`Parsed`] (options read,
//! hooks installed) → [`Launch`] (help, version, or a validated
//! [`Session`]). Each step consumes the previous one, so a driver runs once.

use crate::{
    cli::{
        args::{OptionRegistry, ParsedArgs},
        validate::validate,
    },
    config::DriverOptions,
    core::{
        attributes::SparseBooleanMatrix,
        mapping::{EntityMapping, IdMapping, IdentityMapping},
        recommender::{Recommender, RecommenderSetup, SeedSource},
        search::IterationSearch,
        stats::TimingStats,
    },
    error::Result,
    utils::hooks,
};
use clap::{Arg, ArgMatches};
use std::{
    ffi::OsString,
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};
use tracing::{debug, info, instrument};

/// A driver that has not parsed its arguments yet
#[derive(Debug)]
pub struct Driver {
    program: &'static str,
    registry: OptionRegistry,
    stats: Arc<TimingStats>,
    user_mapping: EntityMapping,
    item_mapping: EntityMapping,
    install_hooks: bool,
}

/// Options have been parsed; nothing has been validated yet
#[derive(Debug)]
pub struct Parsed {
    program: &'static str,
    registry: OptionRegistry,
    args: ParsedArgs,
    stats: Arc<TimingStats>,
    user_mapping: EntityMapping,
    item_mapping: EntityMapping,
}

/// What the caller should do next
#[derive(Debug)]
pub enum Launch<R> {
    /// Print the version text and exit successfully
    Version(String),
    /// Print the usage text and exit successfully
    Help(String),
    /// Options are valid; run the recommender
    Ready(Session<R>),
}

/// Validated state handed to the recommender run
#[derive(Debug)]
pub struct Session<R> {
    pub options: DriverOptions,
    pub recommender: R,
    pub user_mapping: Box<dyn IdMapping>,
    pub item_mapping: Box<dyn IdMapping>,
    pub user_attributes: Option<SparseBooleanMatrix>,
    pub item_attributes: Option<SparseBooleanMatrix>,
    seed: SeedSource,
    stats: Arc<TimingStats>,
    matches: ArgMatches,
}

impl Driver {
    /// Create a driver with empty ID mappings and the base flags
    pub fn new(program: &'static str) -> Self {
        Self {
            program,
            registry: OptionRegistry::new(program),
            stats: Arc::new(TimingStats::new()),
            user_mapping: EntityMapping::new(),
            item_mapping: EntityMapping::new(),
            install_hooks: true,
        }
    }

    /// Register a flag specific to a concrete driver
    #[must_use]
    pub fn with_option(mut self, arg: Arg) -> Self {
        self.registry = self.registry.register(arg);
        self
    }

    /// Skip the process-wide interrupt and panic hooks (embedding, tests)
    #[must_use]
    pub fn without_process_hooks(mut self) -> Self {
        self.install_hooks = false;
        self
    }

    /// Timing statistics shared with the hooks and the session
    pub fn stats(&self) -> Arc<TimingStats> {
        Arc::clone(&self.stats)
    }

    /// Install hooks, then parse a full argument vector (program name first)
    #[instrument(skip_all, fields(program = self.program))]
    pub fn parse<I, T>(self, args: I) -> Result<Parsed>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        if self.install_hooks {
            hooks::install(Arc::clone(&self.stats))?;
            debug!("Interrupt and panic hooks installed");
        }

        let args = self.registry.parse(args)?;

        Ok(Parsed {
            program: self.program,
            registry: self.registry,
            args,
            stats: self.stats,
            user_mapping: self.user_mapping,
            item_mapping: self.item_mapping,
        })
    }
}

impl Parsed {
    pub fn options(&self) -> &DriverOptions {
        &self.args.options
    }

    /// Raw matches, including flags added with [`Driver::with_option`]
    pub fn matches(&self) -> &ArgMatches {
        &self.args.matches
    }

    /// Handle `--version`/`--help`, seed, build the recommender and validate
    #[instrument(skip_all)]
    pub fn launch<R, F>(self, build: F) -> Result<Launch<R>>
    where
        R: Recommender,
        F: FnOnce(&RecommenderSetup) -> Result<R>,
    {
        if self.args.show_version {
            return Ok(Launch::Version(format!(
                "{} {}",
                self.program,
                env!("CARGO_PKG_VERSION")
            )));
        }
        if self.args.show_help {
            return Ok(Launch::Help(self.registry.usage()));
        }

        let ParsedArgs {
            options,
            positionals,
            matches,
            ..
        } = self.args;

        let seed = SeedSource::new(options.evaluation.random_seed);
        if let Some(value) = seed.seed() {
            info!("Using random seed {}", value);
        }
        self.stats.set_show_fit(options.evaluation.compute_fit);

        let setup = RecommenderSetup {
            method: options.selection.method.clone(),
            options: options.selection.recommender_options.clone(),
            seed,
        };
        let recommender = build(&setup)?;
        debug!("Built recommender {}", recommender.name());

        validate(
            &options,
            recommender.capabilities(),
            &positionals,
            &self.registry.usage(),
        )?;

        let user_mapping = resolve_mapping(
            &options,
            options.files.load_user_mapping.as_deref(),
            self.user_mapping,
        )?;
        let item_mapping = resolve_mapping(
            &options,
            options.files.load_item_mapping.as_deref(),
            self.item_mapping,
        )?;

        info!("Validated options for recommender {}", recommender.name());
        Ok(Launch::Ready(Session {
            options,
            recommender,
            user_mapping,
            item_mapping,
            user_attributes: None,
            item_attributes: None,
            seed,
            stats: self.stats,
            matches,
        }))
    }
}

fn resolve_mapping(
    options: &DriverOptions,
    load_from: Option<&str>,
    fresh: EntityMapping,
) -> Result<Box<dyn IdMapping>> {
    if options.evaluation.no_id_mapping {
        return Ok(Box::new(IdentityMapping::new()));
    }
    match load_from {
        Some(file) => Ok(Box::new(EntityMapping::load(&options.files.resolve(file))?)),
        None => Ok(Box::new(fresh)),
    }
}

impl<R> Session<R> {
    pub fn seed(&self) -> SeedSource {
        self.seed
    }

    pub fn stats(&self) -> &Arc<TimingStats> {
        &self.stats
    }

    /// Raw matches, including flags added with [`Driver::with_option`]
    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }

    /// Iteration search configured from the iteration controls
    pub fn iteration_search(&self) -> Result<IterationSearch> {
        IterationSearch::new(
            &self.options.search,
            self.options.evaluation.compute_fit,
            Arc::clone(&self.stats),
        )
    }

    /// Save the ID mappings requested with `--save-*-mapping`
    #[instrument(skip(self))]
    pub fn save_mappings(&self) -> Result<Vec<PathBuf>> {
        let files = &self.options.files;
        let mut saved = Vec::new();
        for (target, mapping) in [
            (&files.save_user_mapping, &self.user_mapping),
            (&files.save_item_mapping, &self.item_mapping),
        ] {
            if let Some(file) = target {
                let path = files.resolve(file);
                mapping.save(&path)?;
                info!("Saved ID mapping to {}", path.display());
                saved.push(path);
            }
        }
        Ok(saved)
    }

    /// Write the timing and memory report to `out`
    pub fn report_stats<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.stats.write_report(out)
    }
}
