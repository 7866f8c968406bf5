//! Recommender collaborator interface
//!
//! The driver only asks a recommender which auxiliary inputs it needs. Seeds
//! and option strings reach the recommender through [`RecommenderSetup`] when
//! it is constructed.

use crate::error::{DriverError, Result};
use rand::{SeedableRng, rngs::StdRng};
use regex::Regex;
use serde::Serialize;
use std::{collections::BTreeMap, str::FromStr};
use tracing::debug;

/// Optional capabilities that gate required side inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub user_attributes: bool,
    pub item_attributes: bool,
    pub user_relations: bool,
    pub item_relations: bool,
}

impl Capabilities {
    /// No optional inputs required
    pub const NONE: Self = Self {
        user_attributes: false,
        item_attributes: false,
        user_relations: false,
        item_relations: false,
    };

    #[must_use]
    pub const fn with_user_attributes(mut self) -> Self {
        self.user_attributes = true;
        self
    }

    #[must_use]
    pub const fn with_item_attributes(mut self) -> Self {
        self.item_attributes = true;
        self
    }

    #[must_use]
    pub const fn with_user_relations(mut self) -> Self {
        self.user_relations = true;
        self
    }

    #[must_use]
    pub const fn with_item_relations(mut self) -> Self {
        self.item_relations = true;
        self
    }
}

/// A recommender the driver can launch
pub trait Recommender {
    /// Display name
    fn name(&self) -> &str;

    /// Side inputs this recommender requires
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }
}

/// Source of random number generators for one run
///
/// Created once, after option processing and before the recommender is
/// built, so every generator it hands out observes the same seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSource {
    seed: Option<i64>,
}

impl SeedSource {
    pub const fn new(seed: Option<i64>) -> Self {
        Self { seed }
    }

    /// The supplied seed, if any
    pub const fn seed(&self) -> Option<i64> {
        self.seed
    }

    /// A generator seeded from `--random-seed`, or from OS entropy
    ///
    /// Negative seeds keep their bit pattern, so every supplied value maps to
    /// a distinct generator.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(u64::from_ne_bytes(seed.to_ne_bytes())),
            None => StdRng::from_entropy(),
        }
    }
}

/// Everything a recommender factory receives
#[derive(Debug, Clone)]
pub struct RecommenderSetup {
    /// Value of `--recommender`
    pub method: Option<String>,
    /// Raw accumulated `--recommender-options`
    pub options: String,
    /// Seed for randomized logic
    pub seed: SeedSource,
}

impl RecommenderSetup {
    /// Parse the accumulated recommender options
    pub fn parsed_options(&self) -> Result<RecommenderOptions> {
        RecommenderOptions::parse(&self.options)
    }
}

/// `key=value` pairs taken from `--recommender-options`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecommenderOptions {
    values: BTreeMap<String, String>,
}

impl RecommenderOptions {
    /// Parse whitespace-separated `key=value` fragments; later keys override
    pub fn parse(raw: &str) -> Result<Self> {
        let pair = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)=(.*)$")
            .map_err(|e| DriverError::recommender(format!("Failed to compile regex: {e}")))?;

        let mut values = BTreeMap::new();
        for fragment in raw.split_whitespace() {
            let captures = pair.captures(fragment).ok_or_else(|| {
                DriverError::recommender(format!(
                    "recommender option '{fragment}' is not of the form key=value"
                ))
            })?;
            let key = captures[1].to_string();
            let value = captures[2].to_string();
            debug!("Recommender option {}={}", key, value);
            values.insert(key, value);
        }

        Ok(Self { values })
    }

    /// Raw value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key` converted to `T`
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|value| {
                value.parse::<T>().map_err(|e| {
                    DriverError::recommender(format!(
                        "invalid value '{value}' for recommender option '{key}': {e}"
                    ))
                })
            })
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
