//! Built-in recommender descriptors
//!
//! The binary resolves `--recommender` against this catalog. Entries carry
//! only what the driver needs: a name, the side inputs the method requires,
//! and whether it trains iteratively.

use crate::{
    core::recommender::{Capabilities, Recommender, RecommenderOptions, RecommenderSetup},
    error::{DriverError, Result},
};
use serde::Serialize;
use tracing::{debug, info};

/// Method used when `--recommender` is not given
pub const DEFAULT_METHOD: &str = "UserItemBaseline";

/// A method known to the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub capabilities: Capabilities,
    pub iterative: bool,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "GlobalAverage",
        capabilities: Capabilities::NONE,
        iterative: false,
    },
    CatalogEntry {
        name: "UserItemBaseline",
        capabilities: Capabilities::NONE,
        iterative: true,
    },
    CatalogEntry {
        name: "BiasedMatrixFactorization",
        capabilities: Capabilities::NONE,
        iterative: true,
    },
    CatalogEntry {
        name: "UserAttributeKNN",
        capabilities: Capabilities::NONE.with_user_attributes(),
        iterative: false,
    },
    CatalogEntry {
        name: "ItemAttributeKNN",
        capabilities: Capabilities::NONE.with_item_attributes(),
        iterative: false,
    },
    CatalogEntry {
        name: "SocialMF",
        capabilities: Capabilities::NONE.with_user_relations(),
        iterative: true,
    },
    CatalogEntry {
        name: "ItemRelationKNN",
        capabilities: Capabilities::NONE.with_item_relations(),
        iterative: false,
    },
];

/// All catalog entries
pub fn entries() -> &'static [CatalogEntry] {
    CATALOG
}

/// Look up a method by name, ignoring ASCII case
pub fn find(method: &str) -> Option<&'static CatalogEntry> {
    CATALOG
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(method))
}

/// A catalog method configured for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecommender {
    pub entry: CatalogEntry,
    pub options: RecommenderOptions,
    pub seed: Option<i64>,
}

impl CatalogRecommender {
    /// Factory for [`crate::core::driver::Parsed::launch`]
    pub fn create(setup: &RecommenderSetup) -> Result<Self> {
        let method = match setup.method.as_deref() {
            Some(method) => method,
            None => {
                info!("No recommender given, using {}", DEFAULT_METHOD);
                DEFAULT_METHOD
            }
        };

        let entry = find(method).ok_or_else(|| {
            let known: Vec<&str> = CATALOG.iter().map(|entry| entry.name).collect();
            DriverError::recommender(format!(
                "unknown recommender '{method}'; known methods: {}",
                known.join(", ")
            ))
        })?;
        let options = setup.parsed_options()?;
        debug!("Selected {} with {} option(s)", entry.name, options.len());

        Ok(Self {
            entry: *entry,
            options,
            seed: setup.seed.seed(),
        })
    }
}

impl Recommender for CatalogRecommender {
    fn name(&self) -> &str {
        self.entry.name
    }

    fn capabilities(&self) -> Capabilities {
        self.entry.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recommender::SeedSource;

    fn setup(method: Option<&str>, options: &str) -> RecommenderSetup {
        RecommenderSetup {
            method: method.map(str::to_string),
            options: options.to_string(),
            seed: SeedSource::new(Some(3)),
        }
    }

    #[test]
    fn test_find_ignores_case() {
        assert_eq!(find("socialmf").map(|e| e.name), Some("SocialMF"));
        assert!(find("NoSuchMethod").is_none());
    }

    #[test]
    fn test_default_method() {
        let recommender = CatalogRecommender::create(&setup(None, "")).unwrap();
        assert_eq!(recommender.name(), DEFAULT_METHOD);
        assert_eq!(recommender.seed, Some(3));
    }

    #[test]
    fn test_capabilities_of_entries() {
        let recommender =
            CatalogRecommender::create(&setup(Some("UserAttributeKNN"), " k=40")).unwrap();
        assert!(recommender.capabilities().user_attributes);
        assert_eq!(recommender.options.get("k"), Some("40"));

        let checks: [fn(Capabilities) -> bool; 4] = [
            |c| c.user_attributes,
            |c| c.item_attributes,
            |c| c.user_relations,
            |c| c.item_relations,
        ];
        for check in checks {
            assert!(entries().iter().any(|entry| check(entry.capabilities)));
        }
    }

    #[test]
    fn test_unknown_method() {
        let err = CatalogRecommender::create(&setup(Some("Magic"), "")).unwrap_err();
        assert!(err.to_string().contains("Magic"));
        assert!(err.to_string().contains("GlobalAverage"));
    }

    #[test]
    fn test_malformed_options() {
        assert!(CatalogRecommender::create(&setup(Some("GlobalAverage"), " oops")).is_err());
    }
}
