//! Core functionality for the recommender driver
//!
//! Contains the driver lifecycle, timing statistics, the iteration search and
//! the collaborators a recommender run works with.

pub mod attributes;
pub mod catalog;
pub mod driver;
pub mod mapping;
pub mod recommender;
pub mod search;
pub mod stats;

pub use catalog::CatalogRecommender;
pub use driver::{Driver, Launch, Parsed, Session};
pub use recommender::{Capabilities, Recommender, RecommenderSetup, SeedSource};
pub use stats::{Series, TimingStats};
