//! Storage layer for the mane recommendation engine.
//!
//! The persistence engine itself is an external collaborator; this crate
//! defines the trait boundary the core talks to ([`DataStore`] and the
//! per-concern traits it bundles), plus a lock-protected in-memory
//! reference implementation with atomic gzip snapshots.

pub mod memory;
pub mod snapshot;
pub mod store;

pub use memory::MemoryStore;
pub use snapshot::{seed_from_dir, SnapshotPersistence};
pub use store::{
    CatalogRow, CatalogSource, DataStore, FeedbackEvent, FeedbackStore, NewRecommendation,
    RecommendationRow, RecommendationStore, RuleStore, SurveyStore,
};
