//! Alea Core Library
//!
//! Site content model, backend boundaries and the page builder's content
//! synchronization engine shared by Alea tools.

pub mod builder;
pub mod models;
pub mod reader;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{
    BuilderError, ContentStatus, KeyFailure, PageBuilder, SaveError, SaveOutcome, SnapshotPolicy,
};
pub use models::{ContentRecord, DraftEntry, FLAT_FIELDS};
pub use reader::SiteContentReader;
pub use store::{BackendClient, ContentStore, ObjectStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
