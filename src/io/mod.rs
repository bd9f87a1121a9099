//! Persistence and export.

pub mod documents;
pub mod export;
pub mod store;

pub use documents::{Snapshot, StoredState};
pub use store::{JsonStore, MemoryStore, StateStore};
