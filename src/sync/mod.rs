//! Tag synchronization
//!
//! Keeps a periodically rebuilt tag↔digest index for the tracked repository
//! and answers alias queries from the latest published snapshot.

pub mod engine;
pub mod index;

pub use engine::{SyncEngine, SyncReport, TagFilter};
pub use index::{IndexChanges, IndexStore, TagIndex};
