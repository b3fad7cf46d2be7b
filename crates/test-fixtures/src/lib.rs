//! Shared test fixtures for the nido workspace: an in-memory record store
//! with real transactional semantics, a deterministic reference-table
//! source, a recording dispatcher, and model builders.

mod builders;
mod dispatch;
mod reference;
mod store;

pub use builders::{growth_record, subject};
pub use dispatch::RecordingDispatch;
pub use reference::StaticReferenceSource;
pub use store::MemoryRecordStore;
