//! Synchronous recompute path: classify a subject update, recompute exactly
//! the growth records the change implies, and hand the refreshed data back
//! within the same request.

pub mod classifier;
pub mod orchestrator;
pub mod outcome;

pub use classifier::{classify, RecomputeScope};
pub use orchestrator::RecomputeOrchestrator;
pub use outcome::{
    AnnotatedRecord, BirthOnlyRecompute, FullRecompute, RecomputeOutcome, RecomputeSkipped,
    SkipReason,
};
