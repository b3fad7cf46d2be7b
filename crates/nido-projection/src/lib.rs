//! Asynchronous projection path: consumes the subject change-event feed to
//! keep the canonical birth record consistent, and cascades percentile
//! invalidation when a reference input (sex, date of birth) shifts.
//!
//! Everything here is idempotent per event; the feed delivers at least once
//! with no ordering across subjects. A missing percentile cache is the
//! durable "recompute owed" signal, so every step converges to the same
//! fixed point as the synchronous path regardless of interleaving.

pub mod invalidation;
pub mod observer;
pub mod projector;
pub mod recompute_task;

pub use invalidation::{InvalidationSummary, PercentileInvalidator};
pub use observer::{GrowthChangeEvent, GrowthChangeObserver};
pub use projector::{BirthAction, BirthMeasurementProjector, ProjectionReport};
pub use recompute_task::{RecordRecomputeTask, TaskOutcome};
