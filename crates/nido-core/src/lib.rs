//! # nido-core
//!
//! Foundation crate for the nido growth-tracking system.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod models;
pub mod records;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::NidoConfig;
pub use errors::{NidoError, NidoResult};
pub use records::{
    GrowthRecord, MeasurementSource, MeasurementType, Measurements, PercentileSet, Sex, Subject,
    SubjectField,
};
