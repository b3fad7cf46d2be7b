//! WHO LMS percentile engine.
//!
//! `ReferenceTableProvider` owns the day-indexed LMS tables (lazily built
//! from an injected source); `PercentileCalculator` is the pure transform
//! from (type, sex, value, age) to a z-score/percentile pair.

pub mod calculator;
pub mod lms;
pub mod provider;

pub use calculator::{PercentileCalculator, PercentileReading};
pub use provider::ReferenceTableProvider;
