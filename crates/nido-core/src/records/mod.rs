pub mod growth;
pub mod measurement;
pub mod subject;

pub use growth::{GrowthRecord, MeasurementSource};
pub use measurement::{round_to, MeasurementType, Measurements, PercentileSet};
pub use subject::{Sex, Subject, SubjectField};
