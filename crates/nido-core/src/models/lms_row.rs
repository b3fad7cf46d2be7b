use serde::{Deserialize, Serialize};

/// One row of a WHO growth reference table: the LMS parameters for a given
/// age in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmsRow {
    /// Age in whole days.
    pub day: i64,
    /// Lambda: Box-Cox power (skew).
    pub l: f64,
    /// Mu: median.
    pub m: f64,
    /// Sigma: coefficient of variation.
    pub s: f64,
}
