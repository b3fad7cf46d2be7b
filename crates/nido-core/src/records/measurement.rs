use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::PERCENTILE_DECIMALS;

/// The three tracked measurement kinds.
///
/// Weight is stored in grams; height (recumbent length) and head
/// circumference in centimeters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum MeasurementType {
    Weight,
    Height,
    HeadCircumference,
}

impl MeasurementType {
    pub const ALL: [MeasurementType; 3] = [
        MeasurementType::Weight,
        MeasurementType::Height,
        MeasurementType::HeadCircumference,
    ];

    /// Wire name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Weight => "weight",
            MeasurementType::Height => "height",
            MeasurementType::HeadCircumference => "headCircumference",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to `decimals` decimal places (half away from zero).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Raw measurement values keyed by type. A key present with `None` records an
/// explicit null (the value was cleared), distinct from the key being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measurements(BTreeMap<MeasurementType, Option<f64>>);

impl Measurements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, measurement_type: MeasurementType, value: Option<f64>) {
        self.0.insert(measurement_type, value);
    }

    /// Present, non-null value for a type.
    pub fn get(&self, measurement_type: MeasurementType) -> Option<f64> {
        self.0.get(&measurement_type).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementType, Option<f64>)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// True if at least one value is present and strictly positive.
    pub fn has_any_positive(&self) -> bool {
        self.0.values().any(|v| matches!(v, Some(x) if *x > 0.0))
    }

    /// Drop non-finite values, keeping explicit nulls.
    pub fn normalized(&self) -> Self {
        let mut out = BTreeMap::new();
        for (k, v) in &self.0 {
            match v {
                Some(x) if !x.is_finite() => {
                    tracing::warn!(measurement_type = %k, value = *x, "dropping non-finite measurement");
                }
                other => {
                    out.insert(*k, *other);
                }
            }
        }
        Self(out)
    }

    /// Compare against another set at 2 decimals, per measurement type.
    /// Used to detect a meaningful measurement change.
    pub fn rounded_eq(&self, other: &Self) -> bool {
        MeasurementType::ALL.iter().all(|ty| {
            match (self.get(*ty), other.get(*ty)) {
                (Some(a), Some(b)) => {
                    round_to(a, PERCENTILE_DECIMALS) == round_to(b, PERCENTILE_DECIMALS)
                }
                (None, None) => true,
                _ => false,
            }
        })
    }
}

impl FromIterator<(MeasurementType, f64)> for Measurements {
    fn from_iter<I: IntoIterator<Item = (MeasurementType, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, Some(v))).collect())
    }
}

/// Computed percentiles keyed by measurement type. Values are already rounded
/// to 2 decimals by the calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentileSet(BTreeMap<MeasurementType, f64>);

impl PercentileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, measurement_type: MeasurementType, percentile: f64) {
        self.0.insert(measurement_type, percentile);
    }

    pub fn get(&self, measurement_type: MeasurementType) -> Option<f64> {
        self.0.get(&measurement_type).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementType, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    /// Measurement types covered by this set.
    pub fn types(&self) -> impl Iterator<Item = MeasurementType> + '_ {
        self.0.keys().copied()
    }

    /// Equality within the fixed rounding tolerance (2 decimals): same key
    /// set, every value equal after rounding. This is the loop-prevention
    /// comparison for the asynchronous recompute path.
    pub fn rounded_eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.iter().all(|(ty, a)| match other.get(ty) {
            Some(b) => round_to(a, PERCENTILE_DECIMALS) == round_to(b, PERCENTILE_DECIMALS),
            None => false,
        })
    }
}

impl FromIterator<(MeasurementType, f64)> for PercentileSet {
    fn from_iter<I: IntoIterator<Item = (MeasurementType, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
