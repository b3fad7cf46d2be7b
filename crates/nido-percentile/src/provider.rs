//! ReferenceTableProvider — owns immutable, lazily-populated day indexes
//! keyed by (measurement type, sex), built from an injected source.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use nido_core::errors::{NidoResult, PercentileError};
use nido_core::models::LmsRow;
use nido_core::records::{MeasurementType, Sex};
use nido_core::traits::IReferenceSource;

/// Rows of one table family indexed by age in days.
#[derive(Debug)]
pub(crate) struct DayIndex {
    rows: BTreeMap<i64, LmsRow>,
}

impl DayIndex {
    fn from_rows(rows: Vec<LmsRow>) -> Self {
        Self {
            rows: rows.into_iter().map(|r| (r.day, r)).collect(),
        }
    }

    /// Exact day match, else the nearest day by absolute distance.
    /// On equal distance the lower day wins.
    pub(crate) fn lookup(&self, age_in_days: i64) -> Option<LmsRow> {
        if let Some(row) = self.rows.get(&age_in_days) {
            return Some(*row);
        }
        let below = self.rows.range(..=age_in_days).next_back();
        let above = self.rows.range(age_in_days..).next();
        match (below, above) {
            (Some((b_day, b_row)), Some((a_day, a_row))) => {
                if (age_in_days - b_day) <= (a_day - age_in_days) {
                    Some(*b_row)
                } else {
                    Some(*a_row)
                }
            }
            (Some((_, row)), None) | (None, Some((_, row))) => Some(*row),
            (None, None) => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Caching provider over an `IReferenceSource`.
///
/// Each (type, sex) index is built on first lookup and read thereafter;
/// the source is never re-queried for a populated table.
pub struct ReferenceTableProvider {
    source: Box<dyn IReferenceSource>,
    tables: DashMap<(MeasurementType, Sex), Arc<DayIndex>>,
}

impl ReferenceTableProvider {
    pub fn new(source: Box<dyn IReferenceSource>) -> Self {
        Self {
            source,
            tables: DashMap::new(),
        }
    }

    /// LMS row for the exact or nearest day in the (type, sex) table.
    pub fn lms_for(
        &self,
        measurement_type: MeasurementType,
        sex: Sex,
        age_in_days: i64,
    ) -> NidoResult<LmsRow> {
        let index = self.index(measurement_type, sex)?;
        index.lookup(age_in_days).ok_or_else(|| {
            PercentileError::TableUnavailable {
                measurement_type,
                sex,
            }
            .into()
        })
    }

    fn index(
        &self,
        measurement_type: MeasurementType,
        sex: Sex,
    ) -> NidoResult<Arc<DayIndex>> {
        let key = (measurement_type, sex);
        if let Some(index) = self.tables.get(&key) {
            return Ok(Arc::clone(&index));
        }

        let rows = self.source.rows(measurement_type, sex)?;
        let index = DayIndex::from_rows(rows);
        if index.is_empty() {
            return Err(PercentileError::TableUnavailable {
                measurement_type,
                sex,
            }
            .into());
        }
        tracing::info!(
            measurement_type = %measurement_type,
            sex = %sex,
            rows = index.rows.len(),
            "loaded reference table"
        );
        let index = Arc::new(index);
        // A concurrent builder may have won the race; either copy is
        // identical since the source is immutable.
        self.tables.insert(key, Arc::clone(&index));
        Ok(index)
    }
}
