use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    MAX_PREMATURE_GESTATIONAL_WEEK, MIN_GESTATIONAL_WEEK, TERM_GESTATIONAL_WEEK,
};
use crate::errors::ValidationError;
use crate::records::measurement::{MeasurementType, Measurements, PercentileSet};

/// Biological sex, selects the reference table family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("male"),
            Sex::Female => f.write_str("female"),
        }
    }
}

/// The mutable subject fields, as seen by the change classifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum SubjectField {
    Name,
    Sex,
    DateOfBirth,
    Premature,
    GestationalWeek,
    BirthWeight,
    BirthHeight,
    BirthHeadCircumference,
}

/// A tracked individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    /// Owning user, for access checks.
    pub owner_id: String,
    pub name: String,
    pub sex: Sex,
    pub date_of_birth: NaiveDate,
    #[serde(default)]
    pub premature: bool,
    #[serde(default)]
    pub gestational_week: Option<u8>,
    /// Birth weight in grams.
    #[serde(default)]
    pub birth_weight: Option<f64>,
    /// Birth length in centimeters.
    #[serde(default)]
    pub birth_height: Option<f64>,
    /// Birth head circumference in centimeters.
    #[serde(default)]
    pub birth_head_circumference: Option<f64>,
    /// Pointer to the canonical birth-sourced growth record.
    /// At most one exists per subject; set once, cleared when birth
    /// measurements are fully removed.
    #[serde(default)]
    pub birth_record_id: Option<Uuid>,
    /// Cached birth percentiles, written only by the calculator's output.
    #[serde(default)]
    pub birth_percentiles: Option<PercentileSet>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Subject {
    /// Extract the present birth fields as a measurement map.
    pub fn birth_measurements(&self) -> Measurements {
        let mut m = Measurements::new();
        if let Some(w) = self.birth_weight {
            m.set(MeasurementType::Weight, Some(w));
        }
        if let Some(h) = self.birth_height {
            m.set(MeasurementType::Height, Some(h));
        }
        if let Some(hc) = self.birth_head_circumference {
            m.set(MeasurementType::HeadCircumference, Some(hc));
        }
        m
    }

    /// True if any birth measurement carries a positive value.
    pub fn has_birth_measurements(&self) -> bool {
        self.birth_measurements().has_any_positive()
    }

    /// Normalize the premature/gestational-week pair.
    ///
    /// Full-term subjects get the 40-week default; a gestational week of 38+
    /// clears the premature flag; premature subjects require a week in
    /// 20..=37.
    pub fn normalize_gestational(&mut self) -> Result<(), ValidationError> {
        if !self.premature {
            self.gestational_week = Some(TERM_GESTATIONAL_WEEK);
            return Ok(());
        }
        match self.gestational_week {
            Some(week) if week > MAX_PREMATURE_GESTATIONAL_WEEK => {
                self.premature = false;
                self.gestational_week = Some(TERM_GESTATIONAL_WEEK);
                Ok(())
            }
            Some(week) if (MIN_GESTATIONAL_WEEK..=MAX_PREMATURE_GESTATIONAL_WEEK)
                .contains(&week) =>
            {
                Ok(())
            }
            other => Err(ValidationError::InvalidGestationalWeek(other)),
        }
    }

    /// Field-level diff between two snapshots of the same subject.
    pub fn diff_fields(before: &Subject, after: &Subject) -> BTreeSet<SubjectField> {
        let mut changed = BTreeSet::new();
        if before.name != after.name {
            changed.insert(SubjectField::Name);
        }
        if before.sex != after.sex {
            changed.insert(SubjectField::Sex);
        }
        if before.date_of_birth != after.date_of_birth {
            changed.insert(SubjectField::DateOfBirth);
        }
        if before.premature != after.premature {
            changed.insert(SubjectField::Premature);
        }
        if before.gestational_week != after.gestational_week {
            changed.insert(SubjectField::GestationalWeek);
        }
        if before.birth_weight != after.birth_weight {
            changed.insert(SubjectField::BirthWeight);
        }
        if before.birth_height != after.birth_height {
            changed.insert(SubjectField::BirthHeight);
        }
        if before.birth_head_circumference != after.birth_head_circumference {
            changed.insert(SubjectField::BirthHeadCircumference);
        }
        changed
    }
}
