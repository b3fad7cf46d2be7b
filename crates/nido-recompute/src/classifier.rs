//! ChangeClassifier — maps a changed-field set to a recompute scope.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use nido_core::records::SubjectField;

/// How much recompute a subject update requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecomputeScope {
    /// No percentile-impacting field changed.
    None,
    /// Only birth measurements changed; only the birth record is affected.
    BirthOnly,
    /// Sex or date of birth changed; every cached percentile is now wrong.
    Full,
}

/// Fields that shift the reference-table lookup for every record.
const STRUCTURAL_FIELDS: [SubjectField; 2] = [SubjectField::Sex, SubjectField::DateOfBirth];

/// Fields that only feed the birth-sourced record.
const BIRTH_MEASUREMENT_FIELDS: [SubjectField; 3] = [
    SubjectField::BirthWeight,
    SubjectField::BirthHeight,
    SubjectField::BirthHeadCircumference,
];

/// Pure, total classification. Structural fields win over birth-measurement
/// fields when both changed.
pub fn classify(changed: &BTreeSet<SubjectField>) -> RecomputeScope {
    if STRUCTURAL_FIELDS.iter().any(|f| changed.contains(f)) {
        RecomputeScope::Full
    } else if BIRTH_MEASUREMENT_FIELDS.iter().any(|f| changed.contains(f)) {
        RecomputeScope::BirthOnly
    } else {
        RecomputeScope::None
    }
}
