use serde::{Deserialize, Serialize};

use crate::records::Subject;

/// One entry from the change-event feed: before/after images of a subject
/// mutation. Delivery is at-least-once with no cross-subject ordering, so
/// every consumer must be idempotent per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Snapshot before the mutation; `None` on insert.
    pub before: Option<Subject>,
    /// Snapshot after the mutation; `None` on delete.
    pub after: Option<Subject>,
}

impl ChangeEvent {
    pub fn insert(after: Subject) -> Self {
        Self { before: None, after: Some(after) }
    }

    pub fn modify(before: Subject, after: Subject) -> Self {
        Self { before: Some(before), after: Some(after) }
    }

    /// True if sex or date of birth differ between the images. Either shift
    /// invalidates every cached percentile the subject owns.
    pub fn reference_inputs_changed(&self) -> bool {
        match (&self.before, &self.after) {
            (Some(b), Some(a)) => b.sex != a.sex || b.date_of_birth != a.date_of_birth,
            _ => false,
        }
    }
}
