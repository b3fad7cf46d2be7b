use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use nido_core::records::{
    GrowthRecord, MeasurementSource, Measurements, Sex, Subject,
};

/// A plain active subject owned by `user-1` with no birth measurements.
pub fn subject(name: &str, sex: Sex, date_of_birth: NaiveDate) -> Subject {
    let now = Utc::now();
    Subject {
        id: Uuid::new_v4(),
        owner_id: "user-1".to_string(),
        name: name.to_string(),
        sex,
        date_of_birth,
        premature: false,
        gestational_week: Some(40),
        birth_weight: None,
        birth_height: None,
        birth_head_circumference: None,
        birth_record_id: None,
        birth_percentiles: None,
        is_active: true,
        created_at: now,
        modified_at: now,
    }
}

/// A manual growth record for the subject, percentile cache empty.
pub fn growth_record(
    subject: &Subject,
    measurement_date: NaiveDate,
    measurements: Measurements,
) -> GrowthRecord {
    let now = Utc::now();
    GrowthRecord {
        id: Uuid::new_v4(),
        subject_id: subject.id,
        owner_id: subject.owner_id.clone(),
        measurement_date,
        measurements,
        percentiles: None,
        source: MeasurementSource::Manual,
        synthetic: false,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}
