//! Day-type toggle state and target selection.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{FieldErrors, ValidationError};
use crate::models::{DayRecord, DayType, Settings, Targets};

#[must_use]
pub fn select_targets(settings: &Settings, day_type: DayType) -> Targets {
    match day_type {
        DayType::Workout => settings.workout,
        DayType::Rest => settings.rest,
    }
}

pub fn validate_targets(targets: &Targets) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::default();
    for (field, value) in [
        ("protein", targets.protein),
        ("carbs", targets.carbs),
        ("fat", targets.fat),
    ] {
        if !value.is_finite() {
            errors.push(field, "must be a finite number");
        } else if value < 0.0 {
            errors.push(field, "must not be negative");
        }
    }
    errors.finish()
}

/// What a toggle changed, so the caller knows what to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayTransition {
    /// A record exists for the date and its day type changed.
    UpdatedRecord { day_id: String, day_type: DayType },
    /// No record yet; only the pending toggle changed.
    UpdatedPending { day_type: DayType },
}

/// A date's record (if any) together with the toggle state used to create it.
#[derive(Debug, Clone)]
pub struct DayState {
    record: Option<DayRecord>,
    pending: DayType,
}

impl DayState {
    #[must_use]
    pub fn new(record: Option<DayRecord>, pending: DayType) -> Self {
        Self { record, pending }
    }

    #[must_use]
    pub fn record(&self) -> Option<&DayRecord> {
        self.record.as_ref()
    }

    #[must_use]
    pub fn into_record(self) -> Option<DayRecord> {
        self.record
    }

    #[must_use]
    pub fn pending(&self) -> DayType {
        self.pending
    }

    /// Day type that applies to the date: the record's if present, otherwise pending.
    #[must_use]
    pub fn effective_day_type(&self) -> DayType {
        self.record.as_ref().map_or(self.pending, |r| r.day_type)
    }

    /// Changes the record's day type, or the pending type when the date has
    /// no record yet.
    pub fn toggle(&mut self, day_type: DayType) -> DayTransition {
        match &mut self.record {
            Some(record) => {
                record.day_type = day_type;
                DayTransition::UpdatedRecord {
                    day_id: record.id.clone(),
                    day_type,
                }
            }
            None => {
                self.pending = day_type;
                DayTransition::UpdatedPending { day_type }
            }
        }
    }

    /// Record to log into, creating one with the pending day type if the date
    /// has none. The flag is true when a record was created.
    pub fn record_for_logging(&mut self, date: NaiveDate) -> (&DayRecord, bool) {
        let created = self.record.is_none();
        let pending = self.pending;
        let record = self
            .record
            .get_or_insert_with(|| DayRecord::new(date, pending));
        (record, created)
    }
}
