use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{self, MultiplierOutcome};
use crate::catalog;
use crate::day::{DayState, DayTransition, select_targets, validate_targets};
use crate::db::Database;
use crate::error::CoreError;
use crate::models::{
    DayRecord, DaySummary, DayType, Food, FoodEntrySnapshot, FoodPatch, NewFood, Settings,
    Targets,
};
use crate::store::{Session, Store};

/// Default number of days shown by [`MacroService::history`].
pub const HISTORY_DAYS: usize = 30;

/// Result of logging a food.
#[derive(Debug, Clone, Serialize)]
pub struct LogOutcome {
    pub entry: FoodEntrySnapshot,
    /// True when this log created the day's record.
    pub day_created: bool,
    /// Catalog re-ranked after the usage bump.
    pub catalog: Vec<Food>,
}

/// The viewer's local calendar date.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Controller over a [`Store`]. Every call is scoped to the session's user.
pub struct MacroService<S: Store> {
    store: S,
    session: Box<dyn Session>,
}

impl MacroService<Database> {
    pub fn open(db_path: &Path, session: impl Session + 'static) -> Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::new(db, session))
    }

    pub fn new_in_memory(session: impl Session + 'static) -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::new(db, session))
    }
}

impl<S: Store> MacroService<S> {
    pub fn new(store: S, session: impl Session + 'static) -> Self {
        Self {
            store,
            session: Box::new(session),
        }
    }

    fn user(&self) -> Result<String> {
        self.session.current_user().context("Not signed in")
    }

    fn load_settings(&self, user: &str) -> Result<Settings> {
        Ok(self.store.get_settings(user)?.unwrap_or_default())
    }

    // --- Settings ---

    pub fn settings(&self) -> Result<Settings> {
        let user = self.user()?;
        self.load_settings(&user)
    }

    pub fn update_targets(&self, day_type: DayType, targets: Targets) -> Result<Settings> {
        let user = self.user()?;
        validate_targets(&targets).map_err(CoreError::from)?;
        let mut settings = self.load_settings(&user)?;
        match day_type {
            DayType::Workout => settings.workout = targets,
            DayType::Rest => settings.rest = targets,
        }
        self.store.upsert_settings(&user, &settings)?;
        info!(%day_type, "targets updated");
        Ok(settings)
    }

    // --- Catalog ---

    pub fn list_foods(&self) -> Result<Vec<Food>> {
        let user = self.user()?;
        Ok(catalog::ranked_view(&self.store.list_foods(&user)?))
    }

    pub fn search_foods(&self, query: &str) -> Result<Vec<Food>> {
        let user = self.user()?;
        Ok(catalog::search(&self.store.list_foods(&user)?, query))
    }

    pub fn get_food(&self, food_id: &str) -> Result<Option<Food>> {
        let user = self.user()?;
        self.store.get_food(&user, food_id)
    }

    pub fn add_food(&self, draft: NewFood) -> Result<Food> {
        let user = self.user()?;
        let food = catalog::create_food(draft).map_err(CoreError::from)?;
        self.store.create_food(&user, &food)?;
        info!(food_id = %food.id, name = %food.name, "food added");
        Ok(food)
    }

    /// Edits a catalog food. Entries already logged keep their snapshot values.
    pub fn edit_food(&self, food_id: &str, patch: FoodPatch) -> Result<Food> {
        let user = self.user()?;
        let food = self
            .store
            .get_food(&user, food_id)?
            .ok_or_else(|| CoreError::FoodNotFound(food_id.to_string()))?;
        let edited = catalog::edit_food(&food, patch).map_err(CoreError::from)?;
        if !self.store.update_food(&user, &edited)? {
            return Err(CoreError::FoodNotFound(food_id.to_string()).into());
        }
        info!(food_id, "food edited");
        Ok(edited)
    }

    /// Deletes a food and returns the remaining ranked catalog.
    pub fn delete_food(&self, food_id: &str) -> Result<Vec<Food>> {
        let user = self.user()?;
        let foods = self.store.list_foods(&user)?;
        if !foods.iter().any(|f| f.id == food_id) {
            return Err(CoreError::FoodNotFound(food_id.to_string()).into());
        }
        self.store.delete_food(&user, food_id)?;
        info!(food_id, "food deleted");
        Ok(catalog::ranked_view(&catalog::delete_food(&foods, food_id)))
    }

    // --- Logging ---

    /// Logs `multiplier` portions of a catalog food to `date`.
    ///
    /// Creates the day record with the pending day type if the date has none.
    /// The record, the entry and the frequency bump are written together.
    pub fn log_food(&self, date: NaiveDate, food_id: &str, multiplier: f64) -> Result<LogOutcome> {
        let user = self.user()?;
        aggregate::validate_multiplier(multiplier).map_err(CoreError::from)?;

        let foods = self.store.list_foods(&user)?;
        let not_found = || CoreError::FoodNotFound(food_id.to_string());
        let food = foods.iter().find(|f| f.id == food_id).ok_or_else(not_found)?;
        let ranked = catalog::record_usage(&foods, food_id).ok_or_else(not_found)?;

        let settings = self.load_settings(&user)?;
        let mut state = DayState::new(self.store.get_day(&user, date)?, settings.pending_for(date));
        let (record, day_created) = state.record_for_logging(date);

        let entry = FoodEntrySnapshot::capture(food, &record.id, multiplier);
        let new_day = day_created.then_some(record);
        if !self.store.log_entry(&user, new_day, &entry)? {
            warn!(food_id, "food removed before its frequency could be bumped");
        }
        if day_created {
            info!(%date, day_type = %record.day_type, "day record created");
        }
        info!(%date, food = %food.name, multiplier, "food logged");

        Ok(LogOutcome {
            entry,
            day_created,
            catalog: catalog::ranked_view(&ranked),
        })
    }

    // --- Days ---

    fn summarize(date: NaiveDate, state: &DayState, settings: &Settings) -> DaySummary {
        let day_type = state.effective_day_type();
        let targets = select_targets(settings, day_type);
        let entries = state
            .record()
            .map(|r| r.entries.clone())
            .unwrap_or_default();
        let totals = aggregate::aggregate(&entries);
        DaySummary {
            date: date.format("%Y-%m-%d").to_string(),
            day_type,
            has_record: state.record().is_some(),
            comparison: aggregate::compare(&totals, &targets),
            entries,
            totals,
            targets,
        }
    }

    /// Totals and target comparison for `date`. A date with no record shows
    /// empty totals against the pending day type's targets.
    pub fn day_summary(&self, date: NaiveDate) -> Result<DaySummary> {
        let user = self.user()?;
        let settings = self.load_settings(&user)?;
        let state = DayState::new(self.store.get_day(&user, date)?, settings.pending_for(date));
        debug!(%date, has_record = state.record().is_some(), "building day summary");
        Ok(Self::summarize(date, &state, &settings))
    }

    /// Summaries of the most recent `limit` logged days, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<DaySummary>> {
        let user = self.user()?;
        let settings = self.load_settings(&user)?;
        let days: Vec<DayRecord> = self.store.list_days(&user, limit)?;
        Ok(days
            .into_iter()
            .map(|record| {
                let date = record.date;
                let state = DayState::new(Some(record), settings.pending_for(date));
                Self::summarize(date, &state, &settings)
            })
            .collect())
    }

    /// Sets `date`'s day type. A date without a record keeps the choice as
    /// its pending type, replacing any pending toggle for another date.
    pub fn toggle_day_type(&self, date: NaiveDate, day_type: DayType) -> Result<DayTransition> {
        let user = self.user()?;
        let mut settings = self.load_settings(&user)?;
        let mut state = DayState::new(self.store.get_day(&user, date)?, settings.pending_for(date));
        let transition = state.toggle(day_type);
        match &transition {
            DayTransition::UpdatedRecord { day_id, .. } => {
                self.store.update_day_type(&user, day_id, day_type)?;
            }
            DayTransition::UpdatedPending { .. } => {
                settings.pending_day_type = state.pending();
                settings.pending_date = Some(date);
                self.store.upsert_settings(&user, &settings)?;
            }
        }
        info!(%date, %day_type, "day type set");
        Ok(transition)
    }

    // --- Entries ---

    /// All entries of the day owning `entry_id`, or empty when it does not exist.
    fn sibling_entries(&self, user: &str, entry_id: &str) -> Result<Vec<FoodEntrySnapshot>> {
        match self.store.get_entry(user, entry_id)? {
            Some(entry) => self.store.list_entries(user, &entry.day_id),
            None => Ok(Vec::new()),
        }
    }

    /// Changes an entry's multiplier. Zero, negative and non-finite values
    /// are rejected.
    pub fn set_multiplier(&self, entry_id: &str, multiplier: f64) -> Result<FoodEntrySnapshot> {
        let user = self.user()?;
        let mut entries = self.sibling_entries(&user, entry_id)?;
        let updated = aggregate::set_multiplier(&mut entries, entry_id, multiplier)?;
        self.store
            .update_entry_multiplier(&user, entry_id, updated.multiplier)?;
        debug!(entry_id, multiplier, "multiplier updated");
        Ok(updated)
    }

    /// Changes an entry's multiplier, removing the entry for zero or negative values.
    pub fn set_multiplier_or_remove(
        &self,
        entry_id: &str,
        multiplier: f64,
    ) -> Result<MultiplierOutcome> {
        let user = self.user()?;
        let mut entries = self.sibling_entries(&user, entry_id)?;
        let outcome = aggregate::set_multiplier_or_remove(&mut entries, entry_id, multiplier)?;
        match &outcome {
            MultiplierOutcome::Updated(entry) => {
                self.store
                    .update_entry_multiplier(&user, &entry.id, entry.multiplier)?;
                debug!(entry_id, multiplier, "multiplier updated");
            }
            MultiplierOutcome::Removed(entry) => {
                self.store.delete_entry(&user, &entry.id)?;
                info!(entry_id, "entry removed by non-positive multiplier");
            }
        }
        Ok(outcome)
    }

    pub fn remove_entry(&self, entry_id: &str) -> Result<FoodEntrySnapshot> {
        let user = self.user()?;
        let entry = self
            .store
            .get_entry(&user, entry_id)?
            .ok_or_else(|| CoreError::EntryNotFound(entry_id.to_string()))?;
        self.store.delete_entry(&user, entry_id)?;
        info!(entry_id, "entry removed");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::models::MacroStatus;
    use crate::store::FixedSession;

    fn service() -> MacroService<Database> {
        MacroService::new_in_memory(FixedSession::user("alice")).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn add(svc: &MacroService<Database>, name: &str, p: f64, c: f64, f: f64) -> Food {
        svc.add_food(NewFood {
            name: name.to_string(),
            portion: "1 serving".to_string(),
            protein: p,
            carbs: c,
            fat: f,
        })
        .unwrap()
    }

    fn core_error(err: &anyhow::Error) -> &CoreError {
        err.downcast_ref::<CoreError>().unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_end_to_end_workout_day() {
        let svc = service();
        let beef = add(&svc, "8oz Ground Beef (93/7)", 48.0, 0.0, 16.0);
        let rice = add(&svc, "1 cup Jasmine Rice", 8.0, 52.0, 1.0);

        svc.log_food(date(15), &beef.id, 2.0).unwrap();
        svc.log_food(date(15), &rice.id, 1.0).unwrap();

        let summary = svc.day_summary(date(15)).unwrap();
        assert_eq!(summary.day_type, DayType::Workout);
        assert!(summary.has_record);
        assert_eq!(summary.entries.len(), 2);
        assert!(approx(summary.totals.protein, 104.0));
        assert!(approx(summary.totals.carbs, 52.0));
        assert!(approx(summary.totals.fat, 33.0));
        assert!(approx(summary.totals.calories, 921.0));
        assert_eq!(summary.comparison.protein.percent, Some(58));
        assert_eq!(summary.comparison.protein.status, Some(MacroStatus::Under));
    }

    #[test]
    fn test_log_food_increments_frequency_once() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        let rice = add(&svc, "Rice", 8.0, 52.0, 1.0);

        let outcome = svc.log_food(date(15), &rice.id, 1.0).unwrap();
        assert_eq!(outcome.catalog[0].id, rice.id);
        assert_eq!(outcome.catalog[0].frequency, 1);
        assert_eq!(svc.get_food(&rice.id).unwrap().unwrap().frequency, 1);
        assert_eq!(svc.get_food(&beef.id).unwrap().unwrap().frequency, 0);

        svc.log_food(date(16), &rice.id, 1.0).unwrap();
        let foods = svc.list_foods().unwrap();
        assert_eq!(foods[0].id, rice.id);
        assert_eq!(foods[0].frequency, 2);
    }

    #[test]
    fn test_first_log_creates_record_with_pending_type() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);

        let t = svc.toggle_day_type(date(15), DayType::Rest).unwrap();
        assert_eq!(
            t,
            DayTransition::UpdatedPending {
                day_type: DayType::Rest
            }
        );
        assert!(!svc.day_summary(date(15)).unwrap().has_record);

        let first = svc.log_food(date(15), &beef.id, 1.0).unwrap();
        assert!(first.day_created);
        let second = svc.log_food(date(15), &beef.id, 1.0).unwrap();
        assert!(!second.day_created);
        assert_eq!(first.entry.day_id, second.entry.day_id);

        let summary = svc.day_summary(date(15)).unwrap();
        assert_eq!(summary.day_type, DayType::Rest);
        assert_eq!(summary.targets, Settings::default().rest);
    }

    #[test]
    fn test_toggle_existing_record() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        let outcome = svc.log_food(date(15), &beef.id, 1.0).unwrap();

        let t = svc.toggle_day_type(date(15), DayType::Rest).unwrap();
        assert_eq!(
            t,
            DayTransition::UpdatedRecord {
                day_id: outcome.entry.day_id,
                day_type: DayType::Rest
            }
        );
        let summary = svc.day_summary(date(15)).unwrap();
        assert_eq!(summary.day_type, DayType::Rest);
        let settings = svc.settings().unwrap();
        assert_eq!(settings.pending_day_type, DayType::Workout);
        assert!(settings.pending_date.is_none());
    }

    #[test]
    fn test_editing_past_day_type_does_not_change_new_days() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        svc.log_food(date(10), &beef.id, 1.0).unwrap();
        svc.toggle_day_type(date(10), DayType::Rest).unwrap();

        let outcome = svc.log_food(date(15), &beef.id, 1.0).unwrap();
        assert!(outcome.day_created);
        assert_eq!(svc.day_summary(date(15)).unwrap().day_type, DayType::Workout);
        assert_eq!(svc.day_summary(date(10)).unwrap().day_type, DayType::Rest);
    }

    #[test]
    fn test_pending_toggle_applies_only_to_its_date() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        svc.toggle_day_type(date(20), DayType::Rest).unwrap();

        assert_eq!(svc.day_summary(date(20)).unwrap().day_type, DayType::Rest);
        assert_eq!(svc.day_summary(date(15)).unwrap().day_type, DayType::Workout);

        svc.log_food(date(15), &beef.id, 1.0).unwrap();
        assert_eq!(svc.day_summary(date(15)).unwrap().day_type, DayType::Workout);

        svc.log_food(date(20), &beef.id, 1.0).unwrap();
        assert_eq!(svc.day_summary(date(20)).unwrap().day_type, DayType::Rest);
    }

    #[test]
    fn test_empty_day_summary_uses_pending_targets() {
        let svc = service();
        let summary = svc.day_summary(date(1)).unwrap();
        assert!(!summary.has_record);
        assert!(summary.entries.is_empty());
        assert!(approx(summary.totals.calories, 0.0));
        assert_eq!(summary.day_type, DayType::Workout);
        assert_eq!(summary.targets, Settings::default().workout);
        assert_eq!(summary.comparison.protein.percent, Some(0));
        assert_eq!(summary.date, "2024-06-01");
    }

    #[test]
    fn test_edit_food_keeps_history() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        svc.log_food(date(15), &beef.id, 2.0).unwrap();
        let before = svc.day_summary(date(15)).unwrap().totals;

        let patch = FoodPatch {
            protein: Some(10.0),
            ..FoodPatch::default()
        };
        let edited = svc.edit_food(&beef.id, patch).unwrap();
        assert!(approx(edited.protein, 10.0));
        assert_eq!(edited.frequency, 1);

        assert_eq!(svc.day_summary(date(15)).unwrap().totals, before);
    }

    #[test]
    fn test_delete_food_keeps_history() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        let rice = add(&svc, "Rice", 8.0, 52.0, 1.0);
        svc.log_food(date(15), &beef.id, 1.0).unwrap();

        let remaining = svc.delete_food(&beef.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, rice.id);

        let summary = svc.day_summary(date(15)).unwrap();
        assert_eq!(summary.entries[0].food_name, "Beef");
        assert!(approx(summary.totals.protein, 48.0));

        let err = svc.log_food(date(15), &beef.id, 1.0).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::FoodNotFound(_)));
    }

    #[test]
    fn test_missing_food_errors() {
        let svc = service();
        let err = svc.delete_food("nope").unwrap_err();
        assert!(matches!(core_error(&err), CoreError::FoodNotFound(_)));
        let err = svc.edit_food("nope", FoodPatch::default()).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::FoodNotFound(_)));
        let err = svc.log_food(date(1), "nope", 1.0).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::FoodNotFound(_)));
        assert!(!svc.day_summary(date(1)).unwrap().has_record);
    }

    #[test]
    fn test_add_food_validation() {
        let svc = service();
        let err = svc
            .add_food(NewFood {
                name: String::new(),
                portion: "1".to_string(),
                protein: 0.0,
                carbs: 0.0,
                fat: 0.0,
            })
            .unwrap_err();
        match core_error(&err) {
            CoreError::Validation(v) => {
                assert!(v.has_field("name"));
                assert!(v.has_field("macros"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(svc.list_foods().unwrap().is_empty());
    }

    #[test]
    fn test_log_food_rejects_bad_multiplier() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = svc.log_food(date(15), &beef.id, bad).unwrap_err();
            assert!(matches!(core_error(&err), CoreError::Validation(_)));
        }
        assert!(!svc.day_summary(date(15)).unwrap().has_record);
        assert_eq!(svc.get_food(&beef.id).unwrap().unwrap().frequency, 0);
    }

    #[test]
    fn test_set_multiplier() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        let entry = svc.log_food(date(15), &beef.id, 1.0).unwrap().entry;

        let updated = svc.set_multiplier(&entry.id, 1.5).unwrap();
        assert!(approx(updated.multiplier, 1.5));
        assert!(approx(svc.day_summary(date(15)).unwrap().totals.protein, 72.0));

        let err = svc.set_multiplier(&entry.id, 0.0).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::Validation(_)));
        assert!(approx(svc.day_summary(date(15)).unwrap().totals.protein, 72.0));

        let err = svc.set_multiplier("missing", 2.0).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::EntryNotFound(_)));
    }

    #[test]
    fn test_set_multiplier_or_remove() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        let rice = add(&svc, "Rice", 8.0, 52.0, 1.0);
        let beef_entry = svc.log_food(date(15), &beef.id, 1.0).unwrap().entry;
        svc.log_food(date(15), &rice.id, 1.0).unwrap();

        match svc.set_multiplier_or_remove(&beef_entry.id, 3.0).unwrap() {
            MultiplierOutcome::Updated(e) => assert!(approx(e.multiplier, 3.0)),
            MultiplierOutcome::Removed(_) => panic!("expected update"),
        }
        match svc.set_multiplier_or_remove(&beef_entry.id, 0.0).unwrap() {
            MultiplierOutcome::Removed(e) => assert_eq!(e.id, beef_entry.id),
            MultiplierOutcome::Updated(_) => panic!("expected removal"),
        }
        let summary = svc.day_summary(date(15)).unwrap();
        assert_eq!(summary.entries.len(), 1);
        assert_eq!(summary.entries[0].food_name, "Rice");

        let err = svc.set_multiplier_or_remove("missing", -1.0).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::EntryNotFound(_)));
        let err = svc.set_multiplier_or_remove("missing", f64::NAN).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::Validation(_)));
    }

    #[test]
    fn test_remove_entry() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        let entry = svc.log_food(date(15), &beef.id, 1.0).unwrap().entry;
        let removed = svc.remove_entry(&entry.id).unwrap();
        assert_eq!(removed.id, entry.id);
        let summary = svc.day_summary(date(15)).unwrap();
        assert!(summary.has_record);
        assert!(summary.entries.is_empty());

        let err = svc.remove_entry(&entry.id).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::EntryNotFound(_)));
    }

    #[test]
    fn test_history_uses_each_days_type() {
        let svc = service();
        let beef = add(&svc, "Beef", 48.0, 0.0, 16.0);
        svc.log_food(date(10), &beef.id, 1.0).unwrap();
        svc.toggle_day_type(date(12), DayType::Rest).unwrap();
        svc.log_food(date(12), &beef.id, 2.0).unwrap();

        let history = svc.history(HISTORY_DAYS).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, "2024-06-12");
        assert_eq!(history[0].day_type, DayType::Rest);
        assert!(approx(history[0].totals.protein, 96.0));
        assert_eq!(history[1].date, "2024-06-10");
        assert_eq!(history[1].day_type, DayType::Workout);
        assert_eq!(history[1].targets, Settings::default().workout);

        assert_eq!(svc.history(1).unwrap().len(), 1);
    }

    #[test]
    fn test_update_targets() {
        let svc = service();
        let targets = Targets {
            protein: 200.0,
            carbs: 100.0,
            fat: 70.0,
        };
        let settings = svc.update_targets(DayType::Rest, targets).unwrap();
        assert_eq!(settings.rest, targets);
        assert_eq!(settings.workout, Settings::default().workout);
        assert_eq!(svc.settings().unwrap().rest, targets);

        let bad = Targets {
            protein: -5.0,
            ..targets
        };
        let err = svc.update_targets(DayType::Workout, bad).unwrap_err();
        match core_error(&err) {
            CoreError::Validation(v) => assert!(v.has_field("protein")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_search_foods() {
        let svc = service();
        add(&svc, "Jasmine Rice", 8.0, 52.0, 1.0);
        add(&svc, "Ground Beef", 48.0, 0.0, 16.0);
        let hits = svc.search_foods("RICE").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Jasmine Rice");
    }

    #[test]
    fn test_signed_out_is_rejected() {
        let svc = MacroService::new_in_memory(FixedSession::signed_out()).unwrap();
        let err = svc.list_foods().unwrap_err();
        assert_eq!(err.to_string(), "Not signed in");
        assert!(svc.day_summary(date(1)).is_err());
        assert!(svc.settings().is_err());
        assert!(err.downcast_ref::<ValidationError>().is_none());
    }

    #[test]
    fn test_users_are_isolated() {
        let db = Database::open_in_memory().unwrap();
        let alice = MacroService::new(db, FixedSession::user("alice"));
        let beef = add(&alice, "Beef", 48.0, 0.0, 16.0);
        alice.log_food(date(15), &beef.id, 1.0).unwrap();

        let MacroService { store, .. } = alice;
        let bob = MacroService::new(store, FixedSession::user("bob"));
        assert!(bob.list_foods().unwrap().is_empty());
        assert!(!bob.day_summary(date(15)).unwrap().has_record);
        let err = bob.log_food(date(15), &beef.id, 1.0).unwrap_err();
        assert!(matches!(core_error(&err), CoreError::FoodNotFound(_)));
    }

    #[test]
    fn test_today_is_local_date() {
        assert_eq!(today(), Local::now().date_naive());
    }
}
