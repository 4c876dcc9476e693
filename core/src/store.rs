use anyhow::Result;
use chrono::NaiveDate;

use crate::models::{DayRecord, DayType, Food, FoodEntrySnapshot, Settings};

/// Persistence collaborator. Every call is scoped to `user`.
///
/// Implemented by [`crate::db::Database`] for SQLite. Rows are handed over
/// fully formed (ids and timestamps already assigned); the store never
/// computes totals.
pub trait Store: Send {
    // --- Foods ---
    fn list_foods(&self, user: &str) -> Result<Vec<Food>>;
    fn get_food(&self, user: &str, food_id: &str) -> Result<Option<Food>>;
    fn create_food(&self, user: &str, food: &Food) -> Result<()>;
    /// Writes name, portion and macros. Frequency is left to
    /// [`Store::increment_food_frequency`].
    fn update_food(&self, user: &str, food: &Food) -> Result<bool>;
    fn delete_food(&self, user: &str, food_id: &str) -> Result<bool>;
    /// Atomic `frequency += 1`. Returns false when the food does not exist.
    fn increment_food_frequency(&self, user: &str, food_id: &str) -> Result<bool>;
    /// Writes `new_day` (when given), then `entry`, then bumps the entry's
    /// food frequency, all or nothing. Returns false when the food no longer
    /// exists; the entry is still written.
    fn log_entry(
        &self,
        user: &str,
        new_day: Option<&DayRecord>,
        entry: &FoodEntrySnapshot,
    ) -> Result<bool>;

    // --- Day records ---
    fn get_day(&self, user: &str, date: NaiveDate) -> Result<Option<DayRecord>>;
    /// Most recent dates first.
    fn list_days(&self, user: &str, limit: usize) -> Result<Vec<DayRecord>>;
    fn create_day(&self, user: &str, day: &DayRecord) -> Result<()>;
    fn update_day_type(&self, user: &str, day_id: &str, day_type: DayType) -> Result<bool>;

    // --- Food entry snapshots ---
    /// Ordered by creation.
    fn list_entries(&self, user: &str, day_id: &str) -> Result<Vec<FoodEntrySnapshot>>;
    fn get_entry(&self, user: &str, entry_id: &str) -> Result<Option<FoodEntrySnapshot>>;
    fn create_entry(&self, user: &str, entry: &FoodEntrySnapshot) -> Result<()>;
    fn update_entry_multiplier(&self, user: &str, entry_id: &str, multiplier: f64)
    -> Result<bool>;
    fn delete_entry(&self, user: &str, entry_id: &str) -> Result<bool>;

    // --- Settings ---
    fn get_settings(&self, user: &str) -> Result<Option<Settings>>;
    fn upsert_settings(&self, user: &str, settings: &Settings) -> Result<()>;
}

/// Identity collaborator: who is using the app right now, if anyone.
pub trait Session: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// Session fixed at construction. The CLI and REST server use the configured
/// local user; tests use it to simulate signed-out access.
#[derive(Debug, Clone)]
pub struct FixedSession {
    user: Option<String>,
}

impl FixedSession {
    #[must_use]
    pub fn user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
        }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl Session for FixedSession {
    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }
}
