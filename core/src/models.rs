use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Calories derived from macro grams. The only calorie formula in the crate.
#[must_use]
pub fn calories_from_macros(protein: f64, carbs: f64, fat: f64) -> f64 {
    protein * KCAL_PER_G_PROTEIN + carbs * KCAL_PER_G_CARBS + fat * KCAL_PER_G_FAT
}

pub(crate) fn now_stamp() -> String {
    Local::now().to_rfc3339()
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Workout,
    Rest,
}

impl DayType {
    pub const ALL: [DayType; 2] = [DayType::Workout, DayType::Rest];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Workout => "workout",
            DayType::Rest => "rest",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DayType::Workout => "Workout Day",
            DayType::Rest => "Rest Day",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "workout" => Ok(DayType::Workout),
            "rest" => Ok(DayType::Rest),
            _ => Err(ValidationError::single(
                "day_type",
                format!("invalid day type '{s}'. Must be one of: workout, rest"),
            )),
        }
    }
}

/// Catalog entry: a reusable food with per-serving macros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: String,
    pub name: String,
    pub portion: String,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub frequency: i64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Food {
    #[must_use]
    pub fn calories(&self) -> f64 {
        calories_from_macros(self.protein, self.carbs, self.fat)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFood {
    pub name: String,
    pub portion: String,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FoodPatch {
    pub name: Option<String>,
    pub portion: Option<String>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl FoodPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.portion.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fat.is_none()
    }
}

/// Point-in-time copy of a food logged to one day.
///
/// The nutrition fields are frozen at logging time; only `multiplier` changes
/// afterwards. `food_id` is kept for frequency bookkeeping, never for lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEntrySnapshot {
    pub id: String,
    pub day_id: String,
    pub food_id: String,
    pub food_name: String,
    pub food_portion: String,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub multiplier: f64,
    pub created_at: String,
}

impl FoodEntrySnapshot {
    #[must_use]
    pub fn capture(food: &Food, day_id: &str, multiplier: f64) -> Self {
        Self {
            id: new_id(),
            day_id: day_id.to_string(),
            food_id: food.id.clone(),
            food_name: food.name.clone(),
            food_portion: food.portion.clone(),
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
            multiplier,
            created_at: now_stamp(),
        }
    }

    /// Macros for this entry with the multiplier applied.
    #[must_use]
    pub fn scaled(&self) -> (f64, f64, f64) {
        (
            self.protein * self.multiplier,
            self.carbs * self.multiplier,
            self.fat * self.multiplier,
        )
    }
}

/// One calendar date's log. At most one per date per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub id: String,
    pub date: NaiveDate,
    pub day_type: DayType,
    pub created_at: String,
    #[serde(default)]
    pub entries: Vec<FoodEntrySnapshot>,
}

impl DayRecord {
    #[must_use]
    pub fn new(date: NaiveDate, day_type: DayType) -> Self {
        Self {
            id: new_id(),
            date,
            day_type,
            created_at: now_stamp(),
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Targets {
    #[must_use]
    pub fn calories(&self) -> f64 {
        calories_from_macros(self.protein, self.carbs, self.fat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub workout: Targets,
    pub rest: Targets,
    /// Day type toggled for `pending_date` before that date had a record.
    pub pending_day_type: DayType,
    pub pending_date: Option<NaiveDate>,
}

impl Settings {
    /// Day type a new record for `date` starts with. Dates other than the
    /// toggled one start as a workout day.
    #[must_use]
    pub fn pending_for(&self, date: NaiveDate) -> DayType {
        if self.pending_date == Some(date) {
            self.pending_day_type
        } else {
            DayType::Workout
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workout: Targets {
                protein: 180.0,
                carbs: 250.0,
                fat: 80.0,
            },
            rest: Targets {
                protein: 180.0,
                carbs: 150.0,
                fat: 100.0,
            },
            pending_day_type: DayType::Workout,
            pending_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub calories: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroStatus {
    Under,
    Near,
    Over,
}

/// Progress of one macro against its target. `percent` is `None` when there is no usable target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroProgress {
    pub current: f64,
    pub target: f64,
    pub percent: Option<i64>,
    pub status: Option<MacroStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroComparison {
    pub protein: MacroProgress,
    pub carbs: MacroProgress,
    pub fat: MacroProgress,
    pub calories: MacroProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub day_type: DayType,
    pub has_record: bool,
    pub entries: Vec<FoodEntrySnapshot>,
    pub totals: MacroTotals,
    pub targets: Targets,
    pub comparison: MacroComparison,
}
