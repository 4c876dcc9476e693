//! Macro accumulation and target comparison.
//!
//! Everything here is a pure function over the snapshots it is handed. Totals
//! are always recomputed from the entries; nothing caches them.

use serde::Serialize;

use crate::error::{CoreError, ValidationError};
use crate::models::{
    FoodEntrySnapshot, MacroComparison, MacroProgress, MacroStatus, MacroTotals, Targets,
    calories_from_macros,
};

/// Lower bound of the on-track band, inclusive.
pub const NEAR_LOWER_PERCENT: i64 = 90;
/// Upper bound of the on-track band, inclusive.
pub const NEAR_UPPER_PERCENT: i64 = 110;

/// Sums in ascending order. Any permutation of `values` gives the same bits.
fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Sum `field × multiplier` over all entries. Calories come from the summed
/// macros, not from per-entry calorie sums.
#[must_use]
pub fn aggregate(snapshots: &[FoodEntrySnapshot]) -> MacroTotals {
    let scaled: Vec<(f64, f64, f64)> = snapshots.iter().map(FoodEntrySnapshot::scaled).collect();
    let protein = ordered_sum(scaled.iter().map(|s| s.0).collect());
    let carbs = ordered_sum(scaled.iter().map(|s| s.1).collect());
    let fat = ordered_sum(scaled.iter().map(|s| s.2).collect());
    MacroTotals {
        protein,
        carbs,
        fat,
        calories: calories_from_macros(protein, carbs, fat),
    }
}

/// Rounds half toward positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// `round(current / target * 100)`, or `None` when the target is not positive
/// or either input is not finite.
#[must_use]
pub fn percent_of(current: f64, target: f64) -> Option<i64> {
    if !current.is_finite() || !target.is_finite() || target <= 0.0 {
        return None;
    }
    Some(round_half_up(current / target * 100.0) as i64)
}

#[must_use]
pub fn classify(percent: i64) -> MacroStatus {
    if percent > NEAR_UPPER_PERCENT {
        MacroStatus::Over
    } else if percent >= NEAR_LOWER_PERCENT {
        MacroStatus::Near
    } else {
        MacroStatus::Under
    }
}

fn progress(current: f64, target: f64) -> MacroProgress {
    let percent = percent_of(current, target);
    MacroProgress {
        current,
        target,
        percent,
        status: percent.map(classify),
    }
}

#[must_use]
pub fn compare(totals: &MacroTotals, targets: &Targets) -> MacroComparison {
    MacroComparison {
        protein: progress(totals.protein, targets.protein),
        carbs: progress(totals.carbs, targets.carbs),
        fat: progress(totals.fat, targets.fat),
        calories: progress(totals.calories, targets.calories()),
    }
}

pub fn validate_multiplier(multiplier: f64) -> Result<(), ValidationError> {
    if !multiplier.is_finite() {
        return Err(ValidationError::single(
            "multiplier",
            "must be a finite number",
        ));
    }
    if multiplier <= 0.0 {
        return Err(ValidationError::single(
            "multiplier",
            "must be greater than 0",
        ));
    }
    Ok(())
}

/// Parse a multiplier as typed by a user, allowing zero and negatives.
/// Use with [`set_multiplier_or_remove`].
pub fn parse_multiplier_input(s: &str) -> Result<f64, ValidationError> {
    let value: f64 = s.trim().parse().map_err(|_| {
        ValidationError::single("multiplier", format!("'{s}' is not a number"))
    })?;
    if value.is_nan() {
        return Err(ValidationError::single("multiplier", "must be a number"));
    }
    Ok(value)
}

/// Parse a multiplier that must be a positive finite number.
pub fn parse_multiplier(s: &str) -> Result<f64, ValidationError> {
    let value = parse_multiplier_input(s)?;
    validate_multiplier(value)?;
    Ok(value)
}

/// Set an entry's multiplier. Non-positive or non-finite values are rejected
/// and the entry keeps its previous multiplier.
pub fn set_multiplier(
    entries: &mut [FoodEntrySnapshot],
    entry_id: &str,
    multiplier: f64,
) -> Result<FoodEntrySnapshot, CoreError> {
    validate_multiplier(multiplier)?;
    let entry = entries
        .iter_mut()
        .find(|e| e.id == entry_id)
        .ok_or_else(|| CoreError::EntryNotFound(entry_id.to_string()))?;
    entry.multiplier = multiplier;
    Ok(entry.clone())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "entry", rename_all = "snake_case")]
pub enum MultiplierOutcome {
    Updated(FoodEntrySnapshot),
    Removed(FoodEntrySnapshot),
}

/// Set an entry's multiplier, treating zero or negative as a removal request.
/// `NaN` and positive infinity are still rejected.
pub fn set_multiplier_or_remove(
    entries: &mut Vec<FoodEntrySnapshot>,
    entry_id: &str,
    multiplier: f64,
) -> Result<MultiplierOutcome, CoreError> {
    if multiplier.is_nan() {
        return Err(ValidationError::single("multiplier", "must be a number").into());
    }
    let idx = entries
        .iter()
        .position(|e| e.id == entry_id)
        .ok_or_else(|| CoreError::EntryNotFound(entry_id.to_string()))?;
    if multiplier <= 0.0 {
        return Ok(MultiplierOutcome::Removed(entries.remove(idx)));
    }
    validate_multiplier(multiplier)?;
    entries[idx].multiplier = multiplier;
    Ok(MultiplierOutcome::Updated(entries[idx].clone()))
}
