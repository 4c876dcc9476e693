//! Food catalog: frequency ranking, usage bookkeeping and food validation.

use crate::error::{FieldErrors, ValidationError};
use crate::models::{Food, FoodPatch, NewFood, new_id, now_stamp};

/// Catalog ordered by frequency, most used first. Equal frequencies keep
/// their input order.
#[must_use]
pub fn ranked_view(foods: &[Food]) -> Vec<Food> {
    let mut ranked = foods.to_vec();
    ranked.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    ranked
}

/// Returns the catalog with `food_id`'s frequency bumped by one, or `None`
/// when no food has that id.
#[must_use]
pub fn record_usage(foods: &[Food], food_id: &str) -> Option<Vec<Food>> {
    if !foods.iter().any(|f| f.id == food_id) {
        return None;
    }
    Some(
        foods
            .iter()
            .map(|f| {
                if f.id == food_id {
                    Food {
                        frequency: f.frequency + 1,
                        ..f.clone()
                    }
                } else {
                    f.clone()
                }
            })
            .collect(),
    )
}

fn check_macro(errors: &mut FieldErrors, field: &'static str, value: f64) {
    if !value.is_finite() {
        errors.push(field, "must be a finite number");
    } else if value < 0.0 {
        errors.push(field, "must not be negative");
    }
}

fn validate_fields(
    name: &str,
    portion: &str,
    protein: f64,
    carbs: f64,
    fat: f64,
) -> Result<(), ValidationError> {
    let mut errors = FieldErrors::default();
    if name.trim().is_empty() {
        errors.push("name", "must not be empty");
    }
    if portion.trim().is_empty() {
        errors.push("portion", "must not be empty");
    }
    check_macro(&mut errors, "protein", protein);
    check_macro(&mut errors, "carbs", carbs);
    check_macro(&mut errors, "fat", fat);
    if !(protein > 0.0 || carbs > 0.0 || fat > 0.0) {
        errors.push("macros", "at least one of protein, carbs or fat must be above 0");
    }
    errors.finish()
}

pub fn validate_new_food(draft: &NewFood) -> Result<(), ValidationError> {
    validate_fields(
        &draft.name,
        &draft.portion,
        draft.protein,
        draft.carbs,
        draft.fat,
    )
}

/// Validate a draft and turn it into a catalog food with a fresh id and zero frequency.
pub fn create_food(draft: NewFood) -> Result<Food, ValidationError> {
    validate_new_food(&draft)?;
    let now = now_stamp();
    Ok(Food {
        id: new_id(),
        name: draft.name.trim().to_string(),
        portion: draft.portion.trim().to_string(),
        protein: draft.protein,
        carbs: draft.carbs,
        fat: draft.fat,
        frequency: 0,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Apply a patch and revalidate. Frequency and id are carried over untouched.
pub fn edit_food(food: &Food, patch: FoodPatch) -> Result<Food, ValidationError> {
    let edited = Food {
        name: patch.name.map_or_else(|| food.name.clone(), |n| n.trim().to_string()),
        portion: patch
            .portion
            .map_or_else(|| food.portion.clone(), |p| p.trim().to_string()),
        protein: patch.protein.unwrap_or(food.protein),
        carbs: patch.carbs.unwrap_or(food.carbs),
        fat: patch.fat.unwrap_or(food.fat),
        updated_at: now_stamp(),
        ..food.clone()
    };
    validate_fields(
        &edited.name,
        &edited.portion,
        edited.protein,
        edited.carbs,
        edited.fat,
    )?;
    Ok(edited)
}

#[must_use]
pub fn delete_food(foods: &[Food], food_id: &str) -> Vec<Food> {
    foods.iter().filter(|f| f.id != food_id).cloned().collect()
}

/// Case-insensitive substring match on name or portion, ranked.
#[must_use]
pub fn search(foods: &[Food], query: &str) -> Vec<Food> {
    let needle = query.trim().to_lowercase();
    let matching: Vec<Food> = foods
        .iter()
        .filter(|f| {
            f.name.to_lowercase().contains(&needle) || f.portion.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();
    ranked_view(&matching)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::models::FoodEntrySnapshot;

    fn food(id: &str, frequency: i64) -> Food {
        Food {
            id: id.to_string(),
            name: format!("Food {id}"),
            portion: "1 serving".to_string(),
            protein: 10.0,
            carbs: 20.0,
            fat: 5.0,
            frequency,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn draft(name: &str, portion: &str, protein: f64, carbs: f64, fat: f64) -> NewFood {
        NewFood {
            name: name.to_string(),
            portion: portion.to_string(),
            protein,
            carbs,
            fat,
        }
    }

    fn ids(foods: &[Food]) -> Vec<&str> {
        foods.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_ranked_view_descending() {
        let foods = vec![food("a", 1), food("b", 9), food("c", 4)];
        assert_eq!(ids(&ranked_view(&foods)), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ranked_view_stable_ties() {
        let foods = vec![food("a", 5), food("b", 5), food("c", 3)];
        assert_eq!(ids(&ranked_view(&foods)), vec!["a", "b", "c"]);

        let foods = vec![food("c", 3), food("b", 5), food("a", 5)];
        assert_eq!(ids(&ranked_view(&foods)), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_ranked_view_does_not_mutate_input() {
        let foods = vec![food("a", 1), food("b", 2)];
        let _ = ranked_view(&foods);
        assert_eq!(ids(&foods), vec!["a", "b"]);
    }

    #[test]
    fn test_record_usage_increments_only_target() {
        let foods = vec![food("a", 5), food("b", 5), food("c", 3)];
        let updated = record_usage(&foods, "c").unwrap();
        assert_eq!(updated[2].frequency, 4);
        assert_eq!(updated[0], foods[0]);
        assert_eq!(updated[1], foods[1]);
        assert_eq!(
            Food {
                frequency: 3,
                ..updated[2].clone()
            },
            foods[2]
        );
    }

    #[test]
    fn test_record_usage_unknown_id() {
        let foods = vec![food("a", 5)];
        assert!(record_usage(&foods, "zzz").is_none());
        assert!(record_usage(&[], "a").is_none());
    }

    #[test]
    fn test_record_usage_then_rerank() {
        let foods = vec![food("a", 5), food("b", 5)];
        let updated = record_usage(&foods, "b").unwrap();
        assert_eq!(ids(&ranked_view(&updated)), vec!["b", "a"]);
    }

    #[test]
    fn test_create_food_valid() {
        let f = create_food(draft(" Banana ", "1 large (126g)", 1.0, 27.0, 0.0)).unwrap();
        assert_eq!(f.name, "Banana");
        assert_eq!(f.frequency, 0);
        assert!(!f.id.is_empty());
        assert_eq!(f.created_at, f.updated_at);
    }

    #[test]
    fn test_create_food_unique_ids() {
        let a = create_food(draft("A", "1", 1.0, 0.0, 0.0)).unwrap();
        let b = create_food(draft("A", "1", 1.0, 0.0, 0.0)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_create_food_rejects_all_zero_macros() {
        let err = create_food(draft("X", "1", 0.0, 0.0, 0.0)).unwrap_err();
        assert!(err.has_field("macros"));
        assert_eq!(err.fields.len(), 1);
    }

    #[test]
    fn test_create_food_enumerates_failures() {
        let err = create_food(draft("  ", "", -1.0, f64::NAN, 2.0)).unwrap_err();
        assert!(err.has_field("name"));
        assert!(err.has_field("portion"));
        assert!(err.has_field("protein"));
        assert!(err.has_field("carbs"));
        assert!(!err.has_field("fat"));
        assert!(!err.has_field("macros"));
    }

    #[test]
    fn test_edit_food_keeps_frequency_and_id() {
        let original = food("a", 12);
        let patch = FoodPatch {
            protein: Some(30.0),
            name: Some("Renamed".to_string()),
            ..FoodPatch::default()
        };
        let edited = edit_food(&original, patch).unwrap();
        assert_eq!(edited.id, "a");
        assert_eq!(edited.frequency, 12);
        assert_eq!(edited.name, "Renamed");
        assert!((edited.protein - 30.0).abs() < f64::EPSILON);
        assert!((edited.carbs - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_edit_food_revalidates() {
        let original = food("a", 1);
        let patch = FoodPatch {
            protein: Some(0.0),
            carbs: Some(0.0),
            fat: Some(0.0),
            ..FoodPatch::default()
        };
        assert!(edit_food(&original, patch).unwrap_err().has_field("macros"));

        let patch = FoodPatch {
            portion: Some(String::new()),
            ..FoodPatch::default()
        };
        assert!(edit_food(&original, patch).unwrap_err().has_field("portion"));
    }

    #[test]
    fn test_edit_food_leaves_snapshots_alone() {
        let original = food("a", 0);
        let entries = vec![FoodEntrySnapshot::capture(&original, "day", 1.0)];
        let before = aggregate(&entries);

        let patch = FoodPatch {
            protein: Some(99.0),
            ..FoodPatch::default()
        };
        let edited = edit_food(&original, patch).unwrap();
        assert!((edited.protein - 99.0).abs() < f64::EPSILON);
        assert_eq!(aggregate(&entries), before);
        assert!((entries[0].protein - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delete_food() {
        let foods = vec![food("a", 1), food("b", 2)];
        let entries = vec![FoodEntrySnapshot::capture(&foods[0], "day", 1.0)];
        let remaining = delete_food(&foods, "a");
        assert_eq!(ids(&remaining), vec!["b"]);
        assert_eq!(entries[0].food_name, "Food a");
        assert!((aggregate(&entries).protein - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delete_food_unknown_id_is_noop() {
        let foods = vec![food("a", 1)];
        assert_eq!(delete_food(&foods, "x"), foods);
    }

    #[test]
    fn test_search() {
        let mut rice = food("rice", 2);
        rice.name = "Jasmine Rice".to_string();
        let mut beef = food("beef", 9);
        beef.name = "Ground Beef".to_string();
        beef.portion = "8 oz serving".to_string();
        let foods = vec![rice, beef];
        assert_eq!(ids(&search(&foods, "rice")), vec!["rice"]);
        assert_eq!(ids(&search(&foods, "OZ")), vec!["beef"]);
        assert_eq!(ids(&search(&foods, "")), vec!["beef", "rice"]);
    }
}
