use anyhow::Result;

use macrolog_core::day::select_targets;
use macrolog_core::models::{DayType, Settings, Targets};

use super::Service;

fn print_targets(settings: &Settings) {
    for day_type in DayType::ALL {
        let t = select_targets(settings, day_type);
        let label = day_type.label();
        let cal = t.calories();
        println!(
            "{label}: {cal:.0} kcal  Protein: {:.0}g  Carbs: {:.0}g  Fat: {:.0}g",
            t.protein, t.carbs, t.fat
        );
    }
    if let Some(date) = settings.pending_date {
        let pending = settings.pending_day_type.label();
        println!("{date} will start as: {pending}");
    }
}

pub(crate) fn cmd_target_show(svc: &Service, json: bool) -> Result<()> {
    let settings = svc.settings()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print_targets(&settings);
    }

    Ok(())
}

/// Set targets for one day type. Omitted macros keep their current value.
pub(crate) fn cmd_target_set(
    svc: &Service,
    day_type: &str,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    json: bool,
) -> Result<()> {
    let day_type: DayType = day_type.parse()?;
    let base = select_targets(&svc.settings()?, day_type);
    let targets = Targets {
        protein: protein.unwrap_or(base.protein),
        carbs: carbs.unwrap_or(base.carbs),
        fat: fat.unwrap_or(base.fat),
    };

    let settings = svc.update_targets(day_type, targets)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print_targets(&settings);
    }

    Ok(())
}
