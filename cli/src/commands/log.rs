use anyhow::Result;

use macrolog_core::aggregate::parse_multiplier;

use super::helpers::{exit_not_found, format_multiplier, or_exit_not_found, parse_date};
use super::{Service, resolve_food};

pub(crate) fn cmd_log(
    svc: &Service,
    food_query: Option<&str>,
    multiplier: &str,
    food_id: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let multiplier = parse_multiplier(multiplier)?;
    let date = parse_date(date)?;

    let food_id = match (food_id, food_query) {
        (Some(id), _) => id.to_string(),
        (None, Some(query)) => match resolve_food(svc, query)? {
            Some(food) => food.id,
            None => exit_not_found(&format!("No food found for '{query}'"), json),
        },
        (None, None) => anyhow::bail!("Provide a food name or --food-id"),
    };

    let outcome = or_exit_not_found(svc.log_food(date, &food_id, multiplier), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        let entry = &outcome.entry;
        let name = &entry.food_name;
        let portion = &entry.food_portion;
        let times = format_multiplier(entry.multiplier);
        let (p, c, f) = entry.scaled();
        println!("Logged: {times} x {name} ({portion}) on {date} | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
        if outcome.day_created {
            let summary = svc.day_summary(date)?;
            let label = summary.day_type.label();
            println!("Started {date} as a {label}");
        }
    }

    Ok(())
}
