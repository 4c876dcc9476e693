use anyhow::Result;

use macrolog_core::aggregate::{MultiplierOutcome, parse_multiplier, parse_multiplier_input};

use super::Service;
use super::helpers::{format_multiplier, or_exit_not_found};

/// Change a logged entry's multiplier. With `remove_nonpositive`, zero or a
/// negative value removes the entry instead of being rejected.
pub(crate) fn cmd_entry_set(
    svc: &Service,
    entry_id: &str,
    value: &str,
    remove_nonpositive: bool,
    json: bool,
) -> Result<()> {
    if remove_nonpositive {
        let multiplier = parse_multiplier_input(value)?;
        let outcome = or_exit_not_found(svc.set_multiplier_or_remove(entry_id, multiplier), json)?;
        match outcome {
            MultiplierOutcome::Updated(entry) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&entry)?);
                } else {
                    let times = format_multiplier(entry.multiplier);
                    println!("Updated {}: now {times} x {}", entry.id, entry.food_name);
                }
            }
            MultiplierOutcome::Removed(entry) => {
                if json {
                    println!("{}", serde_json::json!({ "removed": entry.id }));
                } else {
                    println!("Removed {} ({})", entry.id, entry.food_name);
                }
            }
        }
        return Ok(());
    }

    let multiplier = parse_multiplier(value)?;
    let entry = or_exit_not_found(svc.set_multiplier(entry_id, multiplier), json)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let times = format_multiplier(entry.multiplier);
        println!("Updated {}: now {times} x {}", entry.id, entry.food_name);
    }
    Ok(())
}

pub(crate) fn cmd_entry_remove(svc: &Service, entry_id: &str, json: bool) -> Result<()> {
    let entry = or_exit_not_found(svc.remove_entry(entry_id), json)?;
    if json {
        println!("{}", serde_json::json!({ "removed": entry.id }));
    } else {
        println!("Removed {} ({})", entry.id, entry.food_name);
    }
    Ok(())
}
