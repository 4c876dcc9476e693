mod day;
mod entry;
mod food;
mod helpers;
mod log;
mod summary;
mod target;

use anyhow::Result;

use macrolog_core::db::Database;
use macrolog_core::models::Food;
use macrolog_core::service::MacroService;

use helpers::{print_food_table, prompt_choice};

pub(crate) use day::cmd_day_type;
pub(crate) use entry::{cmd_entry_remove, cmd_entry_set};
pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_edit, cmd_food_list};
pub(crate) use log::cmd_log;
pub(crate) use summary::{cmd_history, cmd_summary};
pub(crate) use target::{cmd_target_set, cmd_target_show};

pub(crate) type Service = MacroService<Database>;

/// Resolve a food name against the catalog. An exact (case-insensitive) name
/// match wins; otherwise a single hit is taken and several hits prompt for a
/// choice. `None` when nothing matches.
pub(super) fn resolve_food(svc: &Service, food_query: &str) -> Result<Option<Food>> {
    let hits = svc.search_foods(food_query)?;

    if let Some(exact) = hits
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(food_query.trim()))
    {
        return Ok(Some(exact.clone()));
    }

    if hits.len() <= 1 {
        return Ok(hits.into_iter().next());
    }

    let refs: Vec<&Food> = hits.iter().collect();
    print_food_table(&refs);
    let idx = prompt_choice(hits.len())?;
    Ok(hits.into_iter().nth(idx))
}
