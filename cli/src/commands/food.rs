use anyhow::{Result, bail};
use std::process;

use macrolog_core::models::{Food, FoodPatch, NewFood};

use super::Service;
use super::helpers::{or_exit_not_found, print_food_table};

pub(crate) fn cmd_food_add(svc: &Service, draft: NewFood, json: bool) -> Result<()> {
    let food = svc.add_food(draft)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        let id = &food.id;
        let cal = food.calories();
        println!("Added food: {name} ({cal:.0} kcal, id: {id})");
    }

    Ok(())
}

pub(crate) fn cmd_food_list(svc: &Service, search: Option<&str>, json: bool) -> Result<()> {
    let foods = match search {
        Some(q) => svc.search_foods(q)?,
        None => svc.list_foods()?,
    };

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&foods)?);
    } else {
        let refs: Vec<&Food> = foods.iter().collect();
        print_food_table(&refs);
    }

    Ok(())
}

pub(crate) fn cmd_food_edit(
    svc: &Service,
    food_id: &str,
    patch: FoodPatch,
    json: bool,
) -> Result<()> {
    if patch.is_empty() {
        bail!(
            "Nothing to update. Provide at least one of --name, --portion, --protein, --carbs, or --fat"
        );
    }

    let food = or_exit_not_found(svc.edit_food(food_id, patch), json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&food)?);
    } else {
        let name = &food.name;
        println!("Updated food: {name} (past entries keep their logged values)");
    }

    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &Service, food_id: &str, json: bool) -> Result<()> {
    let remaining = or_exit_not_found(svc.delete_food(food_id), json)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": food_id, "remaining": remaining.len() })
        );
    } else {
        println!("Deleted food {food_id}");
    }

    Ok(())
}
