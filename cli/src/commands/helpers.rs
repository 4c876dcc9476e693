use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macrolog_core::error::CoreError;
use macrolog_core::models::{Food, FoodEntrySnapshot, MacroProgress, MacroStatus};
use macrolog_core::service::today;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(today()),
        Some(s) => match s.as_str() {
            "today" => Ok(today()),
            "yesterday" => Ok(today() - chrono::Duration::days(1)),
            "tomorrow" => Ok(today() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a food (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_food_table(foods: &[&Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Portion")]
        portion: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "kcal")]
        calories: String,
        #[tabled(rename = "Uses")]
        frequency: i64,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: f.id.clone(),
            name: truncate(&f.name, 35),
            portion: truncate(&f.portion, 20),
            protein: format!("{:.1}g", f.protein),
            carbs: format!("{:.1}g", f.carbs),
            fat: format!("{:.1}g", f.fat),
            calories: format!("{:.0}", f.calories()),
            frequency: f.frequency,
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_entry_table(entries: &[FoodEntrySnapshot]) {
    #[derive(Tabled)]
    struct EntryRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Portion")]
        portion: String,
        #[tabled(rename = "x")]
        multiplier: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let rows: Vec<EntryRow> = entries
        .iter()
        .map(|e| {
            let (p, c, f) = e.scaled();
            EntryRow {
                id: e.id.clone(),
                name: truncate(&e.food_name, 35),
                portion: truncate(&e.food_portion, 20),
                multiplier: format_multiplier(e.multiplier),
                protein: format!("{p:.1}g"),
                carbs: format!("{c:.1}g"),
                fat: format!("{f:.1}g"),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn format_multiplier(m: f64) -> String {
    if m.fract() == 0.0 {
        format!("{m:.0}")
    } else {
        format!("{m}")
    }
}

/// "104/180g (58%, under)". Missing targets show as "no target".
pub(crate) fn format_progress(p: &MacroProgress, unit: &str) -> String {
    let current = no_neg_zero(p.current);
    let target = p.target;
    match (p.percent, p.status) {
        (Some(pct), Some(status)) => {
            let status = status_label(status);
            format!("{current:.0}/{target:.0}{unit} ({pct}%, {status})")
        }
        _ => format!("{current:.0}{unit} (no target)"),
    }
}

pub(crate) fn status_label(status: MacroStatus) -> &'static str {
    match status {
        MacroStatus::Under => "under",
        MacroStatus::Near => "on track",
        MacroStatus::Over => "over",
    }
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::FoodNotFound(_) | CoreError::EntryNotFound(_))
    )
}

pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

/// Pass the result through, except not-found errors which are reported and exit with status 2.
pub(crate) fn or_exit_not_found<T>(result: Result<T>, json: bool) -> Result<T> {
    match result {
        Err(e) if is_not_found(&e) => exit_not_found(&e.to_string(), json),
        other => other,
    }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
