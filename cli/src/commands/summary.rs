use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use macrolog_core::models::MacroProgress;

use super::Service;
use super::helpers::{format_progress, no_neg_zero, parse_date, print_entry_table};

pub(crate) fn cmd_summary(svc: &Service, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let summary = svc.day_summary(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let label = summary.day_type.label();
    let day = &summary.date;
    println!("=== {day} ({label}) ===\n");

    if summary.entries.is_empty() {
        println!("  No foods logged yet\n");
    } else {
        print_entry_table(&summary.entries);
        println!();
    }

    let cmp = &summary.comparison;
    println!("  Protein:  {}", format_progress(&cmp.protein, "g"));
    println!("  Carbs:    {}", format_progress(&cmp.carbs, "g"));
    println!("  Fat:      {}", format_progress(&cmp.fat, "g"));
    println!("  Calories: {}", format_progress(&cmp.calories, " kcal"));

    Ok(())
}

fn percent_cell(p: &MacroProgress) -> String {
    p.percent.map_or_else(|| "-".to_string(), |pct| format!("{pct}%"))
}

pub(crate) fn cmd_history(svc: &Service, days: usize, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Day")]
        day_type: String,
        #[tabled(rename = "Foods")]
        foods: usize,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "kcal")]
        calories: String,
        #[tabled(rename = "kcal %")]
        calories_pct: String,
    }

    let summaries = svc.history(days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        eprintln!("No days logged yet");
        process::exit(2);
    }

    let rows: Vec<HistoryRow> = summaries
        .iter()
        .map(|s| {
            let p = no_neg_zero(s.totals.protein);
            let c = no_neg_zero(s.totals.carbs);
            let f = no_neg_zero(s.totals.fat);
            let cal = no_neg_zero(s.totals.calories);
            HistoryRow {
                date: s.date.clone(),
                day_type: s.day_type.to_string(),
                foods: s.entries.len(),
                protein: format!("{p:.0}g"),
                carbs: format!("{c:.0}g"),
                fat: format!("{f:.0}g"),
                calories: format!("{cal:.0}"),
                calories_pct: percent_cell(&s.comparison.calories),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
