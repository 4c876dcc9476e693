use anyhow::Result;

use macrolog_core::day::DayTransition;
use macrolog_core::models::DayType;

use super::Service;
use super::helpers::parse_date;

pub(crate) fn cmd_day_type(
    svc: &Service,
    day_type: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let day_type: DayType = day_type.parse()?;
    let date = parse_date(date)?;
    let transition = svc.toggle_day_type(date, day_type)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&transition)?);
    } else {
        let label = day_type.label();
        match transition {
            DayTransition::UpdatedRecord { .. } => println!("{date} is now a {label}"),
            DayTransition::UpdatedPending { .. } => {
                println!("{date} will start as a {label} when you log the first food");
            }
        }
    }

    Ok(())
}
