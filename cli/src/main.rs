mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_day_type, cmd_entry_remove, cmd_entry_set, cmd_food_add, cmd_food_delete, cmd_food_edit,
    cmd_food_list, cmd_history, cmd_log, cmd_summary, cmd_target_set, cmd_target_show,
};
use crate::config::Config;
use macrolog_core::models::{FoodPatch, NewFood};
use macrolog_core::service::{HISTORY_DAYS, MacroService};

#[derive(Parser)]
#[command(
    name = "macrolog",
    version,
    about = "Track daily protein, carbs and fat against workout and rest day targets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a catalog food to a day
    Log {
        /// Food name to search the catalog for
        #[arg(required_unless_present = "food_id")]
        food: Option<String>,
        /// Number of portions (e.g. 2, 0.5)
        #[arg(short, long, default_value = "1")]
        multiplier: String,
        /// Log directly by food ID (skip search)
        #[arg(long)]
        food_id: Option<String>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's entries and progress against targets (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recent logged days
    History {
        /// Number of days to show
        #[arg(short, long, default_value_t = HISTORY_DAYS)]
        days: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a day as a workout or rest day
    DayType {
        /// workout or rest
        day_type: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change or remove logged entries
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Manage the food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Manage workout and rest day macro targets
    Target {
        #[command(subcommand)]
        command: TargetCommands,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum EntryCommands {
    /// Set an entry's multiplier
    Set {
        /// Entry ID
        entry_id: String,
        /// New multiplier
        #[arg(allow_negative_numbers = true)]
        multiplier: String,
        /// Remove the entry when the multiplier is zero or negative
        #[arg(long)]
        remove_nonpositive: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an entry
    Remove {
        /// Entry ID
        entry_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Add a food to the catalog
    Add {
        /// Food name
        name: String,
        /// Portion description (e.g. "8 oz serving", "1 cup cooked")
        #[arg(long)]
        portion: String,
        /// Protein grams per portion
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Carb grams per portion
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Fat grams per portion
        #[arg(long, default_value = "0")]
        fat: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List foods, most used first
    List {
        /// Search query to filter foods
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a food. Entries already logged keep their values.
    Edit {
        /// Food ID
        food_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        portion: Option<String>,
        #[arg(long)]
        protein: Option<f64>,
        #[arg(long)]
        carbs: Option<f64>,
        #[arg(long)]
        fat: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food from the catalog
    Delete {
        /// Food ID
        food_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TargetCommands {
    /// Show workout and rest day targets
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set targets for a day type; omitted macros are unchanged
    Set {
        /// workout or rest
        day_type: String,
        #[arg(long)]
        protein: Option<f64>,
        #[arg(long)]
        carbs: Option<f64>,
        #[arg(long)]
        fat: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("macrolog=warn,macrolog_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = MacroService::open(&config.db_path, config.session())?;
    tracing::debug!(db = %config.db_path.display(), user = %config.user, "opened database");

    match cli.command {
        Commands::Log {
            food,
            multiplier,
            food_id,
            date,
            json,
        } => cmd_log(
            &svc,
            food.as_deref(),
            &multiplier,
            food_id.as_deref(),
            date,
            json,
        ),
        Commands::Summary { date, json } => cmd_summary(&svc, date, json),
        Commands::History { days, json } => cmd_history(&svc, days, json),
        Commands::DayType {
            day_type,
            date,
            json,
        } => cmd_day_type(&svc, &day_type, date, json),
        Commands::Entry { command } => match command {
            EntryCommands::Set {
                entry_id,
                multiplier,
                remove_nonpositive,
                json,
            } => cmd_entry_set(&svc, &entry_id, &multiplier, remove_nonpositive, json),
            EntryCommands::Remove { entry_id, json } => cmd_entry_remove(&svc, &entry_id, json),
        },
        Commands::Food { command } => match command {
            FoodCommands::Add {
                name,
                portion,
                protein,
                carbs,
                fat,
                json,
            } => cmd_food_add(
                &svc,
                NewFood {
                    name,
                    portion,
                    protein,
                    carbs,
                    fat,
                },
                json,
            ),
            FoodCommands::List { search, json } => cmd_food_list(&svc, search.as_deref(), json),
            FoodCommands::Edit {
                food_id,
                name,
                portion,
                protein,
                carbs,
                fat,
                json,
            } => cmd_food_edit(
                &svc,
                &food_id,
                FoodPatch {
                    name,
                    portion,
                    protein,
                    carbs,
                    fat,
                },
                json,
            ),
            FoodCommands::Delete { food_id, json } => cmd_food_delete(&svc, &food_id, json),
        },
        Commands::Target { command } => match command {
            TargetCommands::Show { json } => cmd_target_show(&svc, json),
            TargetCommands::Set {
                day_type,
                protein,
                carbs,
                fat,
                json,
            } => cmd_target_set(&svc, &day_type, protein, carbs, fat, json),
        },
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?.0)
            };
            server::start_server(svc, port, &bind, api_key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_requires_food_or_id() {
        assert!(Cli::try_parse_from(["macrolog", "log"]).is_err());
        assert!(Cli::try_parse_from(["macrolog", "log", "--food-id", "abc"]).is_ok());
        assert!(Cli::try_parse_from(["macrolog", "log", "rice", "-m", "1.5"]).is_ok());
    }

    #[test]
    fn entry_set_accepts_negative_multiplier() {
        let cli = Cli::try_parse_from([
            "macrolog",
            "entry",
            "set",
            "abc",
            "-1",
            "--remove-nonpositive",
        ])
        .unwrap();
        match cli.command {
            Commands::Entry {
                command:
                    EntryCommands::Set {
                        multiplier,
                        remove_nonpositive,
                        ..
                    },
            } => {
                assert_eq!(multiplier, "-1");
                assert!(remove_nonpositive);
            }
            _ => panic!("expected entry set"),
        }
    }

    #[test]
    fn history_defaults_to_thirty_days() {
        let cli = Cli::try_parse_from(["macrolog", "history"]).unwrap();
        match cli.command {
            Commands::History { days, .. } => assert_eq!(days, HISTORY_DAYS),
            _ => panic!("expected history"),
        }
    }
}
