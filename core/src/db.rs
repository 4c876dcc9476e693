use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::models::{DayRecord, DayType, Food, FoodEntrySnapshot, Settings, Targets, now_stamp};
use crate::store::Store;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    conn: Connection,
}

impl ToSql for DayType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DayType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

fn parse_date_text(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    parse_date_text(idx, &raw)
}

fn optional_date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| parse_date_text(idx, &r)).transpose()
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            debug!(from = version, "migrating schema to version 1");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS foods (
                    id TEXT PRIMARY KEY NOT NULL,
                    user_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    portion TEXT NOT NULL,
                    protein REAL NOT NULL CHECK (protein >= 0),
                    carbs REAL NOT NULL CHECK (carbs >= 0),
                    fat REAL NOT NULL CHECK (fat >= 0),
                    frequency INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS day_records (
                    id TEXT PRIMARY KEY NOT NULL,
                    user_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    day_type TEXT NOT NULL CHECK (day_type IN ('workout', 'rest')),
                    created_at TEXT NOT NULL,
                    UNIQUE (user_id, date)
                );

                -- no foreign key on food_id: entries outlive their food
                CREATE TABLE IF NOT EXISTS food_entries (
                    id TEXT PRIMARY KEY NOT NULL,
                    user_id TEXT NOT NULL,
                    day_id TEXT NOT NULL REFERENCES day_records(id) ON DELETE CASCADE,
                    food_id TEXT NOT NULL,
                    food_name TEXT NOT NULL,
                    food_portion TEXT NOT NULL,
                    protein REAL NOT NULL,
                    carbs REAL NOT NULL,
                    fat REAL NOT NULL,
                    multiplier REAL NOT NULL CHECK (multiplier > 0),
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS user_settings (
                    user_id TEXT PRIMARY KEY NOT NULL,
                    workout_protein REAL NOT NULL,
                    workout_carbs REAL NOT NULL,
                    workout_fat REAL NOT NULL,
                    rest_protein REAL NOT NULL,
                    rest_carbs REAL NOT NULL,
                    rest_fat REAL NOT NULL,
                    pending_day_type TEXT NOT NULL CHECK (pending_day_type IN ('workout', 'rest')),
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_foods_user ON foods(user_id);
                CREATE INDEX IF NOT EXISTS idx_day_records_user_date ON day_records(user_id, date);
                CREATE INDEX IF NOT EXISTS idx_food_entries_day ON food_entries(day_id);

                PRAGMA user_version = 1;",
            )?;
        }

        if version < 2 {
            debug!(from = version, "migrating schema to version 2");
            self.conn.execute_batch(
                "ALTER TABLE user_settings ADD COLUMN pending_date TEXT;
                 PRAGMA user_version = 2;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn food_from_row(row: &rusqlite::Row) -> rusqlite::Result<Food> {
        Ok(Food {
            id: row.get(0)?,
            name: row.get(1)?,
            portion: row.get(2)?,
            protein: row.get(3)?,
            carbs: row.get(4)?,
            fat: row.get(5)?,
            frequency: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    // Entries are loaded separately.
    fn day_from_row(row: &rusqlite::Row) -> rusqlite::Result<DayRecord> {
        Ok(DayRecord {
            id: row.get(0)?,
            date: date_column(row, 1)?,
            day_type: row.get(2)?,
            created_at: row.get(3)?,
            entries: Vec::new(),
        })
    }

    fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodEntrySnapshot> {
        Ok(FoodEntrySnapshot {
            id: row.get(0)?,
            day_id: row.get(1)?,
            food_id: row.get(2)?,
            food_name: row.get(3)?,
            food_portion: row.get(4)?,
            protein: row.get(5)?,
            carbs: row.get(6)?,
            fat: row.get(7)?,
            multiplier: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn settings_from_row(row: &rusqlite::Row) -> rusqlite::Result<Settings> {
        Ok(Settings {
            workout: Targets {
                protein: row.get(0)?,
                carbs: row.get(1)?,
                fat: row.get(2)?,
            },
            rest: Targets {
                protein: row.get(3)?,
                carbs: row.get(4)?,
                fat: row.get(5)?,
            },
            pending_day_type: row.get(6)?,
            pending_date: optional_date_column(row, 7)?,
        })
    }

    fn with_entries(&self, user: &str, mut day: DayRecord) -> Result<DayRecord> {
        day.entries = self.list_entries(user, &day.id)?;
        Ok(day)
    }
}

const FOOD_COLUMNS: &str =
    "id, name, portion, protein, carbs, fat, frequency, created_at, updated_at";
const DAY_COLUMNS: &str = "id, date, day_type, created_at";
const ENTRY_COLUMNS: &str =
    "id, day_id, food_id, food_name, food_portion, protein, carbs, fat, multiplier, created_at";

impl Store for Database {
    // --- Foods ---

    fn list_foods(&self, user: &str) -> Result<Vec<Food>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOOD_COLUMNS} FROM foods WHERE user_id = ?1
             ORDER BY frequency DESC, created_at, rowid"
        ))?;
        let foods = stmt
            .query_map(params![user], Self::food_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(foods)
    }

    fn get_food(&self, user: &str, food_id: &str) -> Result<Option<Food>> {
        let food = self
            .conn
            .query_row(
                &format!("SELECT {FOOD_COLUMNS} FROM foods WHERE id = ?1 AND user_id = ?2"),
                params![food_id, user],
                Self::food_from_row,
            )
            .optional()?;
        Ok(food)
    }

    fn create_food(&self, user: &str, food: &Food) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO foods (id, user_id, name, portion, protein, carbs, fat, frequency, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    food.id,
                    user,
                    food.name,
                    food.portion,
                    food.protein,
                    food.carbs,
                    food.fat,
                    food.frequency,
                    food.created_at,
                    food.updated_at,
                ],
            )
            .context("Failed to insert food")?;
        Ok(())
    }

    fn update_food(&self, user: &str, food: &Food) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE foods SET name = ?1, portion = ?2, protein = ?3, carbs = ?4, fat = ?5, updated_at = ?6
             WHERE id = ?7 AND user_id = ?8",
            params![
                food.name,
                food.portion,
                food.protein,
                food.carbs,
                food.fat,
                food.updated_at,
                food.id,
                user,
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_food(&self, user: &str, food_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM foods WHERE id = ?1 AND user_id = ?2",
            params![food_id, user],
        )?;
        Ok(changed > 0)
    }

    fn increment_food_frequency(&self, user: &str, food_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE foods SET frequency = frequency + 1 WHERE id = ?1 AND user_id = ?2",
            params![food_id, user],
        )?;
        Ok(changed > 0)
    }

    fn log_entry(
        &self,
        user: &str,
        new_day: Option<&DayRecord>,
        entry: &FoodEntrySnapshot,
    ) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        if let Some(day) = new_day {
            self.create_day(user, day)?;
        }
        self.create_entry(user, entry)?;
        let bumped = self.increment_food_frequency(user, &entry.food_id)?;
        tx.commit()?;
        Ok(bumped)
    }

    // --- Day records ---

    fn get_day(&self, user: &str, date: NaiveDate) -> Result<Option<DayRecord>> {
        let date_str = date.format(DATE_FORMAT).to_string();
        let day = self
            .conn
            .query_row(
                &format!("SELECT {DAY_COLUMNS} FROM day_records WHERE user_id = ?1 AND date = ?2"),
                params![user, date_str],
                Self::day_from_row,
            )
            .optional()?;
        day.map(|d| self.with_entries(user, d)).transpose()
    }

    fn list_days(&self, user: &str, limit: usize) -> Result<Vec<DayRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let days = {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {DAY_COLUMNS} FROM day_records WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2"
            ))?;
            stmt.query_map(params![user, limit], Self::day_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };
        days.into_iter()
            .map(|d| self.with_entries(user, d))
            .collect()
    }

    fn create_day(&self, user: &str, day: &DayRecord) -> Result<()> {
        let date_str = day.date.format(DATE_FORMAT).to_string();
        self.conn
            .execute(
                "INSERT INTO day_records (id, user_id, date, day_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![day.id, user, date_str, day.day_type, day.created_at],
            )
            .with_context(|| format!("Failed to create day record for {date_str}"))?;
        Ok(())
    }

    fn update_day_type(&self, user: &str, day_id: &str, day_type: DayType) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE day_records SET day_type = ?1 WHERE id = ?2 AND user_id = ?3",
            params![day_type, day_id, user],
        )?;
        Ok(changed > 0)
    }

    // --- Food entry snapshots ---

    fn list_entries(&self, user: &str, day_id: &str) -> Result<Vec<FoodEntrySnapshot>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM food_entries WHERE day_id = ?1 AND user_id = ?2
             ORDER BY created_at, rowid"
        ))?;
        let entries = stmt
            .query_map(params![day_id, user], Self::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn get_entry(&self, user: &str, entry_id: &str) -> Result<Option<FoodEntrySnapshot>> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM food_entries WHERE id = ?1 AND user_id = ?2"),
                params![entry_id, user],
                Self::entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn create_entry(&self, user: &str, entry: &FoodEntrySnapshot) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO food_entries (id, user_id, day_id, food_id, food_name, food_portion, protein, carbs, fat, multiplier, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    entry.id,
                    user,
                    entry.day_id,
                    entry.food_id,
                    entry.food_name,
                    entry.food_portion,
                    entry.protein,
                    entry.carbs,
                    entry.fat,
                    entry.multiplier,
                    entry.created_at,
                ],
            )
            .context("Failed to insert food entry")?;
        Ok(())
    }

    fn update_entry_multiplier(
        &self,
        user: &str,
        entry_id: &str,
        multiplier: f64,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE food_entries SET multiplier = ?1 WHERE id = ?2 AND user_id = ?3",
            params![multiplier, entry_id, user],
        )?;
        Ok(changed > 0)
    }

    fn delete_entry(&self, user: &str, entry_id: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "DELETE FROM food_entries WHERE id = ?1 AND user_id = ?2",
            params![entry_id, user],
        )?;
        Ok(changed > 0)
    }

    // --- Settings ---

    fn get_settings(&self, user: &str) -> Result<Option<Settings>> {
        let settings = self
            .conn
            .query_row(
                "SELECT workout_protein, workout_carbs, workout_fat, rest_protein, rest_carbs, rest_fat, pending_day_type, pending_date
                 FROM user_settings WHERE user_id = ?1",
                params![user],
                Self::settings_from_row,
            )
            .optional()?;
        Ok(settings)
    }

    fn upsert_settings(&self, user: &str, settings: &Settings) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_settings (user_id, workout_protein, workout_carbs, workout_fat, rest_protein, rest_carbs, rest_fat, pending_day_type, pending_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(user_id) DO UPDATE SET
                workout_protein = excluded.workout_protein,
                workout_carbs = excluded.workout_carbs,
                workout_fat = excluded.workout_fat,
                rest_protein = excluded.rest_protein,
                rest_carbs = excluded.rest_carbs,
                rest_fat = excluded.rest_fat,
                pending_day_type = excluded.pending_day_type,
                pending_date = excluded.pending_date,
                updated_at = excluded.updated_at",
            params![
                user,
                settings.workout.protein,
                settings.workout.carbs,
                settings.workout.fat,
                settings.rest.protein,
                settings.rest.carbs,
                settings.rest.fat,
                settings.pending_day_type,
                settings
                    .pending_date
                    .map(|d| d.format(DATE_FORMAT).to_string()),
                now_stamp(),
            ],
        )?;
        Ok(())
    }
}
