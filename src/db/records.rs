//! Transactional bulk insert of activities, best efforts and daily samples.
//!
//! The fetching side hands already-parsed values to these functions; every
//! batch is written inside one transaction so a failure leaves the store
//! untouched.

use crate::libs::error::Result;
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection};

const INSERT_ACTIVITY: &str = "INSERT OR REPLACE INTO activities
    (ExternalID, Year, Month, Day, Week, Name, Type, WorkoutType, Distance, Elevation, MovingTime)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";
const DELETE_EFFORTS: &str = "DELETE FROM best_efforts WHERE ExternalID = ?1";
const INSERT_EFFORT: &str =
    "INSERT INTO best_efforts (ExternalID, Name, ElapsedTime, MovingTime, Distance) VALUES (?1, ?2, ?3, ?4, ?5)";

#[derive(Debug, Clone, PartialEq)]
pub struct Effort {
    pub name: String,
    /// Seconds
    pub elapsed_time: i64,
    /// Seconds
    pub moving_time: i64,
    /// Meters
    pub distance: f64,
}

/// One activity as stored in the fact table.
#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub external_id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub sport: String,
    pub workout_type: Option<String>,
    /// Meters
    pub distance: f64,
    /// Meters
    pub elevation: f64,
    /// Seconds
    pub moving_time: i64,
    pub efforts: Vec<Effort>,
}

impl Activity {
    pub fn new(external_id: i64, date: NaiveDate, sport: &str, distance: f64) -> Self {
        Self {
            external_id,
            date,
            name: format!("{} {}", sport, date),
            sport: sport.to_string(),
            workout_type: None,
            distance,
            elevation: 0.0,
            moving_time: 0,
            efforts: Vec::new(),
        }
    }
}

/// Daily measurement tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyMetric {
    HeartRate,
    Steps,
}

impl DailyMetric {
    fn insert_sql(self) -> &'static str {
        match self {
            DailyMetric::HeartRate => "INSERT OR REPLACE INTO heart_rate (Year, Month, Day, Value) VALUES (?1, ?2, ?3, ?4)",
            DailyMetric::Steps => "INSERT OR REPLACE INTO steps (Year, Month, Day, Value) VALUES (?1, ?2, ?3, ?4)",
        }
    }
}

/// ISO week number clamped to the calendar year of `date`.
///
/// Late-December days that ISO puts in week 1 of the next year stay in
/// week 53; early-January days that belong to the previous ISO year land
/// in week 1.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let iso = date.iso_week();
    if iso.year() > date.year() {
        53
    } else if iso.year() < date.year() {
        1
    } else {
        iso.week()
    }
}

/// Inserts or replaces activities together with their best efforts.
///
/// The week column holds [`week_of_year`]. Returns the number of
/// activities written.
pub fn insert_activities(conn: &mut Connection, activities: &[Activity]) -> Result<usize> {
    if activities.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    {
        let mut insert = tx.prepare(INSERT_ACTIVITY)?;
        let mut clear = tx.prepare(DELETE_EFFORTS)?;
        let mut effort = tx.prepare(INSERT_EFFORT)?;
        for activity in activities {
            let date = activity.date;
            insert.execute(params![
                activity.external_id,
                date.year(),
                date.month(),
                date.day(),
                week_of_year(date),
                activity.name,
                activity.sport,
                activity.workout_type,
                activity.distance,
                activity.elevation,
                activity.moving_time,
            ])?;
            clear.execute(params![activity.external_id])?;
            for e in &activity.efforts {
                effort.execute(params![activity.external_id, e.name, e.elapsed_time, e.moving_time, e.distance])?;
            }
        }
    }
    tx.commit()?;
    tracing::debug!(count = activities.len(), "activities stored");

    Ok(activities.len())
}

/// Inserts or replaces one sample per day for `metric`.
pub fn insert_daily(conn: &mut Connection, metric: DailyMetric, samples: &[(NaiveDate, f64)]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(metric.insert_sql())?;
        for (date, value) in samples {
            stmt.execute(params![date.year(), date.month(), date.day(), value])?;
        }
    }
    tx.commit()?;
    Ok(samples.len())
}
