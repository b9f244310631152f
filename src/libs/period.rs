//! Period totals, rankings and best efforts.
//!
//! Consumes typed rows from the executor and shapes them into per-period,
//! per-year tables. Every function here aborts on the first row error and
//! returns nothing partial.
//!
//! ## Units
//!
//! Distances are stored in meters. A measure whose name contains
//! `distance` but not `count` is reported in kilometers; everything else is
//! passed through untouched.

use crate::db::executor::FromRow;
use crate::db::query::{Column, Direction, Directive, Field, OrderConfig, Table};
use crate::libs::error::{Result, StatsError};
use chrono::NaiveDate;
use rusqlite::Row;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Calendar bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// ISO weeks 1..=53
    Week,
    /// Months 1..=12
    Month,
}

impl Period {
    pub fn buckets(self) -> usize {
        match self {
            Period::Week => 53,
            Period::Month => 12,
        }
    }

    pub fn column(self) -> Column {
        match self {
            Period::Week => Column::Week,
            Period::Month => Column::Month,
        }
    }

    pub fn label(self, year: i32, value: u32) -> String {
        match self {
            Period::Week => format!("{}-W{:02}", year, value),
            Period::Month => format!("{}-{:02}", year, value),
        }
    }
}

impl FromStr for Period {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(StatsError::bad_options(format!("unknown period '{}'", other))),
        }
    }
}

/// What is summed per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Distance,
    Elevation,
    Time,
    Count,
}

impl Measure {
    pub fn field(self) -> Field {
        match self {
            Measure::Distance => Field::Sum(Column::Distance),
            Measure::Elevation => Field::Sum(Column::Elevation),
            Measure::Time => Field::Sum(Column::MovingTime),
            Measure::Count => Field::Count,
        }
    }
}

impl FromStr for Measure {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "distance" => Ok(Measure::Distance),
            "elevation" => Ok(Measure::Elevation),
            "time" => Ok(Measure::Time),
            "count" => Ok(Measure::Count),
            other => Err(StatsError::bad_options(format!("unknown measure '{}'", other))),
        }
    }
}

/// True when values of `measure` are meters that should be shown as kilometers.
pub fn converts_to_km(measure: &str) -> bool {
    let measure = measure.to_lowercase();
    measure.contains("distance") && !measure.contains("count")
}

fn unit_factor(measure: &str) -> f64 {
    if converts_to_km(measure) {
        1.0 / 1000.0
    } else {
        1.0
    }
}

/// `(year, period value, measure)` as selected by [`period_query`] and [`top_query`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodRow {
    pub year: i32,
    pub period: u32,
    pub value: f64,
}

impl FromRow for PeriodRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PeriodRow {
            year: row.get(0)?,
            period: row.get(1)?,
            value: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
        })
    }
}

/// Per-period, per-year totals.
///
/// `buckets[i][j]` is the value of period `i + 1` for `years[j]`; `None`
/// marks a period without any activity, which is not the same as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTable {
    pub period: Period,
    pub years: Vec<i32>,
    pub buckets: Vec<Vec<Option<f64>>>,
    pub totals: BTreeMap<i32, f64>,
}

impl PeriodTable {
    pub fn cell(&self, period_value: u32, year: i32) -> Option<f64> {
        let j = self.years.iter().position(|y| *y == year)?;
        self.buckets.get(period_value.checked_sub(1)? as usize)?.get(j).copied().flatten()
    }
}

/// Buckets rows by period and year and totals each year.
///
/// Rows of years outside `years` are skipped. An empty `years` keeps every
/// year seen, in ascending order.
///
/// # Errors
///
/// Row errors are returned as-is; a period value outside the bucket range
/// is a [`StatsError::ScanMismatch`].
pub fn aggregate_period<I>(rows: I, period: Period, years: &[i32], measure: &str) -> Result<PeriodTable>
where
    I: IntoIterator<Item = Result<PeriodRow>>,
{
    let factor = unit_factor(measure);
    let mut cells: BTreeMap<(usize, i32), f64> = BTreeMap::new();
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();

    for row in rows {
        let row = row?;
        if !years.is_empty() && !years.contains(&row.year) {
            continue;
        }
        if row.period == 0 || row.period as usize > period.buckets() {
            return Err(StatsError::scan_mismatch(format!(
                "{:?} value {} out of range for {}",
                period, row.period, row.year
            )));
        }
        let value = row.value * factor;
        *totals.entry(row.year).or_insert(0.0) += value;
        *cells.entry((row.period as usize - 1, row.year)).or_insert(0.0) += value;
    }

    let years: Vec<i32> = if years.is_empty() {
        totals.keys().copied().collect()
    } else {
        let mut unique = Vec::with_capacity(years.len());
        for y in years {
            if !unique.contains(y) {
                unique.push(*y);
            }
        }
        unique
    };

    let mut buckets = vec![vec![None; years.len()]; period.buckets()];
    for ((index, year), value) in cells {
        if let Some(j) = years.iter().position(|y| *y == year) {
            buckets[index][j] = Some(value);
        }
    }

    Ok(PeriodTable {
        period,
        years,
        buckets,
        totals,
    })
}

/// One line of a ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub rank: usize,
    pub year: i32,
    pub period: Period,
    pub period_value: u32,
    pub value: f64,
}

impl RankedEntry {
    pub fn label(&self) -> String {
        self.period.label(self.year, self.period_value)
    }
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}. {} {:.2}", self.rank, self.label(), self.value)
    }
}

/// Labels rows already ordered and limited by [`top_query`].
pub fn top<I>(rows: I, period: Period, measure: &str) -> Result<Vec<RankedEntry>>
where
    I: IntoIterator<Item = Result<PeriodRow>>,
{
    let factor = unit_factor(measure);
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let row = row?;
            Ok(RankedEntry {
                rank: i + 1,
                year: row.year,
                period,
                period_value: row.period,
                value: row.value * factor,
            })
        })
        .collect()
}

/// `(year, month, day, activity name, elapsed seconds, meters)` per effort.
#[derive(Debug, Clone, PartialEq)]
pub struct BestEffortRow {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub activity: String,
    pub elapsed_time: i64,
    pub distance: f64,
}

impl FromRow for BestEffortRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(BestEffortRow {
            year: row.get(0)?,
            month: row.get(1)?,
            day: row.get(2)?,
            activity: row.get(3)?,
            elapsed_time: row.get(4)?,
            distance: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BestEffort {
    pub date: NaiveDate,
    pub activity: String,
    /// Seconds
    pub elapsed_time: i64,
    /// Kilometers
    pub distance: f64,
}

/// Fastest efforts first; equal times list the most recent first.
pub fn best_efforts<I>(rows: I) -> Result<Vec<BestEffort>>
where
    I: IntoIterator<Item = Result<BestEffortRow>>,
{
    let mut efforts = Vec::new();
    for row in rows {
        let row = row?;
        let date = NaiveDate::from_ymd_opt(row.year, row.month, row.day).ok_or_else(|| {
            StatsError::scan_mismatch(format!("invalid date {}-{}-{}", row.year, row.month, row.day))
        })?;
        efforts.push(BestEffort {
            date,
            activity: row.activity,
            elapsed_time: row.elapsed_time,
            distance: row.distance / 1000.0,
        });
    }
    efforts.sort_by(|a, b| a.elapsed_time.cmp(&b.elapsed_time).then(b.date.cmp(&a.date)));
    Ok(efforts)
}

fn base_filters(years: &[i32], sports: &[String]) -> Vec<Directive> {
    let mut directives = Vec::new();
    if !sports.is_empty() {
        directives.push(Directive::WithSports(sports.to_vec()));
    }
    if !years.is_empty() {
        directives.push(Directive::WithYears(years.to_vec()));
    }
    directives
}

/// Fields and directives feeding [`aggregate_period`].
pub fn period_query(period: Period, measure: Measure, years: &[i32], sports: &[String]) -> (Vec<Field>, Vec<Directive>) {
    let fields = vec![Field::Col(Column::Year), Field::Col(period.column()), measure.field()];
    let mut directives = base_filters(years, sports);
    directives.push(Directive::WithOrder(
        OrderConfig::new()
            .group(Field::Col(Column::Year))
            .group(Field::Col(period.column()))
            .order(Field::Col(Column::Year), Direction::Asc)
            .order(Field::Col(period.column()), Direction::Asc),
    ));
    (fields, directives)
}

/// Fields and directives feeding [`top`]: value desc, year desc, period desc.
pub fn top_query(
    period: Period,
    measure: Measure,
    years: &[i32],
    sports: &[String],
    limit: u32,
) -> (Vec<Field>, Vec<Directive>) {
    let fields = vec![Field::Col(Column::Year), Field::Col(period.column()), measure.field()];
    let mut directives = base_filters(years, sports);
    directives.push(Directive::WithOrder(
        OrderConfig::new()
            .group(Field::Col(Column::Year))
            .group(Field::Col(period.column()))
            .order(measure.field(), Direction::Desc)
            .order(Field::Col(Column::Year), Direction::Desc)
            .order(Field::Col(period.column()), Direction::Desc)
            .limit(limit),
    ));
    (fields, directives)
}

/// Fields and directives feeding [`best_efforts`] for the effort called `name`.
pub fn best_effort_query(name: &str, years: &[i32], sports: &[String], limit: u32) -> (Vec<Field>, Vec<Directive>) {
    let fields = vec![
        Field::Col(Column::Year),
        Field::Col(Column::Month),
        Field::Col(Column::Day),
        Field::Of(Table::Activities, Column::Name),
        Field::Of(Table::BestEfforts, Column::ElapsedTime),
        Field::Of(Table::BestEfforts, Column::Distance),
    ];
    let mut directives = vec![
        Directive::WithTable(Table::BestEfforts),
        Directive::WithTable(Table::Activities),
        Directive::WithName(name.to_string()),
    ];
    directives.extend(base_filters(years, sports));
    directives.push(Directive::WithOrder(
        OrderConfig::new()
            .order(Field::Of(Table::BestEfforts, Column::ElapsedTime), Direction::Asc)
            .order(Field::Col(Column::Year), Direction::Desc)
            .order(Field::Col(Column::Month), Direction::Desc)
            .order(Field::Col(Column::Day), Direction::Desc)
            .limit(limit),
    ));
    (fields, directives)
}
