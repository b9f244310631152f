//! Day-of-year alignment of sparse daily rows into dense per-year series.
//!
//! Rows arrive as `(year, month, day, value)`, ordered by date. Each year
//! becomes a `Vec<f64>` whose index is the day of that year, so different
//! years can be compared index for index.
//!
//! ## Fill policies
//!
//! - [`FillPolicy::CarryForward`]: gauge metrics (resting heart rate, weight).
//!   Day 1 is January 1st. A missing day repeats the last known value and
//!   every year is padded at the tail to the length of the longest one.
//! - [`FillPolicy::CumulativeZero`]: running totals (distance so far this
//!   year). Day 0 is January 1st. A missing day repeats the running total,
//!   i.e. it adds nothing, and tails are left where the data stops.
//!
//! Day offsets are computed between local-time instants at a fixed
//! reference hour, so daylight-saving transitions cannot shift a date by
//! one. An offset past day 366 means the input is corrupt and aborts the
//! scan with [`StatsError::TimeAnomaly`].

use crate::db::executor::FromRow;
use crate::db::query::{Column, Direction, Directive, Field, OrderConfig, Table};
use crate::libs::error::{Result, StatsError};
use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone};
use rusqlite::Row;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Hour of day used for both ends of a day-offset computation.
pub const REFERENCE_HOUR: u32 = 12;

/// Largest day offset a valid row can produce.
pub const MAX_DAY_OFFSET: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    CarryForward,
    CumulativeZero,
}

impl FillPolicy {
    /// Day number of January 1st.
    pub fn first_day(self) -> i64 {
        match self {
            FillPolicy::CarryForward => 1,
            FillPolicy::CumulativeZero => 0,
        }
    }
}

/// `(year, month, day, value)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayRow {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub value: f64,
}

impl FromRow for DayRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(DayRow {
            year: row.get(0)?,
            month: row.get(1)?,
            day: row.get(2)?,
            value: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
        })
    }
}

/// Resolves `(year, month, day)` at the reference hour in local time.
///
/// Out-of-range months and days roll over into the following (or previous)
/// month, the way calendar arithmetic does, so corrupt rows surface as an
/// out-of-range offset rather than disappearing.
fn local_reference(year: i32, month: u32, day: u32) -> Option<DateTime<Local>> {
    let months = year as i64 * 12 + month as i64 - 1;
    let first = NaiveDate::from_ymd_opt(months.div_euclid(12) as i32, months.rem_euclid(12) as u32 + 1, 1)?;
    let date = first.checked_add_signed(TimeDelta::try_days(day as i64 - 1)?)?;
    let naive = date.and_hms_opt(REFERENCE_HOUR, 0, 0)?;
    let local = Local.from_local_datetime(&naive);
    local.earliest().or_else(|| local.latest())
}

/// Day number of `(year, month, day)` within `year` under `policy`.
///
/// # Errors
///
/// [`StatsError::TimeAnomaly`] when the date cannot be resolved or falls
/// outside `first_day..=366`.
pub fn day_offset(year: i32, month: u32, day: u32, policy: FillPolicy) -> Result<i64> {
    let anomaly = |offset| StatsError::TimeAnomaly { year, month, day, offset };
    let start = local_reference(year, 1, 1).ok_or_else(|| anomaly(-1))?;
    let at = local_reference(year, month, day).ok_or_else(|| anomaly(-1))?;

    // a DST shift between the two instants leaves the span an hour off a whole day
    let days = ((at - start).num_hours() as f64 / 24.0).round() as i64;
    let offset = days + policy.first_day();
    if offset < policy.first_day() || offset > MAX_DAY_OFFSET {
        return Err(anomaly(offset));
    }
    Ok(offset)
}

#[derive(Debug, Default)]
struct YearState {
    values: Vec<f64>,
    last: f64,
}

impl YearState {
    fn place(&mut self, index: usize, value: f64) {
        if index < self.values.len() {
            self.values[index] = value;
            if index + 1 == self.values.len() {
                self.last = value;
            }
            return;
        }
        while self.values.len() < index {
            self.values.push(self.last);
        }
        self.values.push(value);
        self.last = value;
    }
}

/// Dense per-year series keyed by year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedSeries {
    series: BTreeMap<i32, Vec<f64>>,
}

impl AlignedSeries {
    pub fn get(&self, year: i32) -> Option<&[f64]> {
        self.series.get(&year).map(Vec::as_slice)
    }

    pub fn years(&self) -> Vec<i32> {
        self.series.keys().copied().collect()
    }

    /// Requested years that actually produced data, in request order.
    pub fn present(&self, requested: &[i32]) -> Vec<i32> {
        requested.iter().copied().filter(|y| self.series.contains_key(y)).collect()
    }

    pub fn max_len(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &[f64])> {
        self.series.iter().map(|(y, v)| (*y, v.as_slice()))
    }

    /// Multiplies every sample by `factor`.
    pub fn scale(mut self, factor: f64) -> Self {
        for values in self.series.values_mut() {
            values.iter_mut().for_each(|v| *v *= factor);
        }
        self
    }

    pub fn into_inner(self) -> BTreeMap<i32, Vec<f64>> {
        self.series
    }
}

/// Aligns rows into one dense series per year.
///
/// Only years in `years` are kept (all years when empty); years without any
/// row are absent from the result, use [`AlignedSeries::present`] to find
/// out which of the requested ones made it.
///
/// # Errors
///
/// Stops at the first row error or [`StatsError::TimeAnomaly`]; nothing
/// partial is returned.
pub fn align<I>(rows: I, years: &[i32], policy: FillPolicy) -> Result<AlignedSeries>
where
    I: IntoIterator<Item = Result<DayRow>>,
{
    let mut state: BTreeMap<i32, YearState> = BTreeMap::new();
    for row in rows {
        let row = row?;
        if !years.is_empty() && !years.contains(&row.year) {
            continue;
        }
        let offset = day_offset(row.year, row.month, row.day, policy)?;
        let index = (offset - policy.first_day()) as usize;
        state.entry(row.year).or_default().place(index, row.value);
    }

    let mut series: BTreeMap<i32, Vec<f64>> = state.into_iter().map(|(y, s)| (y, s.values)).collect();
    if policy == FillPolicy::CarryForward {
        let longest = series.values().map(Vec::len).max().unwrap_or(0);
        for values in series.values_mut() {
            let last = values.last().copied().unwrap_or(0.0);
            values.resize(longest, last);
        }
    }
    Ok(AlignedSeries { series })
}

/// Trailing moving average over `window` samples.
///
/// The first samples of each year average over what is available.
pub fn smooth(series: &AlignedSeries, window: usize) -> AlignedSeries {
    let window = window.max(1);
    let smoothed = series
        .series
        .iter()
        .map(|(year, values)| {
            let averaged = (0..values.len())
                .map(|i| {
                    let from = (i + 1).saturating_sub(window);
                    let slice = &values[from..=i];
                    slice.iter().sum::<f64>() / slice.len() as f64
                })
                .collect();
            (*year, averaged)
        })
        .collect();
    AlignedSeries { series: smoothed }
}

/// Daily series available for year-over-year charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesMetric {
    Distance,
    Elevation,
    HeartRate,
    Steps,
}

impl SeriesMetric {
    pub fn policy(self) -> FillPolicy {
        match self {
            SeriesMetric::HeartRate => FillPolicy::CarryForward,
            SeriesMetric::Distance | SeriesMetric::Elevation | SeriesMetric::Steps => FillPolicy::CumulativeZero,
        }
    }

    /// Factor turning stored units into displayed ones.
    pub fn scale(self) -> f64 {
        match self {
            SeriesMetric::Distance => 1.0 / 1000.0,
            _ => 1.0,
        }
    }
}

impl FromStr for SeriesMetric {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "distance" => Ok(SeriesMetric::Distance),
            "elevation" => Ok(SeriesMetric::Elevation),
            "heart-rate" | "heartrate" | "hr" => Ok(SeriesMetric::HeartRate),
            "steps" => Ok(SeriesMetric::Steps),
            other => Err(StatsError::bad_options(format!("unknown series metric '{}'", other))),
        }
    }
}

/// Fields and directives feeding [`align`] for `metric`.
///
/// `until` is an inclusive `(month, day)` cutoff applied to every year.
/// Sport filters only apply to activity metrics.
pub fn series_query(
    metric: SeriesMetric,
    years: &[i32],
    sports: &[String],
    until: Option<(u32, u32)>,
) -> (Vec<Field>, Vec<Directive>) {
    let (table, value) = match metric {
        SeriesMetric::Distance => (Table::Activities, Field::RunningSum(Column::Distance)),
        SeriesMetric::Elevation => (Table::Activities, Field::RunningSum(Column::Elevation)),
        SeriesMetric::HeartRate => (Table::HeartRate, Field::Col(Column::Value)),
        SeriesMetric::Steps => (Table::Steps, Field::RunningSum(Column::Value)),
    };
    let fields = vec![
        Field::Col(Column::Year),
        Field::Col(Column::Month),
        Field::Col(Column::Day),
        value,
    ];

    let mut directives = vec![Directive::WithTable(table)];
    if table == Table::Activities && !sports.is_empty() {
        directives.push(Directive::WithSports(sports.to_vec()));
    }
    if !years.is_empty() {
        directives.push(Directive::WithYears(years.to_vec()));
    }
    if let Some((month, day)) = until {
        directives.push(Directive::WithDayOfYear { day, month });
    }

    let mut order = OrderConfig::new();
    if metric.policy() == FillPolicy::CumulativeZero {
        order = order
            .group(Field::Col(Column::Year))
            .group(Field::Col(Column::Month))
            .group(Field::Col(Column::Day));
    }
    order = order
        .order(Field::Col(Column::Year), Direction::Asc)
        .order(Field::Col(Column::Month), Direction::Asc)
        .order(Field::Col(Column::Day), Direction::Asc);
    directives.push(Directive::WithOrder(order));

    (fields, directives)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(data: &[(i32, u32, u32, f64)]) -> Vec<Result<DayRow>> {
        data.iter()
            .map(|&(year, month, day, value)| Ok(DayRow { year, month, day, value }))
            .collect()
    }

    #[test]
    fn test_carry_forward_backfills_gaps() {
        let series = align(rows(&[(2024, 1, 1, 10.0), (2024, 1, 4, 12.0)]), &[2024], FillPolicy::CarryForward).unwrap();
        assert_eq!(series.get(2024).unwrap(), &[10.0, 10.0, 10.0, 12.0]);
    }

    #[test]
    fn test_carry_forward_pads_tails_to_longest_year() {
        let data = rows(&[(2023, 1, 2, 50.0), (2023, 1, 5, 52.0), (2024, 1, 1, 48.0), (2024, 1, 2, 49.0)]);
        let series = align(data, &[2023, 2024], FillPolicy::CarryForward).unwrap();
        assert_eq!(series.get(2023).unwrap(), &[0.0, 50.0, 50.0, 50.0, 52.0]);
        assert_eq!(series.get(2024).unwrap(), &[48.0, 49.0, 49.0, 49.0, 49.0]);
    }

    #[test]
    fn test_cumulative_zero_holds_running_total() {
        let data = rows(&[(2023, 1, 1, 5.0), (2023, 1, 3, 9.0), (2024, 1, 2, 4.0)]);
        let series = align(data, &[], FillPolicy::CumulativeZero).unwrap();
        assert_eq!(series.get(2023).unwrap(), &[5.0, 5.0, 9.0]);
        // tails are not extended
        assert_eq!(series.get(2024).unwrap(), &[0.0, 4.0]);
    }

    #[test]
    fn test_leap_day_offsets() {
        assert_eq!(day_offset(2024, 12, 31, FillPolicy::CarryForward).unwrap(), 366);
        assert_eq!(day_offset(2024, 12, 31, FillPolicy::CumulativeZero).unwrap(), 365);
        assert_eq!(day_offset(2023, 3, 1, FillPolicy::CumulativeZero).unwrap(), 59);
        assert_eq!(day_offset(2024, 3, 1, FillPolicy::CumulativeZero).unwrap(), 60);
    }

    #[test]
    fn test_offset_past_year_end_is_an_anomaly() {
        let err = align(rows(&[(2023, 12, 40, 1.0)]), &[], FillPolicy::CarryForward).unwrap_err();
        assert!(matches!(err, StatsError::TimeAnomaly { offset, .. } if offset > MAX_DAY_OFFSET));
    }

    #[test]
    fn test_years_without_rows_are_dropped() {
        let series = align(rows(&[(2022, 6, 1, 1.0), (2024, 6, 1, 2.0)]), &[2022, 2023], FillPolicy::CarryForward).unwrap();
        assert_eq!(series.years(), vec![2022]);
        assert_eq!(series.present(&[2023, 2022]), vec![2022]);
    }

    #[test]
    fn test_repeated_day_overwrites() {
        let series = align(rows(&[(2024, 1, 1, 1.0), (2024, 1, 2, 2.0), (2024, 1, 2, 3.0)]), &[], FillPolicy::CarryForward).unwrap();
        assert_eq!(series.get(2024).unwrap(), &[1.0, 3.0]);
    }

    #[test]
    fn test_smooth_trailing_window() {
        let series = align(rows(&[(2024, 1, 1, 2.0), (2024, 1, 2, 4.0), (2024, 1, 3, 6.0)]), &[], FillPolicy::CarryForward).unwrap();
        let smoothed = smooth(&series, 2);
        assert_eq!(smoothed.get(2024).unwrap(), &[2.0, 3.0, 5.0]);
        assert_eq!(smooth(&series, 1), series);
    }

    #[test]
    fn test_series_query_shapes() {
        let (fields, directives) = series_query(SeriesMetric::HeartRate, &[2024], &["Run".to_string()], Some((6, 30)));
        let bound = crate::db::query::build(&fields, directives).unwrap();
        assert_eq!(
            bound.text(),
            "select Year, Month, Day, Value from heart_rate where (Year = ?) \
             and (Month < ? or (Month = ? and Day <= ?)) order by Year asc, Month asc, Day asc"
        );
    }
}
