//! Console tables and CSV output for reports.
//!
//! Periods without activity render as [`BLANK`] so they stay distinct from
//! a measured zero.

use super::align::AlignedSeries;
use super::period::{BestEffort, Period, PeriodTable, RankedEntry};
use anyhow::Result;
use prettytable::{row, Cell, Row, Table};
use std::io::Write;

/// Rendering of a period without any activity.
pub const BLANK: &str = " ";

pub struct View {}

impl View {
    /// One row per period, one column per year, totals last.
    pub fn period_table(table: &PeriodTable) -> Table {
        let mut out = Table::new();

        let mut header = vec![Cell::new(match table.period {
            Period::Week => "WEEK",
            Period::Month => "MONTH",
        })];
        header.extend(table.years.iter().map(|y| Cell::new(&y.to_string())));
        out.add_row(Row::new(header));

        for (i, bucket) in table.buckets.iter().enumerate() {
            let mut cells = vec![Cell::new(&(i + 1).to_string())];
            cells.extend(bucket.iter().map(|v| Cell::new(&format_value(*v))));
            out.add_row(Row::new(cells));
        }

        let mut totals = vec![Cell::new("TOTAL")];
        totals.extend(table.years.iter().map(|y| Cell::new(&format_value(table.totals.get(y).copied()))));
        out.add_row(Row::new(totals));
        out
    }

    pub fn ranking(entries: &[RankedEntry]) -> Table {
        let mut out = Table::new();
        out.add_row(row!["#", "PERIOD", "VALUE"]);
        for entry in entries {
            out.add_row(row![entry.rank, entry.label(), format!("{:.2}", entry.value)]);
        }
        out
    }

    pub fn best_efforts(efforts: &[BestEffort]) -> Table {
        let mut out = Table::new();
        out.add_row(row!["#", "DATE", "ACTIVITY", "TIME", "PACE /KM"]);
        for (i, effort) in efforts.iter().enumerate() {
            let pace = if effort.distance > 0.0 {
                format_seconds((effort.elapsed_time as f64 / effort.distance).round() as i64)
            } else {
                BLANK.to_string()
            };
            out.add_row(row![
                i + 1,
                effort.date.format("%Y-%m-%d"),
                effort.activity,
                format_seconds(effort.elapsed_time),
                pace
            ]);
        }
        out
    }

    /// Day number in the first column, one column per year.
    ///
    /// Days past the end of a shorter year are left blank.
    pub fn series(series: &AlignedSeries, first_day: i64) -> Table {
        let mut out = Table::new();
        let mut header = vec![Cell::new("DAY")];
        header.extend(series.years().iter().map(|y| Cell::new(&y.to_string())));
        out.add_row(Row::new(header));

        for i in 0..series.max_len() {
            let mut cells = vec![Cell::new(&(i as i64 + first_day).to_string())];
            cells.extend(series.iter().map(|(_, values)| Cell::new(&format_value(values.get(i).copied()))));
            out.add_row(Row::new(cells));
        }
        out
    }

    /// Writes the same layout as [`View::series`] as CSV.
    pub fn series_csv<W: Write>(series: &AlignedSeries, first_day: i64, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = vec!["day".to_string()];
        header.extend(series.years().iter().map(|y| y.to_string()));
        csv.write_record(&header)?;

        for i in 0..series.max_len() {
            let mut record = vec![(i as i64 + first_day).to_string()];
            record.extend(series.iter().map(|(_, values)| values.get(i).map(|v| v.to_string()).unwrap_or_default()));
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => BLANK.to_string(),
    }
}

/// `h:mm:ss`, or `m:ss` under an hour.
pub fn format_seconds(seconds: i64) -> String {
    let (h, m, s) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::align::{align, DayRow, FillPolicy};
    use crate::libs::period::{aggregate_period, PeriodRow};

    fn content(table: &Table, row: usize, cell: usize) -> String {
        table.get_row(row).unwrap().get_cell(cell).unwrap().get_content()
    }

    #[test]
    fn test_period_table_blank_and_zero() {
        let rows = vec![Ok(PeriodRow { year: 2023, period: 1, value: 0.0 })];
        let table = aggregate_period(rows, Period::Month, &[2023, 2024], "count(*)").unwrap();
        let rendered = View::period_table(&table);

        assert_eq!(content(&rendered, 0, 1), "2023");
        assert_eq!(content(&rendered, 1, 1), "0.00");
        assert_eq!(content(&rendered, 1, 2), BLANK);
        assert_eq!(content(&rendered, 13, 0), "TOTAL");
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(1250), "20:50");
        assert_eq!(format_seconds(3725), "1:02:05");
    }

    #[test]
    fn test_series_csv_leaves_short_years_blank() {
        let rows = vec![
            Ok(DayRow { year: 2023, month: 1, day: 1, value: 1.0 }),
            Ok(DayRow { year: 2023, month: 1, day: 2, value: 2.5 }),
            Ok(DayRow { year: 2024, month: 1, day: 1, value: 3.0 }),
        ];
        let series = align(rows, &[], FillPolicy::CumulativeZero).unwrap();

        let mut out = Vec::new();
        View::series_csv(&series, 0, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "day,2023,2024\n0,1,3\n1,2.5,\n");
    }
}
