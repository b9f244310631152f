//! `summary`: totals per week or month with one column per year.

use super::{open_db, FilterArgs};
use crate::db::executor::Executor;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::period::{aggregate_period, period_query, Measure, Period};
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_warning};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// week or month
    #[arg(short, long, default_value = "week")]
    pub period: Period,

    /// distance, elevation, time or count
    #[arg(short, long, default_value = "distance")]
    pub measure: Measure,

    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn cmd(db: Option<PathBuf>, args: SummaryArgs) -> Result<()> {
    let config = Config::read()?;
    let db = open_db(db)?;
    let years = &args.filters.years;
    let sports = args.filters.sports(&config);

    let (fields, directives) = period_query(args.period, args.measure, years, &sports);
    let measure_name = args.measure.field().measure_name();
    let table = Executor::new(&db.conn).build_and_scan(&fields, directives, |rows| {
        aggregate_period(rows, args.period, years, &measure_name)
    })?;

    if table.totals.is_empty() {
        msg_info!(Message::NoData);
        return Ok(());
    }

    msg_print!(
        Message::SummaryHeader(
            format!("{:?}", args.measure),
            format!("{:?}", args.period).to_lowercase()
        ),
        true
    );
    View::period_table(&table).printstd();

    let missing: Vec<i32> = table.years.iter().copied().filter(|y| !table.totals.contains_key(y)).collect();
    if !missing.is_empty() {
        msg_warning!(Message::YearsWithoutData(missing));
    }
    Ok(())
}
