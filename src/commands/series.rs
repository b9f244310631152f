//! `series`: day-of-year comparison of a metric across years.
//!
//! Prints a table by default, or writes CSV to stdout or `--output`.

use super::{open_db, parse_cutoff, FilterArgs};
use crate::db::executor::Executor;
use crate::libs::align::{align, series_query, smooth, SeriesMetric};
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_success, msg_warning};
use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// distance, elevation, heart-rate or steps
    #[arg(short, long, default_value = "distance")]
    pub metric: SeriesMetric,

    /// Last day of each year to include, as MM-DD
    #[arg(short, long, value_parser = parse_cutoff)]
    pub until: Option<(u32, u32)>,

    /// Apply a trailing moving average over the configured window
    #[arg(long)]
    pub smooth: bool,

    /// Moving average window in days; implies `--smooth`
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Print CSV instead of a table
    #[arg(long)]
    pub csv: bool,

    /// Write the CSV to a file instead of stdout
    #[arg(short, long, requires = "csv")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn cmd(db: Option<PathBuf>, args: SeriesArgs) -> Result<()> {
    let config = Config::read()?;
    let db = open_db(db)?;
    let years = &args.filters.years;
    let sports = args.filters.sports(&config);
    let policy = args.metric.policy();

    let (fields, directives) = series_query(args.metric, years, &sports, args.until);
    let mut series = Executor::new(&db.conn)
        .build_and_scan(&fields, directives, |rows| align(rows, years, policy))?
        .scale(args.metric.scale());

    if series.is_empty() {
        msg_info!(Message::NoData);
        return Ok(());
    }
    let present = series.present(years);
    let missing: Vec<i32> = years.iter().copied().filter(|y| !present.contains(y)).collect();
    if !missing.is_empty() {
        msg_warning!(Message::YearsWithoutData(missing));
    }

    if args.smooth || args.window.is_some() {
        series = smooth(&series, args.window.unwrap_or(config.smoothing_window));
    }

    if !args.csv {
        msg_print!(Message::SeriesHeader(format!("{:?}", args.metric)), true);
        View::series(&series, policy.first_day()).printstd();
        return Ok(());
    }
    match args.output {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
            View::series_csv(&series, policy.first_day(), file)?;
            msg_success!(Message::SeriesExported(path.display().to_string()));
        }
        None => View::series_csv(&series, policy.first_day(), std::io::stdout().lock())?,
    }
    Ok(())
}
