//! `top`: best periods ranked across all selected years.

use super::{open_db, FilterArgs};
use crate::db::executor::Executor;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::period::{top, top_query, Measure, Period};
use crate::libs::view::View;
use crate::{msg_info, msg_print};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TopArgs {
    /// week or month
    #[arg(short, long, default_value = "week")]
    pub period: Period,

    /// distance, elevation, time or count
    #[arg(short, long, default_value = "distance")]
    pub measure: Measure,

    /// Rows to show; configured `top_limit` when omitted
    #[arg(short, long)]
    pub limit: Option<u32>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn cmd(db: Option<PathBuf>, args: TopArgs) -> Result<()> {
    let config = Config::read()?;
    let db = open_db(db)?;
    let limit = args.limit.unwrap_or(config.top_limit);
    let sports = args.filters.sports(&config);

    let (fields, directives) = top_query(args.period, args.measure, &args.filters.years, &sports, limit);
    let measure_name = args.measure.field().measure_name();
    let ranked = Executor::new(&db.conn)
        .build_and_scan(&fields, directives, |rows| top(rows, args.period, &measure_name))?;

    if ranked.is_empty() {
        msg_info!(Message::NoData);
        return Ok(());
    }

    msg_print!(Message::TopHeader(limit, format!("{:?}", args.period).to_lowercase()), true);
    View::ranking(&ranked).printstd();
    Ok(())
}
