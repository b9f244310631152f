//! `best`: fastest recorded efforts for a named distance.

use super::{open_db, FilterArgs};
use crate::db::executor::Executor;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::period::{best_effort_query, best_efforts};
use crate::libs::view::View;
use crate::{msg_info, msg_print};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct BestArgs {
    /// Effort name as recorded, e.g. "5k" or "Half-Marathon"
    #[arg(short, long)]
    pub name: String,

    /// Rows to show; configured `top_limit` when omitted
    #[arg(short, long)]
    pub limit: Option<u32>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

pub fn cmd(db: Option<PathBuf>, args: BestArgs) -> Result<()> {
    let config = Config::read()?;
    let db = open_db(db)?;
    let limit = args.limit.unwrap_or(config.top_limit);
    let sports = args.filters.sports(&config);

    let (fields, directives) = best_effort_query(&args.name, &args.filters.years, &sports, limit);
    let efforts = Executor::new(&db.conn).build_and_scan(&fields, directives, |rows| best_efforts(rows))?;

    if efforts.is_empty() {
        msg_info!(Message::NoData);
        return Ok(());
    }

    msg_print!(Message::BestEffortsHeader(args.name.clone()), true);
    View::best_efforts(&efforts).printstd();
    Ok(())
}
