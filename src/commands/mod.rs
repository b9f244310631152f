//! Command-line interface.
//!
//! Every report command opens the store once, builds its query from the
//! shared [`FilterArgs`] and prints a table.

pub mod best;
pub mod init;
pub mod migrations;
pub mod series;
pub mod summary;
pub mod top;

use crate::db::db::Db;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::msg_debug;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Totals per week or month, one column per year")]
    Summary(summary::SummaryArgs),
    #[command(about = "Best weeks or months across years")]
    Top(top::TopArgs),
    #[command(about = "Fastest best efforts over a named distance")]
    Best(best::BestArgs),
    #[command(about = "Day-of-year series compared across years")]
    Series(series::SeriesArgs),
    #[command(about = "Apply schema migrations, or show their status and history")]
    Migrate(migrations::MigrationsArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    /// Database file, overriding the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        let db = cli.db;
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Summary(args) => summary::cmd(db, args),
            Commands::Top(args) => top::cmd(db, args),
            Commands::Best(args) => best::cmd(db, args),
            Commands::Series(args) => series::cmd(db, args),
            Commands::Migrate(args) => migrations::cmd(db, args),
        }
    }
}

/// Year and sport filters shared by the report commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Years to include, e.g. `--years 2023,2024`; all years when omitted
    #[arg(short, long, value_delimiter = ',')]
    pub years: Vec<i32>,

    /// Activity types, e.g. `--sports Run,TrailRun`; configured defaults when omitted
    #[arg(short, long, alias = "sport", value_delimiter = ',')]
    pub sports: Vec<String>,
}

impl FilterArgs {
    pub fn sports(&self, config: &Config) -> Vec<String> {
        config.sports_or_default(&self.sports)
    }
}

/// Opens `path`, or the configured store when none is given.
pub fn open_db(path: Option<PathBuf>) -> Result<Db> {
    let db = match path {
        Some(path) => {
            msg_debug!(Message::DatabaseOpened(path.display().to_string()));
            Db::open(path)?
        }
        None => Db::new()?,
    };
    Ok(db)
}

/// Parses a `MM-DD` day-of-year cutoff.
pub fn parse_cutoff(value: &str) -> std::result::Result<(u32, u32), String> {
    let (month, day) = value
        .split_once('-')
        .ok_or_else(|| format!("expected MM-DD, got '{}'", value))?;
    let month: u32 = month.trim().parse().map_err(|_| format!("invalid month in '{}'", value))?;
    let day: u32 = day.trim().parse().map_err(|_| format!("invalid day in '{}'", value))?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(format!("'{}' is not a day of the year", value));
    }
    Ok((month, day))
}
