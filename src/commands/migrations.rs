//! `migrate`: schema migrations for the store.

use crate::db::db::{Db, DB_FILE_NAME};
use crate::db::migrations::{get_db_version, needs_migration, MigrationManager};
use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::{msg_info, msg_print, msg_success};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct MigrationsArgs {
    /// Defaults to `run`
    #[command(subcommand)]
    command: Option<MigrationsCommand>,
}

#[derive(Debug, Subcommand)]
enum MigrationsCommand {
    /// Show current database version
    Status,
    /// Show migration history
    History,
    /// Apply pending migrations
    Run,
}

pub fn cmd(db: Option<PathBuf>, args: MigrationsArgs) -> Result<()> {
    let path = match db {
        Some(path) => path,
        None => match Config::read()?.database {
            Some(path) => path,
            None => DataStorage::new().get_path(DB_FILE_NAME)?,
        },
    };
    let mut conn = Db::new_without_migrations(&path)?;
    let manager = MigrationManager::new();

    match args.command.unwrap_or(MigrationsCommand::Run) {
        MigrationsCommand::Status => {
            let version = get_db_version(&conn)?;
            msg_print!(Message::DatabaseVersion(version));
            if needs_migration(&conn)? {
                msg_info!(Message::DatabaseNeedsUpdate);
            } else {
                msg_info!(Message::DatabaseUpToDate);
            }
        }
        MigrationsCommand::History => {
            msg_print!(Message::MigrationHistory, true);
            for (version, name, applied_at) in manager.get_migration_history(&conn)? {
                println!("  v{}: {} (applied: {})", version, name, applied_at);
            }
        }
        MigrationsCommand::Run => {
            manager.run_migrations(&mut conn)?;
            msg_success!(Message::DatabaseVersion(get_db_version(&conn)?));
        }
    }

    Ok(())
}
