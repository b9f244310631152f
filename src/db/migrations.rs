//! Versioned schema migrations for the activity store.
//!
//! The query vocabulary in [`crate::db::query`] is a fixed contract with the
//! tables created here: one fact table of activities, the best efforts
//! recorded inside them, and one table per sampled daily measurement.
//!
//! ## Usage
//!
//! ```rust
//! use fitstat::db::migrations::{get_db_version, init_with_migrations};
//! use rusqlite::Connection;
//!
//! let mut conn = Connection::open_in_memory()?;
//! init_with_migrations(&mut conn)?;
//! assert!(get_db_version(&conn)? > 0);
//! # Ok::<(), fitstat::libs::error::StatsError>(())
//! ```

use crate::libs::error::Result;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_error};
use rusqlite::{params, Connection, Transaction};

/// SQL schema for the migrations tracking table.
const MIGRATIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS migrations (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL,
    applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// A single schema change applied inside the migration transaction.
#[derive(Debug, Clone)]
struct Migration {
    /// Unique version number for ordering and tracking
    version: u32,
    /// Human-readable name describing the change
    name: &'static str,
    up: fn(&Transaction) -> Result<()>,
}

/// Registry of all migrations, in version order.
pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationManager {
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    fn register_migrations(&mut self) {
        // Version 1: activity fact table and the best efforts recorded per activity
        self.add_migration(1, "create_activity_tables", |tx| {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS activities (
                    ExternalID INTEGER NOT NULL PRIMARY KEY,
                    Year INTEGER NOT NULL,
                    Month INTEGER NOT NULL,
                    Day INTEGER NOT NULL,
                    Week INTEGER NOT NULL,
                    Name TEXT NOT NULL,
                    Type TEXT NOT NULL,
                    WorkoutType TEXT,
                    Distance REAL NOT NULL DEFAULT 0,
                    Elevation REAL NOT NULL DEFAULT 0,
                    MovingTime INTEGER NOT NULL DEFAULT 0
                )",
                [],
            )?;
            tx.execute(
                "CREATE TABLE IF NOT EXISTS best_efforts (
                    id INTEGER PRIMARY KEY,
                    ExternalID INTEGER NOT NULL,
                    Name TEXT NOT NULL,
                    ElapsedTime INTEGER NOT NULL,
                    MovingTime INTEGER NOT NULL,
                    Distance REAL NOT NULL,
                    FOREIGN KEY (ExternalID) REFERENCES activities(ExternalID) ON DELETE CASCADE
                )",
                [],
            )?;

            // Calendar lookups drive every period and series query
            tx.execute("CREATE INDEX IF NOT EXISTS idx_activities_date ON activities(Year, Month, Day)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_activities_type ON activities(Type)", [])?;
            tx.execute("CREATE INDEX IF NOT EXISTS idx_best_efforts_activity ON best_efforts(ExternalID)", [])?;
            Ok(())
        });

        // Version 2: one table per sampled daily measurement
        self.add_migration(2, "add_daily_metrics", |tx| {
            for table in ["heart_rate", "steps"] {
                tx.execute(
                    &format!(
                        "CREATE TABLE IF NOT EXISTS {} (
                            Year INTEGER NOT NULL,
                            Month INTEGER NOT NULL,
                            Day INTEGER NOT NULL,
                            Value REAL NOT NULL,
                            PRIMARY KEY (Year, Month, Day)
                        )",
                        table
                    ),
                    [],
                )?;
            }
            Ok(())
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: fn(&Transaction) -> Result<()>) {
        self.migrations.push(Migration { version, name, up });
    }

    /// Applies every pending migration in a single transaction.
    ///
    /// Safe to call on every start: already applied versions are skipped.
    pub fn run_migrations(&self, conn: &mut Connection) -> Result<()> {
        conn.execute(MIGRATIONS_TABLE, [])?;

        let current_version = self.get_current_version(conn)?;
        let pending: Vec<&Migration> = self.migrations.iter().filter(|m| m.version > current_version).collect();
        if pending.is_empty() {
            msg_debug!("Database is up to date");
            return Ok(());
        }

        msg_debug!(Message::MigrationsFound(pending.len()));
        let tx = conn.transaction()?;
        for migration in pending {
            msg_debug!(Message::RunningMigration(migration.version, migration.name.to_string()));
            if let Err(e) = (migration.up)(&tx) {
                msg_error!(Message::MigrationFailed(migration.version, e.to_string()));
                return Err(e);
            }
            tx.execute(
                "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
                params![migration.version, migration.name],
            )?;
        }
        tx.commit()?;
        msg_debug!(Message::AllMigrationsCompleted);

        Ok(())
    }

    fn get_current_version(&self, conn: &Connection) -> Result<u32> {
        conn.execute(MIGRATIONS_TABLE, [])?;
        let version: Option<u32> = conn.query_row("SELECT MAX(version) FROM migrations", [], |row| row.get(0))?;
        Ok(version.unwrap_or(0))
    }

    pub fn latest_version(&self) -> u32 {
        self.migrations.last().map(|m| m.version).unwrap_or(0)
    }

    /// Applied migrations as `(version, name, applied_at)`.
    pub fn get_migration_history(&self, conn: &Connection) -> Result<Vec<(u32, String, String)>> {
        conn.execute(MIGRATIONS_TABLE, [])?;
        let mut stmt = conn.prepare("SELECT version, name, applied_at FROM migrations ORDER BY version")?;
        let history = stmt
            .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(history)
    }
}

/// Brings a connection's schema up to date.
pub fn init_with_migrations(conn: &mut Connection) -> Result<()> {
    MigrationManager::new().run_migrations(conn)
}

pub fn get_db_version(conn: &Connection) -> Result<u32> {
    MigrationManager::new().get_current_version(conn)
}

pub fn needs_migration(conn: &Connection) -> Result<bool> {
    let manager = MigrationManager::new();
    Ok(manager.get_current_version(conn)? < manager.latest_version())
}
