use crate::db::migrations::init_with_migrations;
use crate::libs::config::Config;
use crate::libs::data_storage::DataStorage;
use crate::libs::error::{Result, StatsError};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

pub const DB_FILE_NAME: &str = "fitstat.db";

/// Owned store handle with the schema brought up to date.
pub struct Db {
    pub conn: Connection,
}

impl Db {
    /// Opens the database configured in `config.json`, or the default file in
    /// the data directory.
    pub fn new() -> Result<Db> {
        let config = Config::read()?;
        let path = match config.database {
            Some(path) => path,
            None => DataStorage::new().get_path(DB_FILE_NAME)?,
        };
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Db> {
        let mut conn = Connection::open(path)?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    pub fn in_memory() -> Result<Db> {
        let mut conn = Connection::open_in_memory()?;
        init_with_migrations(&mut conn)?;
        Ok(Db { conn })
    }

    pub fn new_without_migrations<P: AsRef<Path>>(path: P) -> Result<Connection> {
        Connection::open(path).map_err(StatsError::from)
    }

    pub fn into_shared(self) -> SharedDb {
        SharedDb {
            conn: Arc::new(Mutex::new(self.conn)),
        }
    }
}

/// Long-lived handle shared between concurrent callers.
///
/// Each call holds the lock for its whole build/scan so cursors never
/// interleave on the connection.
#[derive(Clone)]
pub struct SharedDb {
    conn: Arc<Mutex<Connection>>,
}

impl SharedDb {
    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn_guard = self.conn.lock();
        f(&conn_guard)
    }
}
