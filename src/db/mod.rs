//! Database layer for fitstat.
//!
//! A SQLite store of activities, their best efforts and daily measurements,
//! plus the query builder and executor every report goes through.
//!
//! ## Modules
//!
//! - [`db`]: connection handles, owned and shared
//! - [`migrations`]: versioned schema
//! - [`records`]: transactional bulk insert
//! - [`query`]: parameterized query construction
//! - [`executor`]: scans bound queries into typed rows
//!
//! ## Usage
//!
//! ```rust
//! use fitstat::db::db::Db;
//! use fitstat::db::executor::Executor;
//! use fitstat::libs::period::{aggregate_period, period_query, Measure, Period};
//!
//! let db = Db::in_memory()?;
//! let (fields, directives) = period_query(Period::Month, Measure::Distance, &[2024], &[]);
//! let table = Executor::new(&db.conn).build_and_scan(&fields, directives, |rows| {
//!     aggregate_period(rows, Period::Month, &[2024], &Measure::Distance.field().measure_name())
//! })?;
//! assert_eq!(table.buckets.len(), 12);
//! # Ok::<(), fitstat::libs::error::StatsError>(())
//! ```

#[allow(clippy::module_inception)]
pub mod db;
pub mod executor;
pub mod migrations;
pub mod query;
pub mod records;
