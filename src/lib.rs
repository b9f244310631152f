//! # fitstat
//!
//! Activity statistics over a local SQLite store: totals per week or month,
//! best periods, fastest best efforts and year-over-year daily series.
//!
//! ## Features
//!
//! - **Query Builder**: composable, fully parameterized selects over a fixed
//!   vocabulary of tables and columns
//! - **Executor**: scans rows into typed records with cancellation
//! - **Period Aggregation**: per-year tables with blank-versus-zero cells
//! - **Day-of-Year Alignment**: dense per-year series with carry-forward or
//!   cumulative filling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fitstat::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
