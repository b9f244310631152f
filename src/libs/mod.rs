//! Core library modules for fitstat.
//!
//! ## Features
//!
//! - **Aggregation**: period tables, rankings and best efforts ([`period`])
//! - **Alignment**: day-of-year series across years ([`align`])
//! - **Core Infrastructure**: configuration, data storage, errors, messaging
//! - **User Interface**: console tables and CSV output ([`view`])

pub mod align;
pub mod config;
pub mod data_storage;
pub mod error;
pub mod messages;
pub mod period;
pub mod view;
