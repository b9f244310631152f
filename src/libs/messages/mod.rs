//! User-facing messages and the macros that print them.
//!
//! Output goes to stdout/stderr normally and through `tracing` when
//! `FITSTAT_DEBUG` or `RUST_LOG` is set.

pub mod display;
pub mod macros;
pub mod types;

pub use types::Message;
