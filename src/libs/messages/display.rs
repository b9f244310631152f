//! Display implementation for fitstat messages.
//!
//! All user-facing text lives here so commands only pick a [`Message`]
//! variant and its parameters.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

fn join_years(years: &[i32]) -> String {
    years.iter().map(|y| y.to_string()).collect::<Vec<_>>().join(", ")
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed".to_string(),
            Message::ConfigWizard => "fitstat configuration".to_string(),
            Message::PromptDatabasePath => "Database path (empty for the default location)".to_string(),
            Message::PromptDefaultSports => "Default sports, comma separated (empty for all)".to_string(),
            Message::PromptSmoothingWindow => "Smoothing window in days".to_string(),
            Message::PromptTopLimit => "Rows shown by top and best".to_string(),

            // === STORE MESSAGES ===
            Message::DatabaseOpened(path) => format!("Using database {}", path),

            // === REPORT MESSAGES ===
            Message::SummaryHeader(measure, period) => format!("{} per {}", measure, period),
            Message::TopHeader(limit, period) => format!("Top {} {}s", limit, period),
            Message::BestEffortsHeader(name) => format!("Best efforts: {}", name),
            Message::SeriesHeader(metric) => format!("Year over year: {}", metric),
            Message::NoData => "No activities match the given filters".to_string(),
            Message::YearsWithoutData(years) => format!("No data for {}", join_years(years)),
            Message::SeriesExported(path) => format!("Series written to {}", path),

            // === MIGRATION MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All database migrations completed successfully".to_string(),
            Message::DatabaseVersion(version) => format!("Current database version: {}", version),
            Message::DatabaseUpToDate => "Database schema is up to date".to_string(),
            Message::DatabaseNeedsUpdate => "Database schema needs to be updated".to_string(),
            Message::MigrationHistory => "Migration history:".to_string(),
        };
        write!(f, "{}", s)
    }
}
