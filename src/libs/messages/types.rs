#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigWizard,
    PromptDatabasePath,
    PromptDefaultSports,
    PromptSmoothingWindow,
    PromptTopLimit,

    // === STORE MESSAGES ===
    DatabaseOpened(String), // path

    // === REPORT MESSAGES ===
    SummaryHeader(String, String), // measure, period
    TopHeader(u32, String),        // limit, period
    BestEffortsHeader(String),     // effort name
    SeriesHeader(String),          // metric
    NoData,
    YearsWithoutData(Vec<i32>),
    SeriesExported(String), // path

    // === MIGRATION MESSAGES ===
    MigrationsFound(usize),        // count
    RunningMigration(u32, String), // version, name
    MigrationFailed(u32, String),  // version, error
    AllMigrationsCompleted,
    DatabaseVersion(u32),
    DatabaseUpToDate,
    DatabaseNeedsUpdate,
    MigrationHistory,
}
