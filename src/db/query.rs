//! Parameterized query construction for activity and daily-metric tables.
//!
//! Turns a list of selected [`Field`]s and an ordered list of [`Directive`]s
//! into a [`BoundQuery`]: query text with positional `?` placeholders plus
//! the values to bind, in placeholder order.
//!
//! ## Safety
//!
//! Only identifiers from the closed [`Table`] / [`Column`] / [`Field`]
//! vocabularies are ever written into the text. Every value that reaches
//! the builder (sport names, years, labels, limits) becomes a bound
//! parameter.
//!
//! ## Composition
//!
//! - Repeating a filter kind widens it: two `WithSports` directives become a
//!   single `(Type = ? or Type = ? ...)` group.
//! - Different filter kinds are combined with `and`, in order of first
//!   appearance.
//! - Selecting a second table joins it on `ExternalID` and qualifies every
//!   column with the first selected table that owns it.
//!
//! ## Usage
//!
//! ```rust
//! use fitstat::db::query::{build, Column, Directive, Field};
//!
//! let bound = build(
//!     &[Field::Sum(Column::Distance), Field::Col(Column::Year)],
//!     vec![Directive::sports(["Run", "TrailRun"]), Directive::years([2023, 2024])],
//! )?;
//! assert_eq!(bound.params().len(), 4);
//! # Ok::<(), fitstat::libs::error::StatsError>(())
//! ```

use crate::libs::error::{Result, StatsError};
use rusqlite::types::{ToSql, ToSqlOutput};

/// Logical source tables of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// One row per activity, the fact table.
    Activities,
    /// Best efforts recorded inside an activity, keyed by `ExternalID`.
    BestEfforts,
    /// Resting heart rate sampled per day.
    HeartRate,
    /// Step count sampled per day.
    Steps,
}

const ACTIVITY_COLUMNS: &[Column] = &[
    Column::ExternalId,
    Column::Year,
    Column::Month,
    Column::Day,
    Column::Week,
    Column::Name,
    Column::Type,
    Column::WorkoutType,
    Column::Distance,
    Column::Elevation,
    Column::MovingTime,
];
const BEST_EFFORT_COLUMNS: &[Column] = &[
    Column::ExternalId,
    Column::Name,
    Column::ElapsedTime,
    Column::MovingTime,
    Column::Distance,
];
const DAILY_METRIC_COLUMNS: &[Column] = &[Column::Year, Column::Month, Column::Day, Column::Value];

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Activities => "activities",
            Table::BestEfforts => "best_efforts",
            Table::HeartRate => "heart_rate",
            Table::Steps => "steps",
        }
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Table::Activities => ACTIVITY_COLUMNS,
            Table::BestEfforts => BEST_EFFORT_COLUMNS,
            Table::HeartRate | Table::Steps => DAILY_METRIC_COLUMNS,
        }
    }

    pub fn owns(self, column: Column) -> bool {
        self.columns().contains(&column)
    }
}

/// Column vocabulary shared by all tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    ExternalId,
    Year,
    Month,
    Day,
    Week,
    Name,
    Type,
    WorkoutType,
    Distance,
    Elevation,
    MovingTime,
    ElapsedTime,
    Value,
}

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::ExternalId => "ExternalID",
            Column::Year => "Year",
            Column::Month => "Month",
            Column::Day => "Day",
            Column::Week => "Week",
            Column::Name => "Name",
            Column::Type => "Type",
            Column::WorkoutType => "WorkoutType",
            Column::Distance => "Distance",
            Column::Elevation => "Elevation",
            Column::MovingTime => "MovingTime",
            Column::ElapsedTime => "ElapsedTime",
            Column::Value => "Value",
        }
    }
}

/// A selectable expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Bare column, qualified automatically when tables are joined.
    Col(Column),
    /// Column pinned to a specific table.
    Of(Table, Column),
    Sum(Column),
    Max(Column),
    Min(Column),
    /// `count(*)`
    Count,
    /// Running total of `sum(column)` within each year, ordered by month and day.
    /// Needs a `group by Year, Month, Day`.
    RunningSum(Column),
}

impl Field {
    /// Unqualified lowercase rendering, used to decide unit conversion.
    pub fn measure_name(&self) -> String {
        let scope = Scope { tables: &[] };
        self.render_with(&scope, false).unwrap_or_default().to_lowercase()
    }

    fn render(&self, scope: &Scope) -> Result<String> {
        self.render_with(scope, true)
    }

    fn render_with(&self, scope: &Scope, check: bool) -> Result<String> {
        let col = |c: Column| if check { scope.qualify(c) } else { Ok(c.name().to_string()) };
        Ok(match self {
            Field::Col(c) => col(*c)?,
            Field::Of(table, c) => {
                if check {
                    scope.pinned(*table, *c)?
                } else {
                    c.name().to_string()
                }
            }
            Field::Sum(c) => format!("sum({})", col(*c)?),
            Field::Max(c) => format!("max({})", col(*c)?),
            Field::Min(c) => format!("min({})", col(*c)?),
            Field::Count => "count(*)".to_string(),
            Field::RunningSum(c) => format!(
                "sum(sum({})) over (partition by {} order by {}, {})",
                col(*c)?,
                col(Column::Year)?,
                col(Column::Month)?,
                col(Column::Day)?
            ),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Grouping, ordering and row limit of a query.
///
/// A `limit` of 0 means unbounded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderConfig {
    pub group_by: Vec<Field>,
    pub order_by: Vec<(Field, Direction)>,
    pub limit: u32,
}

impl OrderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, field: Field) -> Self {
        self.group_by.push(field);
        self
    }

    pub fn order(mut self, field: Field, direction: Direction) -> Self {
        self.order_by.push((field, direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    fn merge(&mut self, other: OrderConfig) {
        self.group_by.extend(other.group_by);
        self.order_by.extend(other.order_by);
        if other.limit > 0 {
            self.limit = other.limit;
        }
    }
}

/// One build-time instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    WithTable(Table),
    WithSports(Vec<String>),
    WithWorkouts(Vec<String>),
    WithYears(Vec<i32>),
    /// Keep rows up to and including `month`/`day` of each year.
    WithDayOfYear { day: u32, month: u32 },
    WithName(String),
    WithOrder(OrderConfig),
}

impl Directive {
    pub fn sports<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Directive::WithSports(values.into_iter().map(Into::into).collect())
    }

    pub fn workouts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Directive::WithWorkouts(values.into_iter().map(Into::into).collect())
    }

    pub fn years<I: IntoIterator<Item = i32>>(values: I) -> Self {
        Directive::WithYears(values.into_iter().collect())
    }
}

/// A bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Text(String),
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Param::Int(value) => Ok(ToSqlOutput::from(*value)),
            Param::Text(value) => Ok(ToSqlOutput::from(value.as_str())),
        }
    }
}

/// Query text plus the values for its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    text: String,
    params: Vec<Param>,
}

impl BoundQuery {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn placeholders(&self) -> usize {
        self.text.matches('?').count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKind {
    Sport,
    Workout,
    Year,
    DayOfYear,
    Name,
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Equals(Param),
    Cutoff { month: u32, day: u32 },
}

#[derive(Debug, Default)]
struct BuildConfig {
    tables: Vec<Table>,
    groups: Vec<(FilterKind, Vec<Clause>)>,
    order: OrderConfig,
}

impl BuildConfig {
    fn apply(&mut self, directive: Directive) -> Result<()> {
        match directive {
            Directive::WithTable(table) => {
                if !self.tables.contains(&table) {
                    self.tables.push(table);
                }
            }
            Directive::WithSports(values) => self.add_values(FilterKind::Sport, "sports", values)?,
            Directive::WithWorkouts(values) => self.add_values(FilterKind::Workout, "workouts", values)?,
            Directive::WithYears(years) => {
                if years.is_empty() {
                    return Err(StatsError::bad_options("empty year list"));
                }
                let clauses = years.into_iter().map(|y| Clause::Equals(Param::Int(y as i64))).collect();
                self.add(FilterKind::Year, clauses);
            }
            Directive::WithDayOfYear { day, month } => {
                if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
                    return Err(StatsError::bad_options(format!("invalid day-of-year cutoff {}-{}", month, day)));
                }
                self.add(FilterKind::DayOfYear, vec![Clause::Cutoff { month, day }]);
            }
            Directive::WithName(name) => self.add_values(FilterKind::Name, "name", vec![name])?,
            Directive::WithOrder(order) => self.order.merge(order),
        }
        Ok(())
    }

    fn add_values(&mut self, kind: FilterKind, what: &str, values: Vec<String>) -> Result<()> {
        if values.is_empty() {
            return Err(StatsError::bad_options(format!("empty {} list", what)));
        }
        self.add(kind, values.into_iter().map(|v| Clause::Equals(Param::Text(v))).collect());
        Ok(())
    }

    fn add(&mut self, kind: FilterKind, clauses: Vec<Clause>) {
        match self.groups.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, existing)) => existing.extend(clauses),
            None => self.groups.push((kind, clauses)),
        }
    }
}

struct Scope<'a> {
    tables: &'a [Table],
}

impl Scope<'_> {
    fn joined(&self) -> bool {
        self.tables.len() > 1
    }

    fn qualify(&self, column: Column) -> Result<String> {
        let owner = self.tables.iter().find(|t| t.owns(column)).ok_or_else(|| {
            StatsError::bad_options(format!("column {} is not available in the selected tables", column.name()))
        })?;
        Ok(self.render(*owner, column))
    }

    fn pinned(&self, table: Table, column: Column) -> Result<String> {
        if !self.tables.contains(&table) || !table.owns(column) {
            return Err(StatsError::bad_options(format!("{}.{} is not selected", table.name(), column.name())));
        }
        Ok(self.render(table, column))
    }

    fn render(&self, table: Table, column: Column) -> String {
        if self.joined() {
            format!("{}.{}", table.name(), column.name())
        } else {
            column.name().to_string()
        }
    }
}

/// Builds query text and parameters from fields and directives.
///
/// # Errors
///
/// Returns [`StatsError::BadOptions`] when no fields are given, when a
/// column is not owned by any selected table, when a selected table cannot
/// be joined on `ExternalID`, or when a filter carries no values.
pub fn build<I>(fields: &[Field], directives: I) -> Result<BoundQuery>
where
    I: IntoIterator<Item = Directive>,
{
    if fields.is_empty() {
        return Err(StatsError::bad_options("no fields to select"));
    }

    let mut config = BuildConfig::default();
    for directive in directives {
        config.apply(directive)?;
    }
    if config.tables.is_empty() {
        config.tables.push(Table::Activities);
    }

    let scope = Scope { tables: &config.tables };
    if scope.joined() {
        if let Some(table) = config.tables.iter().find(|t| !t.owns(Column::ExternalId)) {
            return Err(StatsError::bad_options(format!("table {} cannot be joined", table.name())));
        }
    }

    let mut params = Vec::new();
    let selected = fields.iter().map(|f| f.render(&scope)).collect::<Result<Vec<_>>>()?;
    let tables = config.tables.iter().map(|t| t.name()).collect::<Vec<_>>();
    let mut text = format!("select {} from {}", selected.join(", "), tables.join(", "));

    let mut conditions = Vec::new();
    let first = config.tables[0];
    for table in &config.tables[1..] {
        conditions.push(format!(
            "{}.{} = {}.{}",
            first.name(),
            Column::ExternalId.name(),
            table.name(),
            Column::ExternalId.name()
        ));
    }
    for (kind, clauses) in &config.groups {
        conditions.push(render_group(&scope, *kind, clauses, &mut params)?);
    }
    if !conditions.is_empty() {
        text.push_str(" where ");
        text.push_str(&conditions.join(" and "));
    }

    let order = &config.order;
    if !order.group_by.is_empty() {
        let group = order.group_by.iter().map(|f| f.render(&scope)).collect::<Result<Vec<_>>>()?;
        text.push_str(" group by ");
        text.push_str(&group.join(", "));
    }
    if !order.order_by.is_empty() {
        let ordering = order
            .order_by
            .iter()
            .map(|(f, d)| Ok(format!("{} {}", f.render(&scope)?, d.keyword())))
            .collect::<Result<Vec<_>>>()?;
        text.push_str(" order by ");
        text.push_str(&ordering.join(", "));
    }
    if order.limit > 0 {
        text.push_str(" limit ?");
        params.push(Param::Int(order.limit as i64));
    }

    Ok(BoundQuery { text, params })
}

fn render_group(scope: &Scope, kind: FilterKind, clauses: &[Clause], params: &mut Vec<Param>) -> Result<String> {
    let column = match kind {
        FilterKind::Sport => scope.qualify(Column::Type)?,
        FilterKind::Workout => scope.qualify(Column::WorkoutType)?,
        FilterKind::Year => scope.qualify(Column::Year)?,
        FilterKind::Name if scope.tables.contains(&Table::BestEfforts) => scope.pinned(Table::BestEfforts, Column::Name)?,
        FilterKind::Name => scope.qualify(Column::Name)?,
        FilterKind::DayOfYear => String::new(),
    };

    let mut parts = Vec::with_capacity(clauses.len());
    for clause in clauses {
        match clause {
            Clause::Equals(value) => {
                parts.push(format!("{} = ?", column));
                params.push(value.clone());
            }
            Clause::Cutoff { month, day } => {
                let m = scope.qualify(Column::Month)?;
                let d = scope.qualify(Column::Day)?;
                parts.push(format!("{m} < ? or ({m} = ? and {d} <= ?)"));
                params.extend([Param::Int(*month as i64), Param::Int(*month as i64), Param::Int(*day as i64)]);
            }
        }
    }
    Ok(format!("({})", parts.join(" or ")))
}
