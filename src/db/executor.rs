//! Runs bound queries and lends their rows to a consumer.
//!
//! The statement and its cursor live only for the duration of one
//! [`Executor::scan`] call. The consumer receives a [`Cursor`] of typed rows;
//! whatever path the consumer takes out (exhaustion, early return, error,
//! cancellation) the statement is finalized when `scan` returns.

use crate::db::query::{build, BoundQuery, Directive, Field};
use crate::libs::error::{Result, StatsError};
use rusqlite::{params_from_iter, Connection, Row, Rows};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Decodes one typed row from a result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

/// Shared flag used to abort a scan from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Forward-only iterator over typed rows.
///
/// Yields at most one error; after an error or cancellation it is exhausted.
pub struct Cursor<'a, R> {
    rows: Rows<'a>,
    query: &'a str,
    cancel: Option<&'a CancelFlag>,
    done: bool,
    _row: PhantomData<R>,
}

impl<R: FromRow> Iterator for Cursor<'_, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancel.is_some_and(CancelFlag::is_cancelled) {
            self.done = true;
            return Some(Err(StatsError::Cancelled));
        }

        let step = match self.rows.next() {
            Ok(Some(row)) => R::from_row(row).map_err(|e| StatsError::from_row_error(self.query, e)),
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(StatsError::query_failed(self.query, e)),
        };
        if step.is_err() {
            self.done = true;
        }
        Some(step)
    }
}

/// Submits bound queries over a borrowed connection.
pub struct Executor<'c> {
    conn: &'c Connection,
    cancel: Option<CancelFlag>,
}

impl<'c> Executor<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn, cancel: None }
    }

    /// Attaches a cancellation flag checked before every row.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs `bound` and hands the row cursor to `consume`.
    ///
    /// # Errors
    ///
    /// - [`StatsError::QueryFailed`] when the statement cannot be prepared or
    ///   executed. The message carries the query text, never the values.
    /// - Any error returned by `consume`, typically
    ///   [`StatsError::ScanMismatch`] or [`StatsError::Cancelled`] surfaced by
    ///   the cursor.
    pub fn scan<R, T, F>(&self, bound: &BoundQuery, consume: F) -> Result<T>
    where
        R: FromRow,
        F: FnOnce(&mut Cursor<'_, R>) -> Result<T>,
    {
        tracing::debug!(query = bound.text(), "running query");
        tracing::debug!(params = ?bound.params(), "binding parameters");

        let mut stmt = self
            .conn
            .prepare(bound.text())
            .map_err(|e| StatsError::query_failed(bound.text(), e))?;
        let rows = stmt
            .query(params_from_iter(bound.params()))
            .map_err(|e| StatsError::query_failed(bound.text(), e))?;

        let mut cursor = Cursor {
            rows,
            query: bound.text(),
            cancel: self.cancel.as_ref(),
            done: false,
            _row: PhantomData,
        };
        let result = consume(&mut cursor);
        if let Err(err) = &result {
            tracing::debug!(error = %err, "scan aborted");
        }
        result
    }

    /// Builds the query and scans it in one step.
    pub fn build_and_scan<R, T, I, F>(&self, fields: &[Field], directives: I, consume: F) -> Result<T>
    where
        R: FromRow,
        I: IntoIterator<Item = Directive>,
        F: FnOnce(&mut Cursor<'_, R>) -> Result<T>,
    {
        let bound = build(fields, directives)?;
        self.scan(&bound, consume)
    }

    /// Reads every row of `bound` into memory.
    pub fn collect<R: FromRow>(&self, bound: &BoundQuery) -> Result<Vec<R>> {
        self.scan(bound, |cursor| cursor.collect())
    }
}
