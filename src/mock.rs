//! In-memory query handle for testing fetchers without a server.
//!
//! `MockHandle` answers `SHOW server_version` with a fixed string and
//! serves registered rows for every query that reads from a registered
//! relation. Queries against unregistered relations fail the way a server
//! fails on an unknown view, and every executed statement is recorded.

use chrono::{DateTime, Utc};

use crate::error::{PgStatsError, Result};
use crate::handle::{QueryHandle, StatRow};

/// One mocked column value.
#[derive(Debug, Clone, PartialEq)]
pub enum MockValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl From<bool> for MockValue {
    fn from(v: bool) -> Self {
        MockValue::Bool(v)
    }
}

impl From<i64> for MockValue {
    fn from(v: i64) -> Self {
        MockValue::Int(v)
    }
}

impl From<f64> for MockValue {
    fn from(v: f64) -> Self {
        MockValue::Float(v)
    }
}

impl From<&str> for MockValue {
    fn from(v: &str) -> Self {
        MockValue::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for MockValue {
    fn from(v: DateTime<Utc>) -> Self {
        MockValue::Timestamp(v)
    }
}

impl<T: Into<MockValue>> From<Option<T>> for MockValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(MockValue::Null, Into::into)
    }
}

/// One mocked result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockRow {
    values: Vec<MockValue>,
}

impl MockRow {
    pub fn new(values: Vec<MockValue>) -> Self {
        Self { values }
    }

    /// A row of `width` NULLs.
    pub fn nulls(width: usize) -> Self {
        Self::new(vec![MockValue::Null; width])
    }

    /// Replaces the value at `idx`. Panics if `idx` is out of range.
    pub fn set(mut self, idx: usize, value: impl Into<MockValue>) -> Self {
        self.values[idx] = value.into();
        self
    }

    fn value(&self, idx: usize) -> Result<&MockValue> {
        self.values.get(idx).ok_or_else(|| {
            PgStatsError::scan(idx, format!("row has {} columns", self.values.len()))
        })
    }
}

fn mismatch(idx: usize, value: &MockValue, target: &str) -> PgStatsError {
    PgStatsError::scan(idx, format!("cannot read {value:?} as {target}"))
}

impl StatRow for MockRow {
    fn column_count(&self) -> usize {
        self.values.len()
    }

    fn get_bool(&self, idx: usize) -> Result<Option<bool>> {
        match self.value(idx)? {
            MockValue::Null => Ok(None),
            MockValue::Bool(v) => Ok(Some(*v)),
            other => Err(mismatch(idx, other, "boolean")),
        }
    }

    fn get_i64(&self, idx: usize) -> Result<Option<i64>> {
        match self.value(idx)? {
            MockValue::Null => Ok(None),
            MockValue::Int(v) => Ok(Some(*v)),
            other => Err(mismatch(idx, other, "int64")),
        }
    }

    fn get_f64(&self, idx: usize) -> Result<Option<f64>> {
        match self.value(idx)? {
            MockValue::Null => Ok(None),
            MockValue::Float(v) => Ok(Some(*v)),
            other => Err(mismatch(idx, other, "float64")),
        }
    }

    fn get_string(&self, idx: usize) -> Result<Option<String>> {
        match self.value(idx)? {
            MockValue::Null => Ok(None),
            MockValue::Text(v) => Ok(Some(v.clone())),
            other => Err(mismatch(idx, other, "string")),
        }
    }

    fn get_timestamp(&self, idx: usize) -> Result<Option<DateTime<Utc>>> {
        match self.value(idx)? {
            MockValue::Null => Ok(None),
            MockValue::Timestamp(v) => Ok(Some(*v)),
            other => Err(mismatch(idx, other, "timestamp")),
        }
    }
}

/// Scripted stand-in for a server connection.
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    server_version: String,
    relations: Vec<(String, Vec<MockRow>)>,
    failures: Vec<(String, String)>,
    executed: Vec<String>,
}

impl MockHandle {
    /// Creates a handle reporting `server_version` (e.g. `"9.6.13"`).
    pub fn new(server_version: impl Into<String>) -> Self {
        Self {
            server_version: server_version.into(),
            ..Self::default()
        }
    }

    /// Serves `rows` for queries reading `FROM relation`. Relations are
    /// matched in registration order; re-registering replaces the rows.
    pub fn with_rows(mut self, relation: &str, rows: Vec<MockRow>) -> Self {
        match self.relations.iter_mut().find(|(name, _)| name == relation) {
            Some((_, existing)) => *existing = rows,
            None => self.relations.push((relation.to_string(), rows)),
        }
        self
    }

    /// Makes every statement containing `fragment` fail with `message`.
    pub fn fail_on(&mut self, fragment: &str, message: &str) {
        self.failures
            .push((fragment.to_string(), message.to_string()));
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn record(&mut self, sql: &str) -> Result<()> {
        self.executed.push(sql.to_string());
        match self.failures.iter().find(|(f, _)| sql.contains(f.as_str())) {
            Some((_, message)) => Err(PgStatsError::Query(message.clone())),
            None => Ok(()),
        }
    }
}

/// True if `sql` contains `FROM <relation>` followed by a non-identifier
/// character (or end of input).
fn reads_from(sql: &str, relation: &str) -> bool {
    let needle = format!("FROM {relation}");
    sql.match_indices(&needle).any(|(pos, _)| {
        sql[pos + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
    })
}

impl QueryHandle for MockHandle {
    type Row = MockRow;

    fn query_scalar(&mut self, sql: &str) -> Result<String> {
        self.record(sql)?;
        if sql.trim().eq_ignore_ascii_case("SHOW server_version") {
            return Ok(self.server_version.clone());
        }
        Err(PgStatsError::Query(format!("unexpected scalar query: {sql}")))
    }

    fn query(&mut self, sql: &str) -> Result<Vec<MockRow>> {
        self.record(sql)?;
        self.relations
            .iter()
            .find(|(relation, _)| reads_from(sql, relation))
            .map(|(_, rows)| rows.clone())
            .ok_or_else(|| PgStatsError::Query("ERROR: relation does not exist".to_string()))
    }
}
