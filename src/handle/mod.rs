//! Query handle abstraction.
//!
//! The fetchers only need two things from a connection: run a query that
//! yields a single text value, and run a query whose rows can be read
//! column by column with NULL awareness. [`QueryHandle`] and [`StatRow`]
//! capture exactly that, so fetch logic can run against a real
//! `postgres::Client` or against [`crate::mock::MockHandle`] in tests.

mod pg_client;

use chrono::{DateTime, Utc};

use crate::error::{PgStatsError, Result};
use crate::nullable::Nullable;

/// A connection the fetchers can query.
///
/// Implementations never start transactions or change session state.
pub trait QueryHandle {
    type Row: StatRow;

    /// Runs a parameterless query and returns the first column of its only
    /// row as text.
    fn query_scalar(&mut self, sql: &str) -> Result<String>;

    /// Runs a parameterless query and returns every row.
    fn query(&mut self, sql: &str) -> Result<Vec<Self::Row>>;
}

/// Positional, NULL-aware access to one result row.
///
/// Getters return `Ok(None)` for SQL NULL and `Err(Scan)` when the column
/// is missing or its type cannot be represented as the requested primitive.
pub trait StatRow {
    fn column_count(&self) -> usize;
    fn get_bool(&self, idx: usize) -> Result<Option<bool>>;
    fn get_i64(&self, idx: usize) -> Result<Option<i64>>;
    fn get_f64(&self, idx: usize) -> Result<Option<f64>>;
    fn get_string(&self, idx: usize) -> Result<Option<String>>;
    fn get_timestamp(&self, idx: usize) -> Result<Option<DateTime<Utc>>>;
}

/// A record field type that can be read from a result column.
///
/// Bare primitives reject NULL; [`Nullable`] wrappers accept it.
pub trait FromColumn: Sized {
    fn from_column<R: StatRow + ?Sized>(row: &R, idx: usize) -> Result<Self>;
}

macro_rules! impl_from_column {
    ($ty:ty, $getter:ident, $name:literal) => {
        impl FromColumn for $ty {
            fn from_column<R: StatRow + ?Sized>(row: &R, idx: usize) -> Result<Self> {
                row.$getter(idx)?.ok_or_else(|| {
                    PgStatsError::scan(idx, concat!("NULL in non-nullable ", $name, " column"))
                })
            }
        }

        impl FromColumn for Nullable<$ty> {
            fn from_column<R: StatRow + ?Sized>(row: &R, idx: usize) -> Result<Self> {
                row.$getter(idx).map(Nullable::from)
            }
        }
    };
}

impl_from_column!(bool, get_bool, "boolean");
impl_from_column!(i64, get_i64, "int64");
impl_from_column!(f64, get_f64, "float64");
impl_from_column!(String, get_string, "string");
impl_from_column!(DateTime<Utc>, get_timestamp, "timestamp");

/// A record built from one result row.
pub trait FromStatRow: Sized {
    fn from_row<R: StatRow + ?Sized>(row: &R) -> Result<Self>;
}

/// Reads a row left to right, one column per record field.
pub struct RowScanner<'a, R: ?Sized> {
    row: &'a R,
    next: usize,
}

impl<'a, R: StatRow + ?Sized> RowScanner<'a, R> {
    pub fn new(row: &'a R) -> Self {
        Self { row, next: 0 }
    }

    /// Reads the next column into `T`.
    pub fn column<T: FromColumn>(&mut self) -> Result<T> {
        let idx = self.next;
        self.next += 1;
        T::from_column(self.row, idx)
    }

    /// Checks that every column of the row was consumed.
    pub fn finish(self) -> Result<()> {
        let count = self.row.column_count();
        if self.next != count {
            return Err(PgStatsError::scan(
                self.next.min(count),
                format!("row has {count} columns, record expects {}", self.next),
            ));
        }
        Ok(())
    }
}
