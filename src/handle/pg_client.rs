//! `QueryHandle` for the synchronous `postgres` client.

use chrono::{DateTime, NaiveDateTime, Utc};
use postgres::types::{FromSql, Type};
use postgres::{Client, Row};

use super::{QueryHandle, StatRow};
use crate::error::{PgStatsError, Result, format_postgres_error};

impl QueryHandle for Client {
    type Row = Row;

    fn query_scalar(&mut self, sql: &str) -> Result<String> {
        let row = self
            .query_one(sql, &[])
            .map_err(|e| PgStatsError::Query(format_postgres_error(&e)))?;
        row.get_string(0)?
            .ok_or_else(|| PgStatsError::scan(0, "scalar query returned NULL"))
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        Client::query(self, sql, &[]).map_err(|e| PgStatsError::Query(format_postgres_error(&e)))
    }
}

fn column_type(row: &Row, idx: usize) -> Result<&Type> {
    row.columns()
        .get(idx)
        .map(|c| c.type_())
        .ok_or_else(|| PgStatsError::scan(idx, format!("row has {} columns", row.len())))
}

fn read<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| PgStatsError::scan(idx, e.to_string()))
}

fn mismatch(idx: usize, ty: &Type, target: &str) -> PgStatsError {
    PgStatsError::scan(idx, format!("cannot read {ty} as {target}"))
}

impl StatRow for Row {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn get_bool(&self, idx: usize) -> Result<Option<bool>> {
        read(self, idx)
    }

    // Catalog counters come back as int8, pids and ports as int4, object
    // identifiers as oid.
    fn get_i64(&self, idx: usize) -> Result<Option<i64>> {
        let ty = column_type(self, idx)?;
        if *ty == Type::INT8 {
            read::<i64>(self, idx)
        } else if *ty == Type::INT4 {
            Ok(read::<i32>(self, idx)?.map(i64::from))
        } else if *ty == Type::INT2 {
            Ok(read::<i16>(self, idx)?.map(i64::from))
        } else if *ty == Type::OID {
            Ok(read::<u32>(self, idx)?.map(i64::from))
        } else {
            Err(mismatch(idx, ty, "int64"))
        }
    }

    fn get_f64(&self, idx: usize) -> Result<Option<f64>> {
        let ty = column_type(self, idx)?;
        if *ty == Type::FLOAT8 {
            read::<f64>(self, idx)
        } else if *ty == Type::FLOAT4 {
            Ok(read::<f32>(self, idx)?.map(f64::from))
        } else {
            Err(mismatch(idx, ty, "float64"))
        }
    }

    fn get_string(&self, idx: usize) -> Result<Option<String>> {
        read(self, idx)
    }

    fn get_timestamp(&self, idx: usize) -> Result<Option<DateTime<Utc>>> {
        let ty = column_type(self, idx)?;
        if *ty == Type::TIMESTAMPTZ {
            read::<DateTime<Utc>>(self, idx)
        } else if *ty == Type::TIMESTAMP {
            Ok(read::<NaiveDateTime>(self, idx)?.map(|ts| ts.and_utc()))
        } else {
            Err(mismatch(idx, ty, "timestamp"))
        }
    }
}
