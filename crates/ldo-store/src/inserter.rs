//! Transactional batch inserts

use crate::coerce::{coerce, BoundValue};
use crate::{ConnectionPool, StoreError};
use ldo_domain::traits::{InsertOutcome, RowSink};
use ldo_domain::{ColumnSpec, JsonKind, TableSchema};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// SQLite's default bound-parameter limit (`SQLITE_MAX_VARIABLE_NUMBER`)
pub const MAX_BOUND_PARAMETERS: usize = 32_766;

/// Rows one multi-row INSERT can carry for `columns` bound columns
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BOUND_PARAMETERS / columns.max(1)).max(1)
}

/// The SQLite message without the statement text
fn batch_reason(error: &rusqlite::Error) -> String {
    match error {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.clone(),
        other => other
            .sqlite_error()
            .map_or_else(|| other.to_string(), ToString::to_string),
    }
}

/// Quote an identifier for SQLite
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT INTO "t" ("a", "b") VALUES (?, ?), (?, ?)` for `rows` rows
pub fn insert_statement(table: &str, columns: &[&ColumnSpec], rows: usize) -> String {
    let names = columns
        .iter()
        .map(|c| quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![tuple.as_str(); rows].join(", ");
    format!("INSERT INTO {} ({}) VALUES {}", quote_identifier(table), names, values)
}

/// Writes one document's rows in a single transaction
///
/// Rows are inserted in batches of `chunk_size`. A batch is written as one
/// multi-row INSERT, or several when its rows would exceed
/// [`MAX_BOUND_PARAMETERS`]. Any failing batch rolls back the whole document. A document that produced no rows is
/// rolled back as well.
#[derive(Debug)]
pub struct BatchInserter {
    pool: Arc<ConnectionPool>,
    truncate_before_insert: bool,
    truncated: AtomicBool,
}

impl BatchInserter {
    /// Create an inserter; `truncate_before_insert` empties the table in the
    /// first committed transaction
    pub fn new(pool: Arc<ConnectionPool>, truncate_before_insert: bool) -> Self {
        Self {
            pool,
            truncate_before_insert,
            truncated: AtomicBool::new(false),
        }
    }

    /// Whether the table has already been emptied in this run
    pub fn has_truncated(&self) -> bool {
        self.truncated.load(Ordering::Acquire)
    }
}

/// Columns bound by the INSERT: every extracted column, plus database-filled
/// columns some row supplies a value for. Omitted columns keep their default.
fn insert_columns<'a>(schema: &'a TableSchema, rows: &[&Map<String, Value>]) -> Vec<&'a ColumnSpec> {
    schema
        .columns
        .iter()
        .filter(|column| {
            column.is_extracted()
                || rows
                    .iter()
                    .any(|row| row.get(&column.name).is_some_and(|v| !v.is_null()))
        })
        .collect()
}

impl RowSink for BatchInserter {
    type Error = StoreError;

    fn insert_rows(
        &self,
        schema: &TableSchema,
        rows: &Value,
        chunk_size: usize,
    ) -> Result<InsertOutcome, Self::Error> {
        let items = rows.as_array().ok_or_else(|| {
            StoreError::InvalidData(format!("expected an array of rows, got {}", JsonKind::of(rows)))
        })?;

        let objects: Vec<&Map<String, Value>> = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let object = item.as_object();
                if object.is_none() {
                    warn!(row = index, kind = %JsonKind::of(item), "Skipping non-object row");
                }
                object
            })
            .collect();

        let columns = insert_columns(schema, &objects);
        if columns.is_empty() && !objects.is_empty() {
            return Err(StoreError::InvalidData(format!(
                "table {} has no insertable columns",
                schema.name
            )));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let truncating = self.truncate_before_insert && !self.has_truncated();
        if truncating {
            let deleted = tx.execute(&format!("DELETE FROM {}", quote_identifier(&schema.name)), [])?;
            debug!(table = %schema.name, deleted, "Table emptied before insert");
        }

        let statement_rows = rows_per_statement(columns.len());
        let mut outcome = InsertOutcome::default();
        for (batch, chunk) in objects.chunks(chunk_size.max(1)).enumerate() {
            let mut inserted = 0;
            for part in chunk.chunks(statement_rows) {
                let sql = insert_statement(&schema.name, &columns, part.len());
                let params: Vec<BoundValue> = part
                    .iter()
                    .flat_map(|row| columns.iter().map(|column| coerce(row.get(&column.name), column)))
                    .collect();

                inserted += tx
                    .execute(&sql, rusqlite::params_from_iter(params.iter()))
                    .map_err(|source| StoreError::Batch {
                        table: schema.name.clone(),
                        batch,
                        reason: batch_reason(&source),
                        source,
                    })?;
            }

            debug!(batch, rows = inserted, "Batch inserted");
            outcome.rows_inserted += inserted;
            outcome.batches += 1;
        }

        if outcome.rows_inserted > 0 {
            tx.commit()?;
            outcome.committed = true;
            if truncating {
                self.truncated.store(true, Ordering::Release);
            }
            info!(
                table = %schema.name,
                rows = outcome.rows_inserted,
                batches = outcome.batches,
                "Rows committed"
            );
        } else {
            tx.rollback()?;
            debug!(table = %schema.name, "No rows to insert, rolled back");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("orders"), "\"orders\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_insert_statement() {
        let a = ColumnSpec::new("name", "TEXT");
        let b = ColumnSpec::new("age", "INT");
        assert_eq!(
            insert_statement("people", &[&a, &b], 2),
            "INSERT INTO \"people\" (\"name\", \"age\") VALUES (?, ?), (?, ?)"
        );
    }

    #[test]
    fn test_rows_per_statement() {
        assert_eq!(rows_per_statement(1), MAX_BOUND_PARAMETERS);
        assert_eq!(rows_per_statement(40), 819);
        assert_eq!(rows_per_statement(0), MAX_BOUND_PARAMETERS);
        assert_eq!(rows_per_statement(MAX_BOUND_PARAMETERS + 1), 1);
        assert!(rows_per_statement(40) * 40 <= MAX_BOUND_PARAMETERS);
    }

    #[test]
    fn test_insert_columns_skip_unsupplied_defaults() {
        let schema = TableSchema::new(
            "t",
            vec![
                ColumnSpec::new("id", "INTEGER").auto_increment(),
                ColumnSpec::new("name", "TEXT"),
                ColumnSpec::new("status", "TEXT").with_default("'new'"),
            ],
        );
        let row = serde_json::json!({"name": "Ann"});
        let rows = vec![row.as_object().unwrap()];
        let names: Vec<&str> = insert_columns(&schema, &rows).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name"]);

        let row = serde_json::json!({"name": "Ann", "status": "done"});
        let rows = vec![row.as_object().unwrap()];
        let names: Vec<&str> = insert_columns(&schema, &rows).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["name", "status"]);
    }
}
