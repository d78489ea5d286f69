//! Table schema introspection

use crate::{ConnectionPool, StoreError};
use ldo_domain::traits::SchemaIntrospector;
use ldo_domain::{ColumnSpec, TableSchema};
use std::sync::Arc;
use tracing::debug;

struct CatalogColumn {
    name: String,
    declared_type: String,
    not_null: bool,
    default_value: Option<String>,
    primary_key: bool,
}

/// Reads table descriptions from the SQLite catalog
#[derive(Debug, Clone)]
pub struct SqliteIntrospector {
    pool: Arc<ConnectionPool>,
}

impl SqliteIntrospector {
    /// Create an introspector on a pool
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl SchemaIntrospector for SqliteIntrospector {
    type Error = StoreError;

    fn describe_table(&self, table: &str) -> Result<TableSchema, Self::Error> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk
             FROM pragma_table_info(?1)
             ORDER BY cid",
        )?;

        let catalog = stmt
            .query_map([table], |row| {
                Ok(CatalogColumn {
                    name: row.get(0)?,
                    declared_type: row.get(1)?,
                    not_null: row.get::<_, i64>(2)? != 0,
                    default_value: row.get(3)?,
                    primary_key: row.get::<_, i64>(4)? > 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if catalog.is_empty() {
            return Err(StoreError::TableNotFound(table.to_string()));
        }

        // Only a lone INTEGER PRIMARY KEY aliases the rowid
        let single_key = catalog.iter().filter(|c| c.primary_key).count() == 1;

        let columns = catalog
            .into_iter()
            .map(|c| {
                let (sql_type, size) = split_declared_type(&c.declared_type);
                let rowid_alias = single_key && c.primary_key && sql_type == "INTEGER";
                let serial = sql_type.contains("SERIAL");

                let mut column = ColumnSpec::new(c.name, sql_type).with_size(size);
                column.nullable = !c.not_null && !c.primary_key;
                column.default_value = c.default_value;
                column.auto_increment = rowid_alias || serial;
                column
            })
            .collect::<Vec<_>>();

        debug!(table, columns = columns.len(), "Table described");
        Ok(TableSchema::new(table, columns))
    }
}

/// `varchar(50)` -> (`VARCHAR`, 50); `DECIMAL(10,2)` -> (`DECIMAL`, 10)
fn split_declared_type(declared: &str) -> (String, i64) {
    let (base, rest) = match declared.split_once('(') {
        Some((base, rest)) => (base, rest),
        None => (declared, ""),
    };
    let size = rest
        .split([',', ')'])
        .next()
        .and_then(|digits| digits.trim().parse().ok())
        .unwrap_or(0);
    (base.trim().to_ascii_uppercase(), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_declared_type() {
        assert_eq!(split_declared_type("varchar(50)"), ("VARCHAR".to_string(), 50));
        assert_eq!(split_declared_type("DECIMAL(10, 2)"), ("DECIMAL".to_string(), 10));
        assert_eq!(split_declared_type("TEXT"), ("TEXT".to_string(), 0));
        assert_eq!(split_declared_type(""), (String::new(), 0));
    }
}
