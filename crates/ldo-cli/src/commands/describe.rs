//! Describe command implementation.

use crate::cli::DescribeArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use ldo_domain::traits::SchemaIntrospector;
use ldo_domain::TableSchema;
use ldo_store::{ConnectionPool, SqliteIntrospector};
use std::sync::Arc;

/// Execute the describe command.
pub fn execute_describe(args: DescribeArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let schema = describe(&args.table, config)?;
    println!("{}", formatter.format_schema(&schema)?);
    Ok(())
}

/// Introspect `table` in the configured database.
pub fn describe(table: &str, config: &AppConfig) -> Result<TableSchema> {
    let pool = Arc::new(ConnectionPool::open(&config.database)?);
    Ok(SqliteIntrospector::new(pool).describe_table(table)?)
}
