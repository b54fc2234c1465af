//! Schema introspection.
//!
//! Reads one row per user-visible column from `information_schema.columns`
//! and turns the result into a [`SchemaTable`].

use querysmith_core::database::{Database, QueryResult};
use querysmith_core::error::DatabaseError;
use querysmith_core::schema::{SchemaRow, SchemaTable};
use tracing::{debug, info};

/// Every column outside the system catalogs, in a stable order.
pub const SCHEMA_SQL: &str = "SELECT table_name::text AS table_name, \
column_name::text AS column_name, data_type::text AS data_type \
FROM information_schema.columns \
WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
ORDER BY table_name, ordinal_position";

/// Load the schema description table through `db`.
pub async fn load_schema(db: &dyn Database) -> Result<SchemaTable, DatabaseError> {
    let result = db
        .execute(SCHEMA_SQL)
        .await
        .map_err(|e| DatabaseError::Introspection(e.message))?;

    let table = rows_from_result(&result)?;
    info!(columns = table.len(), backend = db.name(), "Schema loaded");
    Ok(table)
}

fn rows_from_result(result: &QueryResult) -> Result<SchemaTable, DatabaseError> {
    // An empty result carries no column metadata
    if result.is_empty() {
        return Ok(SchemaTable::new());
    }

    let position = |name: &str| {
        result.column_index(name).ok_or_else(|| {
            DatabaseError::Introspection(format!("schema query returned no '{name}' column"))
        })
    };
    let table_idx = position("table_name")?;
    let column_idx = position("column_name")?;
    let type_idx = position("data_type")?;

    let table: SchemaTable = result
        .rows
        .iter()
        .map(|row| {
            let cell = |i: usize| row.get(i).map(QueryResult::cell_text).unwrap_or_default();
            SchemaRow::new(cell(table_idx), cell(column_idx), cell(type_idx))
        })
        .collect();

    debug!(rows = table.len(), "Converted introspection result");
    Ok(table)
}
