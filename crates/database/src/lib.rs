//! # QuerySmith Database
//!
//! The SQL side of the pipeline: a PostgreSQL [`Database`] implementation,
//! schema introspection through `information_schema`, and the optional
//! CSV synonym table joined onto the schema.
//!
//! [`Database`]: querysmith_core::Database

pub mod postgres;
pub mod schema;
pub mod synonyms;

pub use postgres::PostgresDatabase;
pub use schema::{SCHEMA_SQL, load_schema};
pub use synonyms::{SynonymEntry, apply_synonyms, enrich_if_available, load_synonyms};

use std::time::Duration;

use querysmith_config::DatabaseConfig;
use querysmith_core::error::DatabaseError;

/// Connect using the database section of the application config.
pub async fn connect_from_config(config: &DatabaseConfig) -> Result<PostgresDatabase, DatabaseError> {
    let url = config.connection_url().ok_or_else(|| {
        DatabaseError::Connection(
            "No database configured. Set DATABASE_URL or HOST/PORT/USER/PASSWORD/DATABASE".into(),
        )
    })?;

    let db = PostgresDatabase::connect_with(&url, config.max_connections).await?;
    Ok(db.with_statement_timeout(Duration::from_secs(config.statement_timeout_secs)))
}
