//! Business synonym tables.
//!
//! A synonym table is a CSV file with two columns, `existing_column_name`
//! and `synonym_list`. It is left-joined onto the schema by column name so
//! the completion service can match questions phrased in business terms.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::{debug, info};

use querysmith_core::error::DatabaseError;
use querysmith_core::schema::{SchemaRow, SchemaTable};

/// One line of the synonym CSV.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SynonymEntry {
    pub existing_column_name: String,
    #[serde(default)]
    pub synonym_list: Option<String>,
}

/// Read every entry from the CSV file at `path`.
pub fn load_synonyms(path: &Path) -> Result<Vec<SynonymEntry>, DatabaseError> {
    let failed = |reason: String| DatabaseError::Synonyms {
        path: path.display().to_string(),
        reason,
    };

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| failed(e.to_string()))?;

    let entries = reader
        .deserialize::<SynonymEntry>()
        .enumerate()
        .map(|(i, record)| record.map_err(|e| failed(format!("row {}: {e}", i + 1))))
        .collect::<Result<Vec<SynonymEntry>, _>>()?;

    debug!(entries = entries.len(), path = %path.display(), "Synonym table read");
    Ok(entries)
}

/// Left join: every schema row is kept; a row whose column name matches
/// several entries appears once per match, in entry order.
pub fn apply_synonyms(schema: &SchemaTable, entries: &[SynonymEntry]) -> SchemaTable {
    schema
        .iter()
        .flat_map(|row| {
            let matches: Vec<SchemaRow> = entries
                .iter()
                .filter(|entry| entry.existing_column_name == row.column_name)
                .map(|entry| SchemaRow {
                    synonym_list: entry.synonym_list.clone(),
                    ..row.clone()
                })
                .collect();

            if matches.is_empty() {
                vec![row.clone()]
            } else {
                matches
            }
        })
        .collect()
}

/// Enrich `schema` when a synonym file is configured and present.
/// Otherwise the schema is returned unchanged.
pub fn enrich_if_available(
    schema: SchemaTable,
    path: Option<&Path>,
) -> Result<SchemaTable, DatabaseError> {
    match path {
        Some(path) if path.exists() => {
            let entries = load_synonyms(path)?;
            let enriched = apply_synonyms(&schema, &entries);
            info!(
                rows = enriched.len(),
                path = %path.display(),
                "Schema enriched with synonyms"
            );
            Ok(enriched)
        }
        Some(path) => {
            debug!(path = %path.display(), "Synonym table not found, using plain schema");
            Ok(schema)
        }
        None => Ok(schema),
    }
}
