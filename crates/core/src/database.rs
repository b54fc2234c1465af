//! Database trait: the abstraction over SQL execution.
//!
//! The pipeline only ever needs one operation: run a statement and get back
//! either a table or the driver's error text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SqlExecutionError;

/// A tabular query result: ordered columns, ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell as display text: strings unquoted, `NULL` for nulls.
    pub fn cell_text(value: &Value) -> String {
        match value {
            Value::Null => "NULL".into(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Render as a left-aligned, space-padded text table.
    pub fn render(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(Self::cell_text).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let format_line = |fields: &[String]| -> String {
            fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let width = widths.get(i).copied().unwrap_or(0);
                    format!("{f:<width$}")
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![format_line(&self.columns)];
        lines.extend(cells.iter().map(|row| format_line(row)));
        lines.join("\n")
    }
}

/// The core Database trait.
#[async_trait]
pub trait Database: Send + Sync {
    /// A human-readable name for this backend (e.g., "postgres").
    fn name(&self) -> &str;

    /// Execute one SQL statement and return its rows.
    async fn execute(&self, sql: &str) -> std::result::Result<QueryResult, SqlExecutionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_aligns_columns() {
        let result = QueryResult::new(
            vec!["name".into(), "count".into()],
            vec![
                vec![json!("Action"), json!(64)],
                vec![json!("Documentary"), json!(null)],
            ],
        );
        let rendered = result.render();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "name         count");
        assert_eq!(lines[1], "Action       64");
        assert_eq!(lines[2], "Documentary  NULL");
    }

    #[test]
    fn column_lookup() {
        let result = QueryResult::new(vec!["a".into(), "b".into()], vec![]);
        assert_eq!(result.column_index("b"), Some(1));
        assert!(result.is_empty());
    }
}
