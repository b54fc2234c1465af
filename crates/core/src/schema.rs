//! Schema description table.
//!
//! One [`SchemaRow`] per (table, column) pair. Rows are addressed by their
//! position in the owning [`SchemaTable`]; the completion service answers
//! row-selection directives with those positions, so rendering always
//! prints them next to each row.

use std::collections::HashSet;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// Separator between rendered fields.
const FIELD_SEPARATOR: &str = "  ";

/// A single column of a single table, optionally with business synonyms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonym_list: Option<String>,
}

impl SchemaRow {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            data_type: data_type.into(),
            synonym_list: None,
        }
    }

    pub fn with_synonyms(mut self, synonyms: impl Into<String>) -> Self {
        self.synonym_list = Some(synonyms.into());
        self
    }

    /// Render this row on one line, prefixed by `index` and without a header.
    pub fn render(&self, index: usize) -> String {
        let mut line = format!(
            "{index}{sep}{}{sep}{}{sep}{}",
            self.table_name,
            self.column_name,
            self.data_type,
            sep = FIELD_SEPARATOR
        );
        if let Some(synonyms) = &self.synonym_list {
            line.push_str(FIELD_SEPARATOR);
            line.push_str(synonyms);
        }
        line
    }
}

/// An ordered collection of schema rows, indexed by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTable {
    rows: Vec<SchemaRow>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<SchemaRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SchemaRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<SchemaRow> {
        self.rows
    }

    pub fn get(&self, index: usize) -> Option<&SchemaRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push(&mut self, row: SchemaRow) {
        self.rows.push(row);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SchemaRow> {
        self.rows.iter()
    }

    /// Whether any row carries a synonym list.
    pub fn has_synonyms(&self) -> bool {
        self.rows.iter().any(|r| r.synonym_list.is_some())
    }

    /// Pick rows by position, in the order given. Repeated indices repeat rows.
    pub fn select(&self, indices: &[usize]) -> Result<SchemaTable, SelectionError> {
        let rows = indices
            .iter()
            .map(|&index| {
                self.rows
                    .get(index)
                    .cloned()
                    .ok_or(SelectionError::IndexOutOfRange {
                        index,
                        len: self.rows.len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    /// Concatenate `self` and `other`, keeping only the first occurrence of
    /// each distinct row value. Order is `self` first, then rows of `other`
    /// not seen before.
    pub fn union_distinct(&self, other: &SchemaTable) -> SchemaTable {
        let mut seen: HashSet<&SchemaRow> = HashSet::new();
        let rows = self
            .rows
            .iter()
            .chain(other.rows.iter())
            .filter(|row| seen.insert(*row))
            .cloned()
            .collect();
        Self { rows }
    }

    /// Render as a text table with a header line and one indexed line per row.
    pub fn render(&self) -> String {
        let mut out = String::from("index");
        for column in ["table_name", "column_name", "data_type"] {
            out.push_str(FIELD_SEPARATOR);
            out.push_str(column);
        }
        if self.has_synonyms() {
            out.push_str(FIELD_SEPARATOR);
            out.push_str("synonym_list");
        }
        for (index, row) in self.rows.iter().enumerate() {
            let _ = write!(out, "\n{}", row.render(index));
        }
        out
    }
}

impl FromIterator<SchemaRow> for SchemaTable {
    fn from_iter<I: IntoIterator<Item = SchemaRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl Extend<SchemaRow> for SchemaTable {
    fn extend<I: IntoIterator<Item = SchemaRow>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl<'a> IntoIterator for &'a SchemaTable {
    type Item = &'a SchemaRow;
    type IntoIter = std::slice::Iter<'a, SchemaRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn films() -> SchemaTable {
        SchemaTable::from_rows(vec![
            SchemaRow::new("film", "film_id", "integer"),
            SchemaRow::new("film", "title", "text"),
            SchemaRow::new("actor", "actor_id", "integer"),
        ])
    }

    #[test]
    fn select_keeps_requested_order() {
        let picked = films().select(&[2, 0]).unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.rows()[0].table_name, "actor");
        assert_eq!(picked.rows()[1].column_name, "film_id");
    }

    #[test]
    fn select_rejects_out_of_range() {
        let err = films().select(&[3]).unwrap_err();
        assert_eq!(err, SelectionError::IndexOutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn union_distinct_drops_value_duplicates() {
        let data = films().select(&[0, 1]).unwrap();
        let joins = films().select(&[1, 2]).unwrap();
        let merged = data.union_distinct(&joins);
        let columns: Vec<_> = merged.iter().map(|r| r.column_name.as_str()).collect();
        assert_eq!(columns, vec!["film_id", "title", "actor_id"]);
    }

    #[test]
    fn union_distinct_compares_synonyms_too() {
        let plain = SchemaTable::from_rows(vec![SchemaRow::new("film", "title", "text")]);
        let tagged = SchemaTable::from_rows(vec![
            SchemaRow::new("film", "title", "text").with_synonyms("name, movie name"),
        ]);
        assert_eq!(plain.union_distinct(&tagged).len(), 2);
    }

    #[test]
    fn render_row_without_header() {
        let row = SchemaRow::new("film", "title", "text");
        assert_eq!(row.render(4), "4  film  title  text");
    }

    #[test]
    fn render_table_includes_synonym_header_only_when_present() {
        let table = films();
        assert!(!table.render().contains("synonym_list"));

        let mut tagged = films();
        tagged.push(SchemaRow::new("film", "length", "smallint").with_synonyms("duration"));
        let rendered = tagged.render();
        assert!(rendered.starts_with("index  table_name  column_name  data_type  synonym_list"));
        assert!(rendered.contains("3  film  length  smallint  duration"));
    }

    fn arb_table() -> impl proptest::strategy::Strategy<Value = SchemaTable> {
        use proptest::prelude::*;
        // Small alphabets so duplicates are common
        prop::collection::vec(("[ab]", "[xy]", "(integer|text)"), 0..12).prop_map(|rows| {
            rows.into_iter()
                .map(|(t, c, d)| SchemaRow::new(t, c, d))
                .collect()
        })
    }

    proptest::proptest! {
        #[test]
        fn union_distinct_is_idempotent(a in arb_table(), b in arb_table()) {
            let once = a.union_distinct(&b);
            let twice = once.union_distinct(&b);
            proptest::prop_assert_eq!(&twice, &once);
            proptest::prop_assert_eq!(once.union_distinct(&SchemaTable::new()), once.clone());
        }

        #[test]
        fn union_distinct_keeps_left_rows_first(a in arb_table(), b in arb_table()) {
            let merged = a.union_distinct(&b);
            let left = SchemaTable::new().union_distinct(&a);
            proptest::prop_assert_eq!(&merged.rows()[..left.len()], left.rows());
        }
    }
}
