//! Question suggestion.
//!
//! Samples a few values from every column, shows the model the annotated
//! schema, and asks it for questions a user could put to this database.

use std::fmt::Write;

use querysmith_core::database::{Database, QueryResult};
use querysmith_core::error::SelectionError;
use querysmith_core::schema::{SchemaRow, SchemaTable};
use tracing::{debug, warn};

use crate::completion::CompletionClient;

/// Values sampled per column.
pub const SAMPLE_SIZE: usize = 3;

/// A schema row with a few of its actual values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledColumn {
    pub row: SchemaRow,
    pub samples: Vec<String>,
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `SELECT "column" FROM "table" LIMIT 3`
pub fn sample_sql(row: &SchemaRow) -> String {
    format!(
        "SELECT {} FROM {} LIMIT {SAMPLE_SIZE}",
        quote_identifier(&row.column_name),
        quote_identifier(&row.table_name)
    )
}

/// Sample every column. A column that cannot be read gets no samples.
pub async fn sample_values(db: &dyn Database, schema: &SchemaTable) -> Vec<SampledColumn> {
    let mut sampled = Vec::with_capacity(schema.len());

    for row in schema {
        let samples = match db.execute(&sample_sql(row)).await {
            Ok(result) => first_column(&result),
            Err(e) => {
                warn!(table = %row.table_name, column = %row.column_name, error = %e, "Could not sample column");
                Vec::new()
            }
        };
        sampled.push(SampledColumn {
            row: row.clone(),
            samples,
        });
    }

    debug!(columns = sampled.len(), "Sampled column values");
    sampled
}

fn first_column(result: &QueryResult) -> Vec<String> {
    result
        .rows
        .iter()
        .take(SAMPLE_SIZE)
        .filter_map(|row| row.first())
        .map(QueryResult::cell_text)
        .collect()
}

/// The schema table with `sample_value_1..3` columns appended.
pub fn render_samples(columns: &[SampledColumn]) -> String {
    let mut out = String::from("index  table_name  column_name  data_type");
    for n in 1..=SAMPLE_SIZE {
        let _ = write!(out, "  sample_value_{n}");
    }
    for (index, column) in columns.iter().enumerate() {
        let _ = write!(out, "\n{}", column.row.render(index));
        for n in 0..SAMPLE_SIZE {
            let value = column.samples.get(n).map(String::as_str).unwrap_or("None");
            let _ = write!(out, "  {value}");
        }
    }
    out
}

pub fn question_directive(count: usize) -> String {
    format!(
        "Write me {count} questions to ask based on the below information about my database. \
         Give your answer as a list of strings. \
         Instead of using the column names, use normal English words.\n"
    )
}

/// Parse a list literal of quoted strings, e.g. `["a", 'b']`.
///
/// Both quote styles are accepted, with backslash escapes. Text around the
/// outermost brackets is ignored.
pub fn parse_string_list(response: &str) -> Result<Vec<String>, SelectionError> {
    let not_a_list = || SelectionError::NotAList {
        response: response.to_string(),
    };
    let start = response.find('[').ok_or_else(not_a_list)?;
    let end = response.rfind(']').filter(|&end| end > start).ok_or_else(not_a_list)?;
    let inner = &response[start + 1..end];

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        let Some(quote) = chars.next() else {
            break;
        };
        if quote != '"' && quote != '\'' {
            let rest: String = std::iter::once(quote)
                .chain(chars.by_ref().take_while(|c| *c != ','))
                .collect();
            return Err(SelectionError::InvalidElement {
                element: rest.trim().to_string(),
            });
        }

        let mut item = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        item.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                }
                c if c == quote => {
                    closed = true;
                    break;
                }
                c => item.push(c),
            }
        }
        if !closed {
            return Err(SelectionError::InvalidElement { element: item });
        }
        items.push(item);
    }
    Ok(items)
}

/// Ask for `count` questions about the database behind `schema`.
pub async fn suggest_questions(
    client: &CompletionClient,
    db: &dyn Database,
    schema: &SchemaTable,
    count: usize,
) -> querysmith_core::Result<Vec<String>> {
    let sampled = sample_values(db, schema).await;
    let prompt = format!("{}{}", question_directive(count), render_samples(&sampled));
    let response = client.prompt_on_directive(&prompt).await?;
    Ok(parse_string_list(&response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedDatabase, SequentialMockProvider};
    use querysmith_core::error::SqlExecutionError;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> SchemaTable {
        SchemaTable::from_rows(vec![
            SchemaRow::new("film", "title", "text"),
            SchemaRow::new("film", "rating", "USER-DEFINED"),
        ])
    }

    #[test]
    fn sample_sql_quotes_identifiers() {
        assert_eq!(
            sample_sql(&SchemaRow::new("Film", "ti\"tle", "text")),
            "SELECT \"ti\"\"tle\" FROM \"Film\" LIMIT 3"
        );
    }

    #[test]
    fn directive_asks_for_plain_english() {
        let directive = question_directive(20);
        assert!(directive.starts_with("Write me 20 questions"));
        assert!(directive.contains("Instead of using the column names, use normal English words."));
    }

    #[test]
    fn parses_double_and_single_quotes() {
        let parsed = parse_string_list(r#"Sure: ["How many films?", 'Who\'s the top actor?',]"#).unwrap();
        assert_eq!(parsed, vec!["How many films?", "Who's the top actor?"]);
    }

    #[test]
    fn brackets_inside_strings_survive() {
        let parsed = parse_string_list(r#"["Which films [rated R] rent most?"]"#).unwrap();
        assert_eq!(parsed, vec!["Which films [rated R] rent most?"]);
    }

    #[test]
    fn unquoted_element_is_rejected() {
        assert_eq!(
            parse_string_list("[1, 2]").unwrap_err(),
            SelectionError::InvalidElement { element: "1".into() }
        );
        assert!(matches!(
            parse_string_list("no list here"),
            Err(SelectionError::NotAList { .. })
        ));
    }

    #[tokio::test]
    async fn unreadable_columns_get_no_samples() {
        let db = ScriptedDatabase::new(|sql| {
            if sql.contains("\"title\"") {
                Ok(QueryResult::new(
                    vec!["title".into()],
                    vec![vec![json!("ACADEMY DINOSAUR")], vec![json!(null)]],
                ))
            } else {
                Err(SqlExecutionError::new("permission denied"))
            }
        });

        let sampled = sample_values(&db, &schema()).await;
        assert_eq!(sampled[0].samples, vec!["ACADEMY DINOSAUR", "NULL"]);
        assert!(sampled[1].samples.is_empty());

        let rendered = render_samples(&sampled);
        assert!(rendered.starts_with("index  table_name  column_name  data_type  sample_value_1"));
        assert!(rendered.contains("0  film  title  text  ACADEMY DINOSAUR  NULL  None"));
    }

    #[tokio::test]
    async fn suggestions_are_parsed_from_the_response() {
        let provider = Arc::new(SequentialMockProvider::texts(&[
            "[\"How many films are rated PG?\", \"What is the longest film?\"]",
        ]));
        let client = CompletionClient::new(provider.clone(), "m");
        let db = ScriptedDatabase::new(|_| Ok(QueryResult::default()));

        let questions = suggest_questions(&client, &db, &schema(), 2).await.unwrap();
        assert_eq!(questions.len(), 2);
        assert!(
            provider.requests()[0].messages[0]
                .content
                .starts_with("Write me 2 questions")
        );
    }
}
