//! Initial query generation.

use querysmith_core::error::ProviderError;
use querysmith_core::event::{EventObserver, PipelineEvent};
use querysmith_core::schema::SchemaTable;
use tracing::info;

use crate::completion::CompletionClient;

/// What every directive says about the schema table's meta-format.
pub const SCHEMA_TABLE_EXPLANATION: &str = "The Database Schema Table is meta-information: each row represents a column \
in a specific table within the database. It details the 'table_name', 'column_name', 'data_type', and, if applicable, \
'synonym_list' for that column.";

pub fn generation_directive(question: &str) -> String {
    format!(
        "I provide a question and a Database Schema Table and you provide SQL. \
         {SCHEMA_TABLE_EXPLANATION} \
         You will only respond with SQL code and not with any explanations.\n\
         Here is the question: {question}\nHere is the Database Schema Table:\n"
    )
}

/// Ask for a SQL query answering `question` over `schema`.
///
/// The response is returned verbatim; it is only checked by executing it.
pub async fn generate_sql(
    client: &CompletionClient,
    question: &str,
    schema: &SchemaTable,
    observer: &dyn EventObserver,
) -> Result<String, ProviderError> {
    let sql = client
        .prompt_on_table(&generation_directive(question), schema)
        .await?;

    info!(sql = %sql, "Initial SQL query generated");
    observer.notify(&PipelineEvent::InitialQuerySet { sql: sql.clone() });
    Ok(sql)
}
