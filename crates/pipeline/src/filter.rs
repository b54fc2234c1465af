//! Two-pass schema filter.
//!
//! The first pass keeps rows related to the question's data. The second
//! pass shows the model those rows and keeps rows needed to join them. The
//! result is the union of both passes without duplicate rows.

use querysmith_core::error::BudgetError;
use querysmith_core::event::{EventObserver, FilterPass, PipelineEvent};
use querysmith_core::schema::SchemaTable;
use tracing::{debug, info};

use crate::completion::{CompletionClient, LOG_PREVIEW_CHARS, truncate_content};
use crate::partition::partition_by_tokens;
use crate::selector::select_rows;
use crate::token::TokenBudget;

/// Directive for the data-relevance pass. The table follows it.
pub fn data_directive(question: &str) -> String {
    format!(
        "I have a user question and a database schema table. \
         Your task is to identify rows from the database schema table that could be related to the user's question. \
         Only return the index numbers of those rows as a list. Do not include any descriptions or explanations.\n\
         Here is the question: {question}\nHere is the Database Schema Table:\n"
    )
}

/// Directive for the join-relevance pass, embedding the data-pass rows.
pub fn join_directive(for_data: &SchemaTable) -> String {
    format!(
        "I have a table of columns that need to be joined and a full database schema table. \
         Your task is to identify rows from the full database schema table that could be used to join the columns \
         from the table of columns that need to be joined. \
         Only return the index numbers of those rows as a list. Do not include any descriptions or explanations.\n\
         Here is the table of columns that need to be joined:\n{}\nHere is the Full Database Schema Table:\n",
        for_data.render()
    )
}

/// Output of both passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredSchema {
    pub for_data: SchemaTable,
    pub for_joins: SchemaTable,
    /// `for_data` then new `for_joins` rows, duplicates removed
    pub merged: SchemaTable,
}

/// Narrows a schema table to the rows a question needs.
pub struct SchemaFilter<'a> {
    client: &'a CompletionClient,
    budget: &'a TokenBudget,
    observer: &'a dyn EventObserver,
}

impl<'a> SchemaFilter<'a> {
    pub fn new(
        client: &'a CompletionClient,
        budget: &'a TokenBudget,
        observer: &'a dyn EventObserver,
    ) -> Self {
        Self {
            client,
            budget,
            observer,
        }
    }

    pub async fn filter(
        &self,
        schema: &SchemaTable,
        question: &str,
    ) -> querysmith_core::Result<FilteredSchema> {
        let for_data = self
            .run_pass(FilterPass::Data, &data_directive(question), schema)
            .await?;
        debug!(rows = for_data.len(), table = %truncate_content(&for_data.render(), LOG_PREVIEW_CHARS), "Filtered for data");

        let for_joins = self
            .run_pass(FilterPass::Joins, &join_directive(&for_data), schema)
            .await?;
        debug!(rows = for_joins.len(), table = %truncate_content(&for_joins.render(), LOG_PREVIEW_CHARS), "Filtered for joins");

        let merged = for_data.union_distinct(&for_joins);
        info!(
            schema_rows = schema.len(),
            data_rows = for_data.len(),
            join_rows = for_joins.len(),
            merged_rows = merged.len(),
            "Schema filtered"
        );
        self.observer.notify(&PipelineEvent::SchemaFiltered {
            data_rows: for_data.len(),
            join_rows: for_joins.len(),
            total_rows: merged.len(),
        });

        Ok(FilteredSchema {
            for_data,
            for_joins,
            merged,
        })
    }

    async fn run_pass(
        &self,
        pass: FilterPass,
        directive: &str,
        schema: &SchemaTable,
    ) -> querysmith_core::Result<SchemaTable> {
        let budget = self.budget.compute_table_budget(directive);
        if budget <= 0 {
            return Err(BudgetError::Exhausted {
                directive_tokens: self.budget.estimate_tokens(directive),
                budget,
            }
            .into());
        }

        let partitions = partition_by_tokens(schema, budget, self.budget.estimator());
        debug!(?pass, budget, partitions = partitions.len(), "Filter pass partitioned");
        self.observer.notify(&PipelineEvent::SchemaPartitioned {
            pass,
            partitions: partitions.len(),
        });

        select_rows(self.client, &partitions, directive).await
    }
}
