//! Error-analysis conversation.
//!
//! Six fixed steps in one growing conversation: summarize the question,
//! explain the failing query, interpret the error, relate it to the schema,
//! plan the fix, and finally write the corrected query. The last response is
//! executed once. Nothing here is retried.

use querysmith_core::database::{Database, QueryResult};
use querysmith_core::event::{EventObserver, PipelineEvent};
use querysmith_core::message::{Conversation, Message};
use querysmith_core::schema::SchemaTable;
use tracing::{debug, info, warn};

use crate::completion::{CompletionClient, LOG_PREVIEW_CHARS, truncate_content};
use crate::generator::SCHEMA_TABLE_EXPLANATION;

/// Number of directive/response pairs in a full analysis.
pub const ANALYSIS_STEPS: usize = 6;

/// The six directives, in order.
pub fn analysis_directives(
    question: &str,
    sql: &str,
    error: &str,
    schema: &SchemaTable,
) -> [String; ANALYSIS_STEPS] {
    let rendered = schema.render();
    [
        format!(
            "I provide you with an SQL query that has produced an error, along with the original question it's \
             meant to answer, the specific error message, and a Database Schema Table. Your task is to help \
             diagnose and correct the issue. Please start by summarizing the user's original question: {question}"
        ),
        format!("What do you think the original SQL query is trying to do?\nSQL Query: {sql}"),
        format!("What do you make of the following error message?\nError Message: {error}"),
        format!(
            "Based on this Database Schema, what changes would you suggest for the original query? \
             {SCHEMA_TABLE_EXPLANATION}\nDatabase Schema:\n{rendered}"
        ),
        "What are the steps to correct the SQL query based on the above information?".to_string(),
        format!(
            "Based on all the information and suggestions, please provide a corrected SQL query that should \
             successfully execute. Please only respond with the corrected SQL code, without additional \
             explanations. For example, do not preface your response with 'The corrected SQL query is...'\n\n\
             Original Question: {question}\nOriginal SQL Query: {sql}\nError Message: {error}\n\
             Database Schema:\n{rendered}"
        ),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The corrected query ran
    Answered(QueryResult),
    /// The conversation broke off or the corrected query failed too
    Unanswerable { reason: String },
}

/// Everything the analysis produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Responses to the steps that completed, in order
    pub responses: Vec<String>,
    pub conversation: Conversation,
    /// The step-6 query, if the conversation got that far
    pub final_sql: Option<String>,
    pub outcome: AnalysisOutcome,
}

impl AnalysisReport {
    pub fn is_answered(&self) -> bool {
        matches!(self.outcome, AnalysisOutcome::Answered(_))
    }
}

/// Runs the six-step diagnostic dialogue.
pub struct ErrorAnalysis<'a> {
    client: &'a CompletionClient,
    db: &'a dyn Database,
    observer: &'a dyn EventObserver,
}

impl<'a> ErrorAnalysis<'a> {
    pub fn new(
        client: &'a CompletionClient,
        db: &'a dyn Database,
        observer: &'a dyn EventObserver,
    ) -> Self {
        Self {
            client,
            db,
            observer,
        }
    }

    pub async fn run(
        &self,
        question: &str,
        sql: &str,
        error: &str,
        schema: &SchemaTable,
    ) -> AnalysisReport {
        info!("Starting error analysis");
        let mut conversation = Conversation::new();
        let mut responses = Vec::with_capacity(ANALYSIS_STEPS);

        for (step, directive) in (1u8..).zip(analysis_directives(question, sql, error, schema)) {
            conversation.push(Message::user(directive));

            let response = match self.client.prompt_on_conversation(&conversation).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(step, error = %e, "Error analysis broke off");
                    return AnalysisReport {
                        responses,
                        conversation,
                        final_sql: None,
                        outcome: AnalysisOutcome::Unanswerable {
                            reason: format!("completion failed at analysis step {step}: {e}"),
                        },
                    };
                }
            };

            debug!(step, content = %truncate_content(&response, LOG_PREVIEW_CHARS), "Analysis step done");
            conversation.push(Message::assistant(response.clone()));
            self.observer.notify(&PipelineEvent::ErrorAnalysisContentSet {
                step,
                content: response.clone(),
            });
            responses.push(response);
        }

        let final_sql = responses.last().cloned().unwrap_or_default();
        let outcome = match self.db.execute(&final_sql).await {
            Ok(result) => {
                info!(rows = result.row_count(), "Corrected query executed");
                AnalysisOutcome::Answered(result)
            }
            Err(e) => {
                info!(error = %e, "Corrected SQL query still produces an error");
                AnalysisOutcome::Unanswerable { reason: e.message }
            }
        };

        AnalysisReport {
            responses,
            conversation,
            final_sql: Some(final_sql),
            outcome,
        }
    }
}
