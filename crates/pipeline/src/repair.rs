//! Bounded retry/repair state machine.
//!
//! ```text
//! Generated -> Executing -> Success
//!                        -> Failed -> RepairAttempt -> Executing   (retry_count < max)
//!                                  -> Escalate                     (retry_count >= max,
//!                                                                   or query unchanged)
//! ```
//!
//! The first repair is a single-shot request carrying the full context.
//! Later repairs continue the same conversation and only report the new
//! error. A failed repair request counts as an attempt and the unchanged
//! query is executed again.

use querysmith_core::database::{Database, QueryResult};
use querysmith_core::error::SqlExecutionError;
use querysmith_core::event::{EventObserver, PipelineEvent};
use querysmith_core::message::{Conversation, Message};
use querysmith_core::schema::SchemaTable;
use tracing::{debug, info, warn};

use crate::completion::CompletionClient;
use crate::generator::SCHEMA_TABLE_EXPLANATION;

/// Cap on repair attempts; lower caps are allowed, higher ones are clamped.
pub const MAX_REPAIR_ATTEMPTS: u32 = querysmith_config::MAX_REPAIR_RETRIES;

/// Everything the loop carries from one attempt to the next.
#[derive(Debug, Clone)]
pub struct RetryState {
    pub current_sql: String,
    pub retry_count: u32,
    pub last_attempted: Option<String>,
    pub conversation: Conversation,
}

impl RetryState {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            current_sql: sql.into(),
            retry_count: 0,
            last_attempted: None,
            conversation: Conversation::new(),
        }
    }

    /// The query about to run is the one that just failed.
    pub fn is_stagnant(&self) -> bool {
        self.last_attempted.as_deref() == Some(self.current_sql.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationReason {
    /// The repair budget is spent
    Exhausted,
    /// A repair produced the query that had just failed
    Stagnated,
}

/// Hand-off to error analysis.
#[derive(Debug, Clone)]
pub struct Escalation {
    pub reason: EscalationReason,
    /// The query that failed last
    pub sql: String,
    pub error: SqlExecutionError,
    pub retry_count: u32,
    pub conversation: Conversation,
}

#[derive(Debug, Clone)]
pub enum RepairOutcome {
    Answered {
        result: QueryResult,
        sql: String,
        retry_count: u32,
        conversation: Conversation,
    },
    Escalated(Escalation),
}

pub fn first_repair_directive(
    question: &str,
    sql: &str,
    error: &str,
    schema: &SchemaTable,
) -> String {
    format!(
        "I provide you with an SQL query that has produced an error, along with the original question it's meant \
         to answer, the specific error message, and a Database Schema Table. {SCHEMA_TABLE_EXPLANATION} \
         Your task is to diagnose the SQL error based on the given information and produce a corrected query that \
         should successfully execute and be different from the original one. \
         Please only respond with the corrected SQL code, without any additional explanations.\n\
         Here is the original question the query is meant to answer: {question}\n\
         Here is the original query:\n{sql}\n\
         Here is the error message:\n{error}\n\
         Here is the Database Schema Table:\n{}",
        schema.render()
    )
}

pub fn follow_up_directive(error: &str) -> String {
    format!(
        "The SQL query you supplied returned the following error message:\n{error}\n\
         Please provide a new, corrected SQL query that should successfully execute and is different from the \
         original. Your response must be different from the original query and it must answer the user's original \
         question. Please only respond with the corrected SQL code, without additional explanations."
    )
}

/// Executes a query, repairing it on failure until it runs or the loop
/// gives up.
pub struct RepairLoop<'a> {
    client: &'a CompletionClient,
    db: &'a dyn Database,
    observer: &'a dyn EventObserver,
    max_retries: u32,
}

impl<'a> RepairLoop<'a> {
    pub fn new(
        client: &'a CompletionClient,
        db: &'a dyn Database,
        observer: &'a dyn EventObserver,
    ) -> Self {
        Self {
            client,
            db,
            observer,
            max_retries: MAX_REPAIR_ATTEMPTS,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.min(MAX_REPAIR_ATTEMPTS);
        self
    }

    pub async fn run(&self, sql: &str, question: &str, schema: &SchemaTable) -> RepairOutcome {
        let mut state = RetryState::new(sql);

        loop {
            let attempt = state.retry_count;
            self.observer.notify(&PipelineEvent::FallbackQuerySet {
                attempt,
                sql: state.current_sql.clone(),
            });

            let error = match self.db.execute(&state.current_sql).await {
                Ok(result) => {
                    info!(attempt, rows = result.row_count(), "Query executed");
                    return RepairOutcome::Answered {
                        result,
                        sql: state.current_sql,
                        retry_count: state.retry_count,
                        conversation: state.conversation,
                    };
                }
                Err(error) => error,
            };

            self.observer.notify(&PipelineEvent::FallbackErrorSet {
                attempt,
                error: error.message.clone(),
            });

            if state.is_stagnant() {
                info!(attempt, "Same query failed twice in a row, switching to error analysis");
                return escalate(state, error, EscalationReason::Stagnated);
            }

            if state.retry_count >= self.max_retries {
                info!(
                    attempt,
                    error = %error,
                    "Exceeded maximum number of retries, switching to error analysis"
                );
                return escalate(state, error, EscalationReason::Exhausted);
            }

            warn!(
                error = %error,
                "SQL execution failed, retrying ({}/{})",
                state.retry_count + 1,
                self.max_retries
            );

            let tried = state.current_sql.clone();
            match self.request_repair(&mut state, question, &error, schema).await {
                Ok(fixed) => {
                    debug!(original = %tried, repaired = %fixed, "Repair received");
                    state.current_sql = fixed;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Repair request failed, retrying unchanged query ({}/{})",
                        state.retry_count + 1,
                        self.max_retries
                    );
                }
            }
            state.last_attempted = Some(tried);
            state.retry_count += 1;
        }
    }

    /// Ask for a corrected query. The user turn stays in the conversation
    /// even when the request fails; the assistant turn is only added on
    /// success.
    async fn request_repair(
        &self,
        state: &mut RetryState,
        question: &str,
        error: &SqlExecutionError,
        schema: &SchemaTable,
    ) -> Result<String, querysmith_core::ProviderError> {
        let fixed = if state.retry_count == 0 {
            let directive =
                first_repair_directive(question, &state.current_sql, &error.message, schema);
            state.conversation.push(Message::user(directive.clone()));
            self.client.prompt_on_directive(&directive).await?
        } else {
            state
                .conversation
                .push(Message::user(follow_up_directive(&error.message)));
            self.client.prompt_on_conversation(&state.conversation).await?
        };

        state.conversation.push(Message::assistant(fixed.clone()));
        Ok(fixed)
    }
}

fn escalate(state: RetryState, error: SqlExecutionError, reason: EscalationReason) -> RepairOutcome {
    RepairOutcome::Escalated(Escalation {
        reason,
        sql: state.current_sql,
        error,
        retry_count: state.retry_count,
        conversation: state.conversation,
    })
}
