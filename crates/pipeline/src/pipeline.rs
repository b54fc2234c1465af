//! The question-answering pipeline.
//!
//! Filter the schema, generate a query, run it through the repair loop, and
//! fall back to error analysis when the loop gives up. Execution failures
//! never surface as errors: the worst outcome is [`Answer::Unanswerable`].

use std::fmt;
use std::sync::Arc;

use querysmith_config::AppConfig;
use querysmith_core::database::{Database, QueryResult};
use querysmith_core::event::{EventObserver, NoopObserver, PipelineEvent};
use querysmith_core::provider::Provider;
use querysmith_core::schema::SchemaTable;
use tracing::info;

use crate::analysis::{AnalysisOutcome, AnalysisReport, ErrorAnalysis};
use crate::completion::CompletionClient;
use crate::filter::{FilteredSchema, SchemaFilter};
use crate::generator::generate_sql;
use crate::repair::{Escalation, MAX_REPAIR_ATTEMPTS, RepairLoop, RepairOutcome};
use crate::token::TokenBudget;

pub const UNABLE_TO_ANSWER: &str = "Unable to answer.";

/// The final answer to a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Rows(QueryResult),
    Unanswerable,
}

impl Answer {
    pub fn is_answered(&self) -> bool {
        matches!(self, Self::Rows(_))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows(result) => f.write_str(&result.render()),
            Self::Unanswerable => f.write_str(UNABLE_TO_ANSWER),
        }
    }
}

/// Every intermediate artifact of answering one question.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub question: String,
    pub filtered: FilteredSchema,
    pub initial_sql: String,
    /// The query that produced the answer, if any did
    pub final_sql: Option<String>,
    /// Repair attempts made before success or escalation
    pub retry_count: u32,
    pub escalation: Option<Escalation>,
    pub analysis: Option<AnalysisReport>,
    pub answer: Answer,
}

/// Answers natural-language questions against one database.
pub struct Pipeline {
    client: CompletionClient,
    db: Arc<dyn Database>,
    budget: TokenBudget,
    observer: Arc<dyn EventObserver>,
    max_retries: u32,
}

impl Pipeline {
    pub fn new(provider: Arc<dyn Provider>, db: Arc<dyn Database>, model: impl Into<String>) -> Self {
        Self {
            client: CompletionClient::new(provider, model),
            db,
            budget: TokenBudget::default(),
            observer: Arc::new(NoopObserver),
            max_retries: MAX_REPAIR_ATTEMPTS,
        }
    }

    /// Model, temperature, budget and repair cap taken from `config`.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>, db: Arc<dyn Database>) -> Self {
        let mut pipeline = Self::new(provider, db, config.default_model.clone())
            .with_budget(TokenBudget::from_config(&config.budget))
            .with_max_retries(config.repair.max_retries);
        pipeline.client = pipeline.client.with_temperature(config.temperature);
        pipeline
    }

    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.min(MAX_REPAIR_ATTEMPTS);
        self
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Answer `question` using `schema` as the description of the database.
    ///
    /// Errors only come from the filter and generation stages (completion
    /// failures, unusable selections, an exhausted budget).
    pub async fn answer(
        &self,
        question: &str,
        schema: &SchemaTable,
    ) -> querysmith_core::Result<PipelineReport> {
        info!(question = %question, schema_rows = schema.len(), "Answering question");
        let observer = self.observer.as_ref();

        let filtered = SchemaFilter::new(&self.client, &self.budget, observer)
            .filter(schema, question)
            .await?;

        let initial_sql = generate_sql(&self.client, question, &filtered.merged, observer).await?;

        let outcome = RepairLoop::new(&self.client, self.db.as_ref(), observer)
            .with_max_retries(self.max_retries)
            .run(&initial_sql, question, &filtered.merged)
            .await;

        let report = match outcome {
            RepairOutcome::Answered {
                result,
                sql,
                retry_count,
                ..
            } => PipelineReport {
                question: question.to_string(),
                filtered,
                initial_sql,
                final_sql: Some(sql),
                retry_count,
                escalation: None,
                analysis: None,
                answer: Answer::Rows(result),
            },
            RepairOutcome::Escalated(escalation) => {
                info!(reason = ?escalation.reason, retries = escalation.retry_count, "Escalating to error analysis");
                let analysis = ErrorAnalysis::new(&self.client, self.db.as_ref(), observer)
                    .run(question, &escalation.sql, &escalation.error.message, &filtered.merged)
                    .await;

                let (answer, final_sql) = match &analysis.outcome {
                    AnalysisOutcome::Answered(result) => {
                        (Answer::Rows(result.clone()), analysis.final_sql.clone())
                    }
                    AnalysisOutcome::Unanswerable { .. } => (Answer::Unanswerable, None),
                };

                PipelineReport {
                    question: question.to_string(),
                    filtered,
                    initial_sql,
                    final_sql,
                    retry_count: escalation.retry_count,
                    escalation: Some(escalation),
                    analysis: Some(analysis),
                    answer,
                }
            }
        };

        observer.notify(&PipelineEvent::AnswerSet {
            answered: report.answer.is_answered(),
            text: report.answer.to_string(),
        });
        Ok(report)
    }
}
