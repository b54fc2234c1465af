//! Pipeline checkpoints: an observer side-channel.
//!
//! The pipeline reports what it is doing through an [`EventObserver`] that
//! the caller passes in. Observers never influence control flow; a pipeline
//! built with [`NoopObserver`] behaves exactly like one with subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Which schema-filter pass produced a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPass {
    /// Rows related to the question's data
    Data,
    /// Rows needed to join the data rows
    Joins,
}

/// All checkpoints emitted while answering one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// The schema was split into token-bounded partitions for a filter pass
    SchemaPartitioned { pass: FilterPass, partitions: usize },

    /// Both filter passes finished
    SchemaFiltered {
        data_rows: usize,
        join_rows: usize,
        total_rows: usize,
    },

    /// The first SQL query was generated
    InitialQuerySet { sql: String },

    /// A query is about to be executed by the repair loop
    FallbackQuerySet { attempt: u32, sql: String },

    /// Executing that query failed
    FallbackErrorSet { attempt: u32, error: String },

    /// One step of the error-analysis conversation produced content
    ErrorAnalysisContentSet { step: u8, content: String },

    /// The pipeline reached its final answer
    AnswerSet { answered: bool, text: String },
}

impl PipelineEvent {
    /// Stable checkpoint name, e.g. `fallback_query_2_set`.
    pub fn name(&self) -> String {
        match self {
            Self::SchemaPartitioned { pass, .. } => match pass {
                FilterPass::Data => "schema_partitions_data_set".into(),
                FilterPass::Joins => "schema_partitions_joins_set".into(),
            },
            Self::SchemaFiltered { .. } => "filtered_schema_set".into(),
            Self::InitialQuerySet { .. } => "initial_sql_query_set".into(),
            Self::FallbackQuerySet { attempt, .. } => format!("fallback_query_{attempt}_set"),
            Self::FallbackErrorSet { attempt, .. } => format!("fallback_exception_{attempt}_set"),
            Self::ErrorAnalysisContentSet { step, .. } => {
                format!("error_analysis_content_{step}_set")
            }
            Self::AnswerSet { .. } => "answer_set".into(),
        }
    }
}

/// Receives pipeline checkpoints.
pub trait EventObserver: Send + Sync {
    fn notify(&self, event: &PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EventObserver for NoopObserver {
    fn notify(&self, _event: &PipelineEvent) {}
}

/// A broadcast-based event bus for pipeline events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Subscribers that
/// fall behind lose the oldest events; the publisher never blocks.
pub struct EventBus {
    sender: broadcast::Sender<Arc<PipelineEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: PipelineEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<PipelineEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventObserver for EventBus {
    fn notify(&self, event: &PipelineEvent) {
        self.publish(event.clone());
    }
}

/// A checkpoint with the time it was observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub name: String,
    pub at: DateTime<Utc>,
    pub event: PipelineEvent,
}

/// Keeps every event in arrival order, for traces and tests.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Checkpoint names in arrival order.
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    /// Pretty-printed JSON array of the recorded events.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.events())
    }
}

impl EventObserver for EventRecorder {
    fn notify(&self, event: &PipelineEvent) {
        let recorded = RecordedEvent {
            name: event.name(),
            at: Utc::now(),
            event: event.clone(),
        };
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(recorded);
    }
}
