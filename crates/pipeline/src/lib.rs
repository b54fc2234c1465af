//! # QuerySmith Pipeline
//!
//! Turns a natural-language question into an executed SQL query:
//!
//! 1. **Partition** the schema table into token-bounded chunks
//! 2. **Select** relevant rows from each chunk, once for the question's data
//!    and once for the joins those rows need
//! 3. **Generate** a SQL query from the filtered schema
//! 4. **Repair** the query on execution failure, with a bounded retry count
//!    and a guard against repairs that change nothing
//! 5. **Analyse** the failure in a six-step conversation when repair gives up
//!
//! Every stage talks to the outside world through the [`Provider`] and
//! [`Database`] traits and reports checkpoints to an injected
//! [`EventObserver`].
//!
//! [`Provider`]: querysmith_core::Provider
//! [`Database`]: querysmith_core::Database
//! [`EventObserver`]: querysmith_core::EventObserver

pub mod analysis;
pub mod completion;
pub mod filter;
pub mod generator;
pub mod partition;
pub mod pipeline;
pub mod questions;
pub mod repair;
pub mod selector;
pub mod token;

pub use analysis::{ANALYSIS_STEPS, AnalysisOutcome, AnalysisReport, ErrorAnalysis};
pub use completion::CompletionClient;
pub use filter::{FilteredSchema, SchemaFilter};
pub use generator::generate_sql;
pub use partition::{Partition, partition_by_tokens};
pub use pipeline::{Answer, Pipeline, PipelineReport, UNABLE_TO_ANSWER};
pub use questions::suggest_questions;
pub use repair::{
    Escalation, EscalationReason, MAX_REPAIR_ATTEMPTS, RepairLoop, RepairOutcome, RetryState,
};
pub use selector::{parse_index_list, select_rows};
pub use token::{HeuristicEstimator, TokenBudget, TokenEstimator, estimate_tokens};

#[cfg(test)]
pub(crate) mod test_helpers;
