//! # QuerySmith Core
//!
//! Domain types, traits, and error definitions for the QuerySmith
//! text-to-SQL pipeline. This crate has **no I/O of its own**: it defines the
//! schema model, the conversation model, and the two service seams the
//! pipeline talks through.
//!
//! ## Seams
//!
//! - [`Provider`]: the language-model completion service
//! - [`Database`]: the SQL execution service
//! - [`EventObserver`]: the checkpoint side-channel
//!
//! Implementations live in `querysmith-providers` and `querysmith-database`;
//! tests plug in scripted stand-ins.

pub mod database;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod schema;

// Re-export key types at crate root for ergonomics
pub use database::{Database, QueryResult};
pub use error::{
    BudgetError, DatabaseError, Error, ProviderError, Result, SelectionError, SqlExecutionError,
};
pub use event::{
    EventBus, EventObserver, EventRecorder, FilterPass, NoopObserver, PipelineEvent, RecordedEvent,
};
pub use message::{Conversation, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use schema::{SchemaRow, SchemaTable};
