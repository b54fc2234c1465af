//! Completion provider implementations for QuerySmith.
//!
//! All providers implement the `querysmith_core::Provider` trait.
//! The router builds the configured provider and bounds every call with a
//! timeout.

pub mod openai_compat;
pub mod router;
pub mod timeout;

pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;
pub use timeout::TimeoutProvider;
