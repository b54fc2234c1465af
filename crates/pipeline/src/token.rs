//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, rounded up.
//! Close enough to BPE tokenizers on English text and schema listings to
//! size partitions, and cheap enough to run once per schema row.

use std::sync::Arc;

use querysmith_config::BudgetConfig;
use querysmith_core::schema::SchemaTable;

/// Estimates how many tokens a piece of text costs.
///
/// Implementations must be monotonic: a longer text never costs fewer
/// tokens than a prefix of it.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// 1 token ≈ 4 characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        estimate_tokens(text)
    }
}

/// Estimate the token count for a string with the default heuristic.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// The model's context budget and how much of it a table may use.
#[derive(Clone)]
pub struct TokenBudget {
    total_tokens: usize,
    reserved_answer_tokens: usize,
    estimator: Arc<dyn TokenEstimator>,
}

impl TokenBudget {
    pub fn new(total_tokens: usize, reserved_answer_tokens: usize) -> Self {
        Self {
            total_tokens,
            reserved_answer_tokens,
            estimator: Arc::new(HeuristicEstimator),
        }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.total_tokens, config.reserved_answer_tokens)
    }

    /// Swap in a different estimator (e.g. a fixed-cost one in tests).
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn reserved_answer_tokens(&self) -> usize {
        self.reserved_answer_tokens
    }

    pub fn estimator(&self) -> &dyn TokenEstimator {
        self.estimator.as_ref()
    }

    pub fn estimate_tokens(&self, text: &str) -> usize {
        self.estimator.estimate(text)
    }

    /// Tabular content is estimated from its rendered text.
    pub fn estimate_table(&self, table: &SchemaTable) -> usize {
        self.estimator.estimate(&table.render())
    }

    /// Tokens left for table content once `directive` and the answer
    /// allowance are paid for. May be zero or negative.
    pub fn compute_table_budget(&self, directive: &str) -> i64 {
        let directive_tokens = to_i64(self.estimate_tokens(directive));
        to_i64(self.total_tokens) - directive_tokens - to_i64(self.reserved_answer_tokens)
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self::from_config(&BudgetConfig::default())
    }
}

impl std::fmt::Debug for TokenBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBudget")
            .field("total_tokens", &self.total_tokens)
            .field("reserved_answer_tokens", &self.reserved_answer_tokens)
            .finish_non_exhaustive()
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
