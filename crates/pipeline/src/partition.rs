//! Token-bounded partitioning of the schema table.
//!
//! Rows are packed greedily, in order, into partitions whose summed row cost
//! stays within the budget. A single row that alone exceeds the budget gets
//! a partition of its own.

use querysmith_core::schema::{SchemaRow, SchemaTable};
use tracing::debug;

use crate::token::TokenEstimator;

/// A contiguous run of schema rows sized for one completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    rows: SchemaTable,
    estimated_tokens: usize,
}

impl Partition {
    /// The rows, re-indexed from zero.
    pub fn rows(&self) -> &SchemaTable {
        &self.rows
    }

    pub fn into_rows(self) -> SchemaTable {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the per-row estimates that went into this partition.
    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }
}

/// Split `table` into ordered partitions under `budget` tokens each.
///
/// Each row is costed from its own one-line rendering (position prefix
/// included, no header). The budget may be zero or negative; callers that
/// care reject that first.
pub fn partition_by_tokens(
    table: &SchemaTable,
    budget: i64,
    estimator: &dyn TokenEstimator,
) -> Vec<Partition> {
    let mut partitions = Vec::new();
    let mut current: Vec<SchemaRow> = Vec::new();
    let mut current_tokens: usize = 0;

    for (index, row) in table.iter().enumerate() {
        let cost = estimator.estimate(&row.render(index));
        let projected = i64::try_from(current_tokens.saturating_add(cost)).unwrap_or(i64::MAX);

        if projected > budget {
            if !current.is_empty() {
                partitions.push(Partition {
                    rows: SchemaTable::from_rows(std::mem::take(&mut current)),
                    estimated_tokens: current_tokens,
                });
            }
            current.push(row.clone());
            current_tokens = cost;
        } else {
            current.push(row.clone());
            current_tokens += cost;
        }
    }

    if !current.is_empty() {
        partitions.push(Partition {
            rows: SchemaTable::from_rows(current),
            estimated_tokens: current_tokens,
        });
    }

    debug!(
        rows = table.len(),
        budget,
        partitions = partitions.len(),
        "Schema partitioned by token count"
    );
    partitions
}
