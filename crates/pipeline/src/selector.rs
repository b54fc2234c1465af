//! Row selection: ask the completion service which rows of each partition
//! matter, and collect them.

use querysmith_core::error::SelectionError;
use querysmith_core::schema::SchemaTable;
use tracing::debug;

use crate::completion::CompletionClient;
use crate::partition::Partition;

/// Parse a list literal of row indices such as `[0, 3, 7]`.
///
/// The first bracketed span is used, so a list wrapped in prose or a code
/// fence is accepted. Every element must be a non-negative integer.
pub fn parse_index_list(response: &str) -> Result<Vec<usize>, SelectionError> {
    let not_a_list = || SelectionError::NotAList {
        response: response.to_string(),
    };

    let start = response.find('[').ok_or_else(not_a_list)?;
    let len = response[start..].find(']').ok_or_else(not_a_list)?;
    let inner = &response[start + 1..start + len];

    inner
        .split(',')
        .map(str::trim)
        .filter(|element| !element.is_empty())
        .map(|element| {
            element
                .parse::<usize>()
                .map_err(|_| SelectionError::InvalidElement {
                    element: element.to_string(),
                })
        })
        .collect()
}

/// Run `directive` over every partition and merge the selected rows.
///
/// Indices are positions within each partition. The merged table keeps the
/// partitions' order, and within a partition the order of the response.
pub async fn select_rows(
    client: &CompletionClient,
    partitions: &[Partition],
    directive: &str,
) -> querysmith_core::Result<SchemaTable> {
    let mut selected = SchemaTable::new();

    for (n, partition) in partitions.iter().enumerate() {
        let response = client.prompt_on_table(directive, partition.rows()).await?;
        let indices = parse_index_list(&response)?;
        let rows = partition.rows().select(&indices)?;

        debug!(
            partition = n,
            offered = partition.len(),
            picked = rows.len(),
            "Rows selected"
        );
        selected.extend(rows.into_rows());
    }

    Ok(selected)
}
