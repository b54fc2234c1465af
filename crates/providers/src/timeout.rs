//! Call-level timeout around any provider.
//!
//! The pipeline itself never waits on a clock; every completion call made
//! through a [`TimeoutProvider`] is bounded instead.

use async_trait::async_trait;
use querysmith_core::error::ProviderError;
use querysmith_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Wraps a provider and fails any call that outlives `timeout`.
pub struct TimeoutProvider {
    inner: Arc<dyn querysmith_core::Provider>,
    timeout: Duration,
}

impl TimeoutProvider {
    pub fn new(inner: Arc<dyn querysmith_core::Provider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl querysmith_core::Provider for TimeoutProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = %self.inner.name(),
                    timeout_secs = self.timeout.as_secs(),
                    "Completion timed out"
                );
                Err(ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.inner.name(),
                    self.timeout.as_secs()
                )))
            }
        }
    }
}
