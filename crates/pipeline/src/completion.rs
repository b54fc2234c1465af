//! Completion calls in the two shapes the pipeline uses: a directive with a
//! rendered table appended, and a full running conversation.

use std::sync::Arc;

use querysmith_core::error::ProviderError;
use querysmith_core::message::{Conversation, Message};
use querysmith_core::provider::{Provider, ProviderRequest};
use querysmith_core::schema::SchemaTable;
use tracing::debug;

/// How many characters of a prompt or response make it into debug logs.
pub const LOG_PREVIEW_CHARS: usize = 300;

/// Thin wrapper binding a provider to a model and sampling settings.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send `directive` followed by the rendered `table` as one user turn.
    pub async fn prompt_on_table(
        &self,
        directive: &str,
        table: &SchemaTable,
    ) -> Result<String, ProviderError> {
        let prompt = format!("{directive}{}", table.render());
        debug!(prompt = %truncate_content(directive, LOG_PREVIEW_CHARS), rows = table.len(), "PROMPT");
        self.complete(vec![Message::user(prompt)]).await
    }

    /// Send a single self-contained user turn.
    pub async fn prompt_on_directive(&self, directive: &str) -> Result<String, ProviderError> {
        debug!(prompt = %truncate_content(directive, LOG_PREVIEW_CHARS), "PROMPT");
        self.complete(vec![Message::user(directive)]).await
    }

    /// Send every turn of `conversation` in order.
    pub async fn prompt_on_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<String, ProviderError> {
        if let Some(last) = conversation.last() {
            debug!(
                turns = conversation.len(),
                prompt = %truncate_content(&last.content, LOG_PREVIEW_CHARS),
                "PROMPT"
            );
        }
        self.complete(conversation.messages().to_vec()).await
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<String, ProviderError> {
        let mut request = ProviderRequest::new(self.model.clone(), messages);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        let content = response.message.content;
        debug!(response = %truncate_content(&content, LOG_PREVIEW_CHARS), "RESPONSE");

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... [{} chars]", &text[..cut], text.chars().count()),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use querysmith_core::schema::SchemaRow;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_content("SELECT 1", 20), "SELECT 1");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let text = "é".repeat(10);
        let cut = truncate_content(&text, 4);
        assert!(cut.starts_with("éééé..."));
        assert!(cut.ends_with("[10 chars]"));
    }

    #[tokio::test]
    async fn table_is_appended_to_directive() {
        let provider = Arc::new(SequentialMockProvider::texts(&["[0]"]));
        let client = CompletionClient::new(provider.clone(), "mock-model");
        let table = SchemaTable::from_rows(vec![SchemaRow::new("film", "title", "text")]);

        let response = client.prompt_on_table("Pick rows:\n", &table).await.unwrap();
        assert_eq!(response, "[0]");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(
            requests[0].messages[0].content,
            format!("Pick rows:\n{}", table.render())
        );
        assert_eq!(requests[0].model, "mock-model");
        assert_eq!(requests[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn conversation_is_sent_whole() {
        let provider = Arc::new(SequentialMockProvider::texts(&["third"]));
        let client = CompletionClient::new(provider.clone(), "m");
        let mut conversation = Conversation::new();
        conversation.push(Message::user("first"));
        conversation.push(Message::assistant("second"));
        conversation.push(Message::user("again"));

        client.prompt_on_conversation(&conversation).await.unwrap();
        assert_eq!(provider.requests()[0].messages.len(), 3);
    }

    #[tokio::test]
    async fn blank_response_is_an_error() {
        let provider = Arc::new(SequentialMockProvider::texts(&["   \n"]));
        let client = CompletionClient::new(provider, "m");
        let err = client.prompt_on_directive("fix it").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn provider_errors_pass_through() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(
            ProviderError::Network("connection reset".into()),
        )]));
        let client = CompletionClient::new(provider, "m");
        let err = client.prompt_on_directive("hi").await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
