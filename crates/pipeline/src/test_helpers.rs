//! Shared test helpers: scripted completion and execution services.

use std::sync::Mutex;

use querysmith_core::database::{Database, QueryResult};
use querysmith_core::error::{ProviderError, SqlExecutionError};
use querysmith_core::message::Message;
use querysmith_core::provider::{Provider, ProviderRequest, ProviderResponse};
use querysmith_core::schema::{SchemaRow, SchemaTable};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses
/// provided.
pub struct SequentialMockProvider {
    responses: Vec<Result<String, ProviderError>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        if call >= self.responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                call,
                self.responses.len()
            );
        }
        requests.push(request);

        self.responses[call].clone().map(|text| ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: "mock-model".into(),
        })
    }
}

type Handler = Box<dyn Fn(&str) -> Result<QueryResult, SqlExecutionError> + Send + Sync>;

/// A database whose behaviour is a function of the SQL text.
pub struct ScriptedDatabase {
    handler: Handler,
    executed: Mutex<Vec<String>>,
}

impl ScriptedDatabase {
    pub fn new(
        handler: impl Fn(&str) -> Result<QueryResult, SqlExecutionError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Every statement fails with `message`.
    pub fn always_failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(SqlExecutionError::new(message.clone())))
    }

    /// Only `good_sql` succeeds, returning `result`.
    pub fn accepting(good_sql: &str, result: QueryResult) -> Self {
        let good_sql = good_sql.to_string();
        Self::new(move |sql| {
            if sql == good_sql {
                Ok(result.clone())
            } else {
                Err(SqlExecutionError::new(format!("syntax error at or near \"{sql}\"")))
            }
        })
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Database for ScriptedDatabase {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult, SqlExecutionError> {
        self.executed.lock().unwrap().push(sql.to_string());
        (self.handler)(sql)
    }
}

/// A small film-rental schema.
pub fn rental_schema() -> SchemaTable {
    SchemaTable::from_rows(vec![
        SchemaRow::new("actor", "actor_id", "integer"),
        SchemaRow::new("actor", "first_name", "text"),
        SchemaRow::new("film", "film_id", "integer"),
        SchemaRow::new("film", "title", "text"),
        SchemaRow::new("film_actor", "actor_id", "integer"),
        SchemaRow::new("film_actor", "film_id", "integer"),
    ])
}

/// A one-column, one-row result.
pub fn single_value(column: &str, value: serde_json::Value) -> QueryResult {
    QueryResult::new(vec![column.into()], vec![vec![value]])
}
