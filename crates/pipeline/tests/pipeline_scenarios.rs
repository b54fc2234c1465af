//! End-to-end scenarios through `Pipeline` with scripted services.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use querysmith_core::{
    Database, EventRecorder, FilterPass, Message, PipelineEvent, Provider, ProviderError,
    ProviderRequest, ProviderResponse, QueryResult, SchemaRow, SchemaTable, SqlExecutionError,
};
use querysmith_pipeline::{
    Answer, EscalationReason, Pipeline, TokenBudget, TokenEstimator, partition_by_tokens,
};
use serde_json::json;

// --- scripted services ---

struct ScriptedProvider {
    responses: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let text = self
            .responses
            .get(requests.len())
            .cloned()
            .unwrap_or_else(|| panic!("no scripted response for call #{}", requests.len()));
        requests.push(request);
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model: "scripted-model".into(),
        })
    }
}

/// Succeeds only for `good_sql`; every other statement fails.
struct ScriptedDatabase {
    good_sql: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedDatabase {
    fn accepting(sql: &str) -> Arc<Self> {
        Arc::new(Self {
            good_sql: Some(sql.into()),
            executed: Mutex::new(Vec::new()),
        })
    }

    fn rejecting_everything() -> Arc<Self> {
        Arc::new(Self {
            good_sql: None,
            executed: Mutex::new(Vec::new()),
        })
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Database for ScriptedDatabase {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult, SqlExecutionError> {
        self.executed.lock().unwrap().push(sql.to_string());
        if self.good_sql.as_deref() == Some(sql) {
            Ok(QueryResult::new(vec!["count".into()], vec![vec![json!(16)]]))
        } else {
            Err(SqlExecutionError::new(format!("syntax error in: {sql}")))
        }
    }
}

struct FixedCost(usize);

impl TokenEstimator for FixedCost {
    fn estimate(&self, _text: &str) -> usize {
        self.0
    }
}

fn schema() -> SchemaTable {
    SchemaTable::from_rows(vec![
        SchemaRow::new("category", "category_id", "integer"),
        SchemaRow::new("category", "name", "text"),
        SchemaRow::new("film_category", "category_id", "integer"),
    ])
}

const ANALYSIS: [&str; 5] = ["summary", "intent", "error meaning", "schema changes", "steps"];

// --- scenarios ---

#[test]
fn scenario_1_three_rows_of_ten_tokens_under_cap_twenty_five() {
    let partitions = partition_by_tokens(&schema(), 25, &FixedCost(10));
    let sizes: Vec<usize> = partitions.iter().map(|p| p.len()).collect();
    assert_eq!(sizes, vec![2, 1]);
}

#[tokio::test]
async fn scenario_1_partitioning_drives_one_call_per_partition() {
    // Directive costs 10, so the table budget is 285 - 10 - 250 = 25
    let budget = TokenBudget::new(285, 250).with_estimator(Arc::new(FixedCost(10)));
    let provider = ScriptedProvider::new(&["[1]", "[0]", "[]", "[]", "SELECT count(*) FROM category;"]);
    let db = ScriptedDatabase::accepting("SELECT count(*) FROM category;");
    let recorder = Arc::new(EventRecorder::new());

    let report = Pipeline::new(provider.clone(), db, "m")
        .with_budget(budget)
        .with_observer(recorder.clone())
        .answer("How many categories are there?", &schema())
        .await
        .unwrap();

    assert!(report.answer.is_answered());
    assert_eq!(provider.call_count(), 5);
    let partitioned: Vec<(FilterPass, usize)> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e.event {
            PipelineEvent::SchemaPartitioned { pass, partitions } => Some((pass, partitions)),
            _ => None,
        })
        .collect();
    assert_eq!(partitioned, vec![(FilterPass::Data, 2), (FilterPass::Joins, 2)]);
}

#[tokio::test]
async fn scenario_2_persistent_failure_escalates_after_five_repairs() {
    let mut script = vec!["[0, 1]", "[2]", "SELECT 0"];
    script.extend(["SELECT 1", "SELECT 2", "SELECT 3", "SELECT 4", "SELECT 5"]);
    script.extend(ANALYSIS);
    script.push("SELECT count(*) FROM category;");
    let provider = ScriptedProvider::new(&script);
    let db = ScriptedDatabase::accepting("SELECT count(*) FROM category;");
    let recorder = Arc::new(EventRecorder::new());

    let report = Pipeline::new(provider.clone(), db.clone(), "m")
        .with_observer(recorder.clone())
        .answer("How many categories are there?", &schema())
        .await
        .unwrap();

    let escalation = report.escalation.as_ref().expect("should escalate");
    assert_eq!(escalation.reason, EscalationReason::Exhausted);
    assert_eq!(escalation.retry_count, 5);
    assert_eq!(escalation.sql, "SELECT 5");
    assert_eq!(db.executed().len(), 7);
    assert!(report.answer.is_answered());

    let names = recorder.names();
    assert!(names.contains(&"fallback_query_5_set".to_string()));
    assert!(!names.contains(&"fallback_query_6_set".to_string()));
    assert_eq!(names.last().map(String::as_str), Some("answer_set"));
}

#[tokio::test]
async fn scenario_3_repair_returning_same_query_escalates_at_once() {
    let mut script = vec!["[1]", "[]", "SELECT nme FROM category;", "SELECT nme FROM category;"];
    script.extend(ANALYSIS);
    script.push("SELECT count(*) FROM category;");
    let provider = ScriptedProvider::new(&script);
    let db = ScriptedDatabase::accepting("SELECT count(*) FROM category;");

    let report = Pipeline::new(provider.clone(), db.clone(), "m")
        .answer("How many categories are there?", &schema())
        .await
        .unwrap();

    let escalation = report.escalation.as_ref().expect("should escalate");
    assert_eq!(escalation.reason, EscalationReason::Stagnated);
    assert_eq!(escalation.retry_count, 1);
    assert_eq!(
        db.executed(),
        vec![
            "SELECT nme FROM category;",
            "SELECT nme FROM category;",
            "SELECT count(*) FROM category;",
        ]
    );
    assert_eq!(provider.call_count(), script.len());
}

#[tokio::test]
async fn scenario_4_failed_analysis_is_unable_to_answer() {
    let mut script = vec!["[1]", "[]", "SELECT 1", "SELECT 1"];
    script.extend(ANALYSIS);
    script.push("SELECT 2");
    let provider = ScriptedProvider::new(&script);
    let db = ScriptedDatabase::rejecting_everything();
    let recorder = Arc::new(EventRecorder::new());

    let report = Pipeline::new(provider, db, "m")
        .with_observer(recorder.clone())
        .answer("How many categories are there?", &schema())
        .await
        .expect("execution failures never surface as errors");

    assert_eq!(report.answer, Answer::Unanswerable);
    assert_eq!(report.answer.to_string(), "Unable to answer.");
    assert!(report.final_sql.is_none());

    let analysis = report.analysis.as_ref().unwrap();
    assert_eq!(analysis.responses.len(), 6);

    let last = recorder.events().pop().unwrap();
    assert_eq!(
        last.event,
        PipelineEvent::AnswerSet {
            answered: false,
            text: "Unable to answer.".into()
        }
    );
}

#[tokio::test]
async fn scenario_5_overlapping_selections_merge_without_duplicates() {
    let provider = ScriptedProvider::new(&["[1, 0]", "[0, 2, 1]", "SELECT count(*) FROM category;"]);
    let db = ScriptedDatabase::accepting("SELECT count(*) FROM category;");

    let report = Pipeline::new(provider, db, "m")
        .answer("How many films per category name?", &schema())
        .await
        .unwrap();

    assert_eq!(
        report.filtered.merged.rows(),
        &[
            SchemaRow::new("category", "name", "text"),
            SchemaRow::new("category", "category_id", "integer"),
            SchemaRow::new("film_category", "category_id", "integer"),
        ]
    );
    assert_eq!(report.filtered.for_joins.len(), 3);
}
