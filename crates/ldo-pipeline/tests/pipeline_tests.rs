//! End-to-end pipeline runs against a mock provider and SQLite files

use ldo_domain::traits::{DocumentSource, SchemaIntrospector};
use ldo_domain::{DocumentState, DocumentUnit, TableSchema};
use ldo_extractor::{ExtractorConfig, FsDocumentSource};
use ldo_llm::MockProvider;
use ldo_pipeline::{PipelineConfig, PipelineError, PipelineOrchestrator, PolicyViolation, RunPolicy};
use ldo_store::{BatchInserter, ConnectionPool, SqliteIntrospector, StoreConfig};
use ldo_validation::GoldSet;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

type Orchestrator = PipelineOrchestrator<MockProvider, FsDocumentSource, BatchInserter>;

const ORDERS_DDL: &str = "
    CREATE TABLE orders (
        id INTEGER PRIMARY KEY,
        customer TEXT NOT NULL,
        amount DECIMAL(10,2)
    );";

struct Fixture {
    dir: TempDir,
    pool: Arc<ConnectionPool>,
    schema: TableSchema,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let pool = ConnectionPool::open(&StoreConfig::with_path(dir.path().join("orders.db"))).unwrap();
    pool.get().unwrap().execute_batch(ORDERS_DDL).unwrap();
    let pool = Arc::new(pool);
    let schema = SqliteIntrospector::new(Arc::clone(&pool))
        .describe_table("orders")
        .unwrap();
    Fixture { dir, pool, schema }
}

fn fast_extraction() -> ExtractorConfig {
    ExtractorConfig {
        requests_per_second: 100,
        max_attempts: 2,
        initial_retry_delay_ms: 5,
        ..Default::default()
    }
}

fn orchestrator(fixture: &Fixture, provider: &Arc<MockProvider>, config: PipelineConfig) -> Orchestrator {
    PipelineOrchestrator::new(
        config,
        &fast_extraction(),
        fixture.schema.clone(),
        Arc::clone(provider),
        Arc::new(FsDocumentSource::new()),
        Arc::new(BatchInserter::new(Arc::clone(&fixture.pool), false)),
    )
    .unwrap()
}

fn document(index: usize, text: &str) -> DocumentUnit {
    DocumentUnit::new(index, format!("doc{}.txt", index), text).with_metadata("extension", "txt")
}

fn order_count(fixture: &Fixture) -> i64 {
    fixture
        .pool
        .get()
        .unwrap()
        .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))
        .unwrap()
}

#[tokio::test]
async fn test_documents_are_inserted() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new("[]"));
    provider.add_response("Ann paid", r#"```json
[{"customer": "Ann", "amount": 10.5}]
```"#);
    provider.add_response("Bob paid", r#"[{"customer": "Bob", "amount": 3.5}, {"customer": "Cy", "amount": 7.25}]"#);

    let summary = orchestrator(&fixture, &provider, PipelineConfig::default())
        .run(vec![document(0, "Ann paid 10.50"), document(1, "Bob paid 3.50, Cy paid 7.25")])
        .await
        .unwrap();

    assert_eq!(summary.documents, 2);
    assert_eq!(summary.inserted(), 2);
    assert_eq!(summary.rows_inserted, 3);
    assert_eq!(order_count(&fixture), 3);
    assert_eq!(provider.summarize_calls(), 2);
    assert_eq!(provider.extract_calls(), 2);

    let outcome = &summary.outcomes[1];
    assert_eq!(outcome.state, DocumentState::Inserted);
    assert_eq!(outcome.rows_inserted, 2);
    let report = outcome.report.as_ref().unwrap();
    assert_eq!(report.conformity_rate, 1.0);
    assert!(outcome.gate.as_ref().unwrap().is_accepted());
    assert!(summary.is_success(&RunPolicy { strict: true, max_rejected_documents: Some(0) }));
}

#[tokio::test]
async fn test_unrelated_document_is_rejected() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new(r#"[{"customer": "Ann", "amount": 1}]"#));
    provider.add_summary("weather", "INVALID_PARSING");

    let summary = orchestrator(&fixture, &provider, PipelineConfig::default())
        .run(vec![
            document(0, "Ann paid 1"),
            document(1, "The weather is sunny"),
            document(2, "Ann paid 1 again"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.rejected(), 1);
    assert_eq!(summary.inserted(), 2);
    // Rejected documents are never parsed
    assert_eq!(provider.extract_calls(), 2);

    let states: Vec<DocumentState> = summary.outcomes.iter().map(|o| o.state).collect();
    assert_eq!(
        states,
        vec![DocumentState::Inserted, DocumentState::Rejected, DocumentState::Inserted]
    );
    assert!(summary.outcomes[1].failure.is_some());

    let policy = RunPolicy { strict: false, max_rejected_documents: Some(0) };
    assert_eq!(
        summary.policy_violations(&policy),
        vec![PolicyViolation::TooManyRejected { rejected: 1, allowed: 0 }]
    );
}

#[tokio::test]
async fn test_stop_if_invalidated_document() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new("[]"));
    provider.add_summary("weather", "INVALID_PARSING");

    let config = PipelineConfig {
        stop_if_invalidated_document: true,
        ..Default::default()
    };
    let result = orchestrator(&fixture, &provider, config)
        .run(vec![document(0, "Ann paid 1"), document(1, "The weather is sunny")])
        .await;

    match result {
        Err(PipelineError::RejectedDocument { index, document, .. }) => {
            assert_eq!(index, 1);
            assert_eq!(document, "doc1.txt");
        }
        other => panic!("Expected rejected document error, got {:?}", other),
    }
    assert_eq!(provider.extract_calls(), 0);
    assert_eq!(order_count(&fixture), 0);
}

#[tokio::test(start_paused = true)]
async fn test_worker_join_timeout_aborts_run() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new(r#"[{"customer": "Ann", "amount": 1.5}]"#));
    provider.add_stall("hangs");
    provider.add_error("broken");

    let extraction = ExtractorConfig {
        worker_join_timeout_secs: 2,
        ..fast_extraction()
    };
    let orchestrator = PipelineOrchestrator::new(
        PipelineConfig::default(),
        &extraction,
        fixture.schema.clone(),
        Arc::clone(&provider),
        Arc::new(FsDocumentSource::new()),
        Arc::new(BatchInserter::new(Arc::clone(&fixture.pool), false)),
    )
    .unwrap();

    // Two line segments: the second fails, the first never answers
    let text = format!("this page hangs {}\na broken line {}", "x".repeat(900), "y".repeat(900));
    let result = orchestrator
        .run(vec![document(0, "Ann paid 1.50"), document(1, &text)])
        .await;

    match result {
        Err(PipelineError::JoinTimeout(timeout)) => assert_eq!(timeout, Duration::from_secs(2)),
        other => panic!("Expected join timeout, got {:?}", other),
    }
    assert_eq!(order_count(&fixture), 0);
}

#[tokio::test]
async fn test_exhausted_segment_fails_document() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new(r#"[{"customer": "Ann", "amount": 1}]"#));
    provider.add_error("broken");

    let summary = orchestrator(&fixture, &provider, PipelineConfig::default())
        .run(vec![document(0, "a broken page"), document(1, "Ann paid 1")])
        .await
        .unwrap();

    assert_eq!(summary.parse_failed(), 1);
    assert_eq!(summary.inserted(), 1);
    let failed = &summary.outcomes[0];
    assert_eq!(failed.state, DocumentState::ParseFailed);
    assert!(failed.failure.as_deref().unwrap().contains("segment 0"));
    assert!(failed.report.is_none());
    assert_eq!(order_count(&fixture), 1);
}

#[tokio::test]
async fn test_insert_failure_and_strict_policy() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new(r#"[{"customer": "Ann", "amount": 1.5}]"#));
    provider.add_response("nameless", r#"[{"amount": 4.5}]"#);

    let summary = orchestrator(&fixture, &provider, PipelineConfig::default())
        .run(vec![document(0, "Ann paid 1"), document(1, "a nameless payment of 4")])
        .await
        .unwrap();

    let failed = &summary.outcomes[1];
    assert_eq!(failed.state, DocumentState::InsertFailed);
    assert!(failed.failure.is_some());
    assert!(failed.gate_rejected());
    assert_eq!(failed.report.as_ref().unwrap().missing_mandatory_fields.len(), 1);
    assert_eq!(order_count(&fixture), 1);

    assert!(summary.is_success(&RunPolicy::default()));
    let strict = RunPolicy { strict: true, max_rejected_documents: None };
    assert_eq!(
        summary.policy_violations(&strict),
        vec![
            PolicyViolation::InsertFailures { count: 1 },
            PolicyViolation::GateRejections { count: 1 },
        ]
    );
}

#[tokio::test]
async fn test_document_without_rows_counts_as_empty() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new("No rows here."));

    let summary = orchestrator(&fixture, &provider, PipelineConfig::default())
        .run(vec![document(0, "Nothing relevant but on topic")])
        .await
        .unwrap();

    assert_eq!(summary.inserted(), 1);
    assert_eq!(summary.empty_documents, 1);
    assert_eq!(summary.rows_inserted, 0);
    assert!(summary.outcomes[0].gate.as_ref().unwrap().is_accepted());
}

#[tokio::test]
async fn test_gold_set_scoring() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new("[]"));
    provider.add_response("Jon", r#"[{"customer": "Jon Smith", "amount": 12}]"#);

    let gold = GoldSet::new(vec![json!([{"customer": "John Smith", "amount": 12}])]);
    let summary = orchestrator(&fixture, &provider, PipelineConfig::default())
        .with_gold_set(gold)
        .run(vec![document(0, "Jon Smith paid 12")])
        .await
        .unwrap();

    let metrics = summary.outcomes[0].report.as_ref().unwrap().gold.clone().unwrap();
    assert_eq!(metrics.precision, 1.0);
    assert_eq!(metrics.recall, 1.0);
    assert!(metrics.jaccard_similarity < 1.0);
}

#[tokio::test]
async fn test_gold_set_must_cover_documents() {
    let fixture = fixture();
    let provider = Arc::new(MockProvider::new(r#"[{"customer": "Ann", "amount": 1}]"#));

    let result = orchestrator(&fixture, &provider, PipelineConfig::default())
        .with_gold_set(GoldSet::new(vec![json!([])]))
        .run(vec![document(0, "Ann paid 1"), document(1, "Ann paid 1 again")])
        .await;

    assert!(matches!(result, Err(PipelineError::Validation(_))));
    assert_eq!(order_count(&fixture), 0);
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected() {
    let fixture = fixture();
    let config = PipelineConfig {
        max_etl_processors: 0,
        ..Default::default()
    };
    let result = PipelineOrchestrator::new(
        config,
        &ExtractorConfig::default(),
        fixture.schema.clone(),
        Arc::new(MockProvider::default()),
        Arc::new(FsDocumentSource::new()),
        Arc::new(BatchInserter::new(Arc::clone(&fixture.pool), false)),
    );
    assert!(matches!(result, Err(PipelineError::Configuration(_))));
}

#[tokio::test]
async fn test_folder_run() {
    let fixture = fixture();
    let inbox = fixture.dir.path().join("inbox");
    fs::create_dir(&inbox).unwrap();
    fs::write(inbox.join("a.txt"), "Ann paid 10\nsee https://example.com/receipt\n").unwrap();
    fs::write(inbox.join("b.csv"), "customer,amount\nBob,3\n").unwrap();
    fs::write(inbox.join("scan.pdf"), "binary").unwrap();

    let provider = Arc::new(MockProvider::new("[]"));
    provider.add_response("Ann paid", r#"[{"customer": "Ann", "amount": 10}]"#);
    provider.add_response("Bob,3", r#"[{"customer": "Bob", "amount": 3}]"#);
    provider.add_response("example.com", "should never be sent");

    let source = FsDocumentSource::new();
    let documents = source.load_documents(&inbox).unwrap();
    assert_eq!(documents.len(), 2);

    let summary = orchestrator(&fixture, &provider, PipelineConfig::default())
        .run(documents)
        .await
        .unwrap();

    assert_eq!(summary.inserted(), 2);
    assert_eq!(summary.rows_inserted, 2);
    assert!(summary.outcomes[0].source.ends_with("a.txt"));
    assert!(summary.outcomes[1].source.ends_with("b.csv"));
}
