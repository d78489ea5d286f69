//! Drives documents through summarize, parse, score and insert

use crate::{DocumentOutcome, PipelineConfig, PipelineError, RunSummary};
use ldo_domain::traits::{DocumentSource, ExtractionService, RowSink};
use ldo_domain::{is_invalid_summary, DocumentState, DocumentUnit, TableSchema};
use ldo_extractor::{DocumentExtractor, ExtractorConfig, ExtractorError};
use ldo_validation::{GoldSet, QualityGate, ValidationConfig, ValidationEngine};
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Runs a batch of documents against one target table
///
/// Each document is owned by exactly one stage task at a time. Documents
/// that fail a stage are recorded and leave the run; only configuration
/// errors and stage timeouts abort it.
///
/// # Examples
///
/// ```no_run
/// use ldo_extractor::{ExtractorConfig, FsDocumentSource};
/// use ldo_llm::MockProvider;
/// use ldo_pipeline::{PipelineConfig, PipelineOrchestrator, RunPolicy};
/// use ldo_domain::traits::{DocumentSource, SchemaIntrospector};
/// use ldo_store::{BatchInserter, ConnectionPool, SqliteIntrospector, StoreConfig};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = Arc::new(ConnectionPool::open(&StoreConfig::default())?);
/// let schema = SqliteIntrospector::new(Arc::clone(&pool)).describe_table("people")?;
/// let source = Arc::new(FsDocumentSource::new());
/// let documents = source.load_documents(Path::new("inbox"))?;
///
/// let config = PipelineConfig::default();
/// let policy = RunPolicy::from_config(&config);
/// let orchestrator = PipelineOrchestrator::new(
///     config,
///     &ExtractorConfig::default(),
///     schema,
///     Arc::new(MockProvider::default()),
///     source,
///     Arc::new(BatchInserter::new(pool, false)),
/// )?;
///
/// let summary = orchestrator.run(documents).await?;
/// println!("{}", summary.summary());
/// assert!(summary.is_success(&policy));
/// # Ok(())
/// # }
/// ```
pub struct PipelineOrchestrator<E: ExtractionService + ?Sized, S, K> {
    config: PipelineConfig,
    schema: Arc<TableSchema>,
    schema_json: Arc<str>,
    service: Arc<E>,
    extractor: Arc<DocumentExtractor<E>>,
    source: Arc<S>,
    sink: Arc<K>,
    engine: ValidationEngine,
    gate: QualityGate,
    gold: Option<GoldSet>,
}

impl<E, S, K> PipelineOrchestrator<E, S, K>
where
    E: ExtractionService + ?Sized + 'static,
    S: DocumentSource + 'static,
    K: RowSink + 'static,
    K::Error: Display,
{
    /// Create an orchestrator; fails on invalid configuration
    pub fn new(
        config: PipelineConfig,
        extraction: &ExtractorConfig,
        schema: TableSchema,
        service: Arc<E>,
        source: Arc<S>,
        sink: Arc<K>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Configuration)?;
        extraction.validate().map_err(PipelineError::Configuration)?;
        if schema.columns.is_empty() {
            return Err(PipelineError::Configuration(format!(
                "table {} has no columns",
                schema.name
            )));
        }

        let extractor = Arc::new(DocumentExtractor::new(Arc::clone(&service), extraction));
        let schema_json: Arc<str> = Arc::from(schema.to_prompt_json());

        Ok(Self {
            config,
            schema: Arc::new(schema),
            schema_json,
            service,
            extractor,
            source,
            sink,
            engine: ValidationEngine::default(),
            gate: QualityGate::default(),
            gold: None,
        })
    }

    /// Score and gate with the given validation settings
    pub fn with_validation(mut self, config: ValidationConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Configuration)?;
        self.engine = ValidationEngine::new(config.clone());
        self.gate = QualityGate::new(config);
        Ok(self)
    }

    /// Compare every surviving document with its gold entry
    pub fn with_gold_set(mut self, gold: GoldSet) -> Self {
        self.gold = Some(gold);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Target table
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Run every document through the four stages
    pub async fn run(&self, documents: Vec<DocumentUnit>) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        let mut summary = RunSummary::new();

        info!(
            table = %self.schema.name,
            documents = documents.len(),
            provider = self.service.name(),
            "Pipeline run started"
        );

        let valid = self.summarize_stage(documents, &mut summary).await?;
        let parsed = self.parse_stage(valid, &mut summary).await?;
        let scored = self.score_stage(parsed)?;
        self.insert_stage(scored, &mut summary).await?;

        summary.finish(started.elapsed());
        info!(
            documents = summary.documents,
            inserted = summary.inserted(),
            rejected = summary.rejected(),
            parse_failed = summary.parse_failed(),
            insert_failed = summary.insert_failed(),
            rows = summary.rows_inserted,
            elapsed_ms = summary.elapsed_ms,
            "Pipeline run finished"
        );
        Ok(summary)
    }

    async fn summarize_stage(
        &self,
        documents: Vec<DocumentUnit>,
        summary: &mut RunSummary,
    ) -> Result<Vec<DocumentUnit>, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_etl_processors));
        let mut tasks = JoinSet::new();

        for mut document in documents {
            let semaphore = Arc::clone(&semaphore);
            let service = Arc::clone(&self.service);
            let schema_json = Arc::clone(&self.schema_json);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                document.transition(DocumentState::Validating)?;

                match service.summarize(&schema_json, &document.context()).await {
                    Ok(answer) if is_invalid_summary(&answer) => {
                        warn!(document = document.index, source = %document.source, "Document unrelated to table");
                        document.fail(DocumentState::Rejected, "document unrelated to the table")?;
                    }
                    Ok(answer) => {
                        debug!(document = document.index, chars = answer.len(), "Document summarized");
                        document.summary = Some(answer);
                        document.transition(DocumentState::Valid)?;
                    }
                    Err(e) => {
                        warn!(document = document.index, error = %e, "Summarization failed");
                        document.fail(DocumentState::Rejected, format!("summarization failed: {}", e))?;
                    }
                }
                Ok::<_, PipelineError>(document)
            });
        }

        let documents = join_stage(tasks, "validation", self.config.validation_stage_timeout()).await?;

        let mut valid = Vec::with_capacity(documents.len());
        let mut first_rejected: Option<DocumentUnit> = None;
        for document in documents {
            if document.state() == DocumentState::Valid {
                valid.push(document);
                continue;
            }
            summary.record(DocumentOutcome::from_document(&document));
            if first_rejected.as_ref().is_none_or(|first| document.index < first.index) {
                first_rejected = Some(document);
            }
        }

        if let Some(document) = first_rejected.filter(|_| self.config.stop_if_invalidated_document) {
            return Err(PipelineError::RejectedDocument {
                index: document.index,
                document: document.source,
                reason: document.failure.unwrap_or_default(),
            });
        }

        info!(valid = valid.len(), rejected = summary.rejected(), "Validation stage finished");
        Ok(valid)
    }

    async fn parse_stage(
        &self,
        documents: Vec<DocumentUnit>,
        summary: &mut RunSummary,
    ) -> Result<Vec<DocumentUnit>, PipelineError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_etl_processors));
        let mut tasks = JoinSet::new();

        for mut document in documents {
            let semaphore = Arc::clone(&semaphore);
            let extractor = Arc::clone(&self.extractor);
            let source = Arc::clone(&self.source);
            let schema_json = Arc::clone(&self.schema_json);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                document.transition(DocumentState::Parsing)?;

                let segments = source.segment(&document);
                debug!(document = document.index, segments = segments.len(), "Document segmented");

                match extractor.parse(&schema_json, segments).await {
                    Ok(outcome) => {
                        document.parsed_payload = Some(outcome.into_value());
                        document.transition(DocumentState::Parsed)?;
                    }
                    Err(ExtractorError::JoinTimeout(timeout)) => {
                        return Err(PipelineError::JoinTimeout(timeout));
                    }
                    Err(e) => {
                        error!(document = document.index, source = %document.source, error = %e, "Document parse failed");
                        document.fail(DocumentState::ParseFailed, e.to_string())?;
                    }
                }
                Ok::<_, PipelineError>(document)
            });
        }

        let documents = join_stage(tasks, "parse", self.config.parse_stage_timeout()).await?;

        let mut parsed = Vec::with_capacity(documents.len());
        for document in documents {
            if document.state() == DocumentState::Parsed {
                parsed.push(document);
            } else {
                summary.record(DocumentOutcome::from_document(&document));
            }
        }

        info!(parsed = parsed.len(), failed = summary.parse_failed(), "Parse stage finished");
        Ok(parsed)
    }

    fn score_stage(&self, mut documents: Vec<DocumentUnit>) -> Result<Vec<Scored>, PipelineError> {
        documents.sort_by_key(|document| document.index);
        if let Some(gold) = &self.gold {
            gold.ensure_covers(documents.len())?;
        }

        let mut scored = Vec::with_capacity(documents.len());
        for (position, mut document) in documents.into_iter().enumerate() {
            document.transition(DocumentState::Scoring)?;

            let gold = self.gold.as_ref().and_then(|gold| gold.get(position));
            let empty = Value::Array(Vec::new());
            let payload = document.parsed_payload.as_ref().unwrap_or(&empty);

            let report = self.engine.score(&self.schema, payload, gold)?;
            let gate = self.gate.evaluate(&report);
            if !gate.is_accepted() {
                let reasons: Vec<String> = gate.reasons.iter().map(ToString::to_string).collect();
                warn!(document = document.index, reasons = %reasons.join(", "), "Quality gate rejected document");
            }

            document.transition(DocumentState::Scored)?;
            let mut outcome = DocumentOutcome::from_document(&document);
            outcome.report = Some(report);
            outcome.gate = Some(gate);
            scored.push(Scored { document, outcome });
        }

        info!(scored = scored.len(), "Scoring stage finished");
        Ok(scored)
    }

    async fn insert_stage(&self, scored: Vec<Scored>, summary: &mut RunSummary) -> Result<(), PipelineError> {
        for Scored { mut document, mut outcome } in scored {
            document.transition(DocumentState::Inserting)?;

            let payload = document.parsed_payload.take().unwrap_or(Value::Array(Vec::new()));
            let sink = Arc::clone(&self.sink);
            let schema = Arc::clone(&self.schema);
            let chunk_size = self.config.max_db_insertion_chunk_size;

            let (payload, result) = tokio::task::spawn_blocking(move || {
                let result = sink
                    .insert_rows(&schema, &payload, chunk_size)
                    .map_err(|e| e.to_string());
                (payload, result)
            })
            .await
            .map_err(|e| PipelineError::Worker(e.to_string()))?;
            document.parsed_payload = Some(payload);

            match result {
                Ok(inserted) => {
                    document.transition(DocumentState::Inserted)?;
                    outcome.rows_inserted = inserted.rows_inserted;
                    if inserted.rows_inserted == 0 {
                        debug!(document = document.index, "Document produced no rows");
                    }
                }
                Err(message) => {
                    error!(document = document.index, source = %document.source, error = %message, "Insert failed");
                    document.fail(DocumentState::InsertFailed, message)?;
                }
            }

            outcome.state = document.state();
            outcome.failure = document.failure.clone();
            summary.record(outcome);
        }

        info!(inserted = summary.inserted(), failed = summary.insert_failed(), "Insert stage finished");
        Ok(())
    }
}

struct Scored {
    document: DocumentUnit,
    outcome: DocumentOutcome,
}

/// Join every task of a stage, bounded by `timeout`.
///
/// On timeout the remaining tasks are aborted when the set drops.
async fn join_stage<T: 'static>(
    mut tasks: JoinSet<Result<T, PipelineError>>,
    stage: &'static str,
    timeout: Duration,
) -> Result<Vec<T>, PipelineError> {
    let joined = tokio::time::timeout(timeout, collect(&mut tasks)).await;
    match joined {
        Ok(results) => results,
        Err(_) => {
            error!(stage, ?timeout, "Stage timed out");
            Err(PipelineError::Timeout { stage, timeout })
        }
    }
}

async fn collect<T: 'static>(tasks: &mut JoinSet<Result<T, PipelineError>>) -> Result<Vec<T>, PipelineError> {
    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(|e| PipelineError::Worker(e.to_string()))?;
        results.push(result?);
    }
    Ok(results)
}
