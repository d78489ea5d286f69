//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use ldo_domain::traits::{DocumentSource, SchemaIntrospector};
use ldo_extractor::{FsDocumentSource, PageSelection};
use ldo_llm::build_provider;
use ldo_pipeline::{PipelineOrchestrator, RunPolicy, RunSummary};
use ldo_store::{BatchInserter, ConnectionPool, SqliteIntrospector};
use ldo_validation::GoldSet;
use std::sync::Arc;
use tracing::info;

/// Execute the run command.
///
/// Returns whether the run stayed within the completion policy.
pub async fn execute_run(args: RunArgs, config: &AppConfig, formatter: &Formatter) -> Result<bool> {
    let (summary, policy) = run_pipeline(&args, config).await?;
    println!("{}", formatter.format_summary(&summary, &policy)?);
    Ok(summary.is_success(&policy))
}

/// Wire the configured components together and run the pipeline.
pub async fn run_pipeline(args: &RunArgs, config: &AppConfig) -> Result<(RunSummary, RunPolicy)> {
    let mut pipeline = config.pipeline.clone();
    pipeline.strict |= args.strict;
    let policy = RunPolicy::from_config(&pipeline);

    let pool = Arc::new(ConnectionPool::open(&config.database)?);
    let schema = SqliteIntrospector::new(Arc::clone(&pool)).describe_table(&args.table)?;

    let mut source = FsDocumentSource::new();
    if let Some(pages) = &args.pages {
        source = source.with_pages(pages.parse::<PageSelection>()?);
    }
    let documents = source.load_documents(&args.input)?;

    let gold = args.test_set.as_deref().map(GoldSet::from_file).transpose()?;

    info!(
        table = %schema.name,
        input = %args.input.display(),
        documents = documents.len(),
        "Starting run"
    );

    let sink = BatchInserter::new(pool, config.database.truncate_table_before_insert);
    let mut orchestrator = PipelineOrchestrator::new(
        pipeline,
        &config.extraction,
        schema,
        build_provider(&config.llm),
        Arc::new(source),
        Arc::new(sink),
    )?
    .with_validation(config.validation.clone())?;
    if let Some(gold) = gold {
        orchestrator = orchestrator.with_gold_set(gold);
    }

    let summary = orchestrator.run(documents).await?;
    Ok((summary, policy))
}
