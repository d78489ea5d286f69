//! Per-document extraction: fan out segments, call the model, stitch

use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, PoolError};
use crate::pool::SegmentWorkerPool;
use crate::rate_limit::RateLimiter;
use crate::retry::RetryingCaller;
use crate::stitcher::{self, StitchOutcome};
use ldo_domain::traits::ExtractionService;
use ldo_domain::Segment;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turns the segments of one document into a stitched row array
///
/// Every segment call takes one rate-limiter token and then runs under the
/// retry policy. The limiter is shared by every document parsed with the
/// same extractor.
pub struct DocumentExtractor<E: ExtractionService + ?Sized> {
    service: Arc<E>,
    limiter: Arc<RateLimiter>,
    retry: RetryingCaller,
    pool: SegmentWorkerPool,
}

impl<E: ExtractionService + ?Sized + 'static> DocumentExtractor<E> {
    /// Create an extractor with its own rate limiter
    pub fn new(service: Arc<E>, config: &ExtractorConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.requests_per_second));
        Self::with_limiter(service, limiter, config)
    }

    /// Create an extractor sharing an existing rate limiter
    pub fn with_limiter(service: Arc<E>, limiter: Arc<RateLimiter>, config: &ExtractorConfig) -> Self {
        Self {
            service,
            limiter,
            retry: RetryingCaller::from_config(config),
            pool: SegmentWorkerPool::from_config(config),
        }
    }

    /// The shared rate limiter
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Extract and stitch the rows of one document.
    ///
    /// The first segment that exhausts its retries fails the document; a
    /// join timeout after that failure is reported separately and is fatal.
    pub async fn parse(
        &self,
        schema_json: &str,
        segments: Vec<Segment>,
    ) -> Result<StitchOutcome, ExtractorError> {
        let started = Instant::now();
        let total = segments.len();
        let schema: Arc<str> = Arc::from(schema_json);
        let service = Arc::clone(&self.service);
        let limiter = Arc::clone(&self.limiter);
        let retry = self.retry;

        debug!(segments = total, provider = self.service.name(), "Parsing document");

        let answers = self
            .pool
            .run(segments, move |index, segment: Segment| {
                let service = Arc::clone(&service);
                let limiter = Arc::clone(&limiter);
                let schema = Arc::clone(&schema);
                async move {
                    let context = segment.context();
                    limiter.acquire().await;
                    let answer = retry
                        .call(|| service.extract(&schema, &context))
                        .await?;
                    debug!(segment = index, chars = answer.len(), "Segment extracted");
                    Ok::<_, E::Error>(answer)
                }
            })
            .await
            .map_err(|error| match error {
                PoolError::Task { index, source } => ExtractorError::Extraction {
                    segment: index,
                    message: source.to_string(),
                },
                PoolError::JoinTimeout(timeout) => ExtractorError::JoinTimeout(timeout),
                PoolError::Panicked(message) => ExtractorError::WorkerPanicked(message),
            })?;

        let outcome = stitcher::merge(&answers);
        if outcome.dropped > 0 {
            warn!(dropped = outcome.dropped, segments = total, "Fragments dropped while stitching");
        }
        info!(
            segments = total,
            rows = outcome.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document parsed"
        );
        Ok(outcome)
    }
}
