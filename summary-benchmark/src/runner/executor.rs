//! Async executor that generates and scores summaries for one model at a time

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::analysis::{aggregate, evaluate, ModelAggregate, SampleScore};
use crate::config::{BenchmarkConfig, ModelSpec};
use crate::providers::{ProviderError, Summarizer};
use crate::samples::{GenerationResult, Sample, SampleFailure, SampleOutcome};

/// Configuration for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum in-flight generations
    pub parallel_requests: usize,
    /// Number of retries on failure
    pub retry_count: u32,
    /// Initial retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for one whole generation in milliseconds
    pub timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::from(&BenchmarkConfig::default())
    }
}

impl From<&BenchmarkConfig> for ExecutorConfig {
    fn from(config: &BenchmarkConfig) -> Self {
        Self {
            parallel_requests: config.parallel_requests,
            retry_count: config.retry_count,
            retry_delay_ms: config.retry_delay_ms,
            max_retry_delay_ms: config.max_retry_delay_ms,
            timeout_ms: config.timeout_ms,
        }
    }
}

/// Scored output for one sample, kept for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub model: String,
    #[serde(flatten)]
    pub score: SampleScore,
    pub summary: String,
    pub reference_summary: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, serde_json::Value>,
}

/// Everything produced for one model over the dataset
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub model: ModelSpec,
    /// Successful samples, in dataset order
    pub records: Vec<SampleRecord>,
    pub failures: Vec<SampleFailure>,
    pub aggregate: ModelAggregate,
}

impl ModelRun {
    /// Score generation outcomes (paired with their samples, in dataset
    /// order) and aggregate the successful ones
    pub fn from_outcomes<'a>(
        model: ModelSpec,
        outcomes: impl IntoIterator<Item = (&'a Sample, SampleOutcome)>,
    ) -> Self {
        let label = model.label();
        let mut records = Vec::new();
        let mut failures = Vec::new();

        for (sample, outcome) in outcomes {
            match outcome {
                SampleOutcome::Generated(generation) => {
                    records.push(SampleRecord {
                        model: label.clone(),
                        score: evaluate(sample, &generation),
                        summary: generation.text,
                        reference_summary: sample.reference_summary.clone(),
                        metadata: sample.metadata.clone(),
                    });
                }
                SampleOutcome::Failed(failure) => failures.push(failure),
            }
        }

        let scores: Vec<SampleScore> = records.iter().map(|r| r.score.clone()).collect();
        let aggregate = aggregate(&label, &scores);

        Self {
            model,
            records,
            failures,
            aggregate,
        }
    }
}

/// Executor for running the benchmark against one model
pub struct Executor {
    config: ExecutorConfig,
    semaphore: Arc<Semaphore>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.parallel_requests.max(1)));
        Self { config, semaphore }
    }

    /// Generate a summary for every sample with bounded parallelism, then
    /// score and aggregate.
    ///
    /// A sample whose generation fails after all retries becomes a
    /// [`SampleFailure`]; the rest of the batch carries on.
    pub async fn run_model(
        &self,
        spec: &ModelSpec,
        summarizer: Arc<Summarizer>,
        samples: &[Sample],
        progress: &dyn ProgressCallback,
    ) -> ModelRun {
        let label = spec.label();
        tracing::info!("Running {} on {} samples", label, samples.len());

        let mut handles = Vec::with_capacity(samples.len());
        for sample in samples {
            let sample = sample.clone();
            let summarizer = summarizer.clone();
            let semaphore = self.semaphore.clone();
            let config = self.config.clone();
            let label = label.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return SampleOutcome::Failed(SampleFailure::new(
                        &sample.id,
                        &label,
                        "executor shut down",
                    ));
                };
                generate_with_retry(&config, &summarizer, &sample, &label).await
            }));
        }

        let total = samples.len();
        let mut outcomes = Vec::with_capacity(total);
        for (index, (sample, handle)) in samples.iter().zip(handles).enumerate() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Generation task for sample {} panicked: {}", sample.id, e);
                    SampleOutcome::Failed(SampleFailure::new(&sample.id, &label, e.to_string()))
                }
            };
            progress.on_sample_complete(&sample.id, &label, outcome.is_success());
            progress.on_progress(index + 1, total);
            outcomes.push((sample, outcome));
        }

        let run = ModelRun::from_outcomes(spec.clone(), outcomes);
        tracing::info!(
            "Finished {}: {} scored, {} failed",
            label,
            run.records.len(),
            run.failures.len()
        );
        run
    }
}

/// One sample through the summarizer with timeout and exponential backoff
async fn generate_with_retry(
    config: &ExecutorConfig,
    summarizer: &Summarizer,
    sample: &Sample,
    label: &str,
) -> SampleOutcome {
    let mut last_error = None;
    let mut backoff = config.retry_delay_ms.min(config.max_retry_delay_ms);
    // Wait before the next attempt; a rate limit replaces the backoff step
    let mut wait = 0;

    for attempt in 0..=config.retry_count {
        if attempt > 0 {
            tracing::warn!("Retry {} for sample {} on {} after {}ms", attempt, sample.id, label, wait);
            sleep(Duration::from_millis(wait)).await;
        }

        match try_generate(config, summarizer, sample).await {
            Ok(generation) => return SampleOutcome::Generated(generation),
            Err(ProviderError::RateLimited { retry_after_ms }) => {
                wait = retry_after_ms.min(config.max_retry_delay_ms);
                tracing::warn!("Rate limited on {}, waiting {}ms", label, wait);
                last_error = Some(ProviderError::RateLimited { retry_after_ms });
            }
            Err(e) if !e.is_retryable() => {
                last_error = Some(e);
                break;
            }
            Err(e) => {
                tracing::warn!("Error on {} for sample {}: {}", label, sample.id, e);
                wait = backoff;
                backoff = backoff.saturating_mul(2).min(config.max_retry_delay_ms);
                last_error = Some(e);
            }
        }
    }

    let error = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "Unknown error".to_string());
    tracing::error!("Sample {} failed on {}: {}", sample.id, label, error);
    SampleOutcome::Failed(SampleFailure::new(&sample.id, label, error))
}

/// Single attempt, bounded by the configured timeout
async fn try_generate(
    config: &ExecutorConfig,
    summarizer: &Summarizer,
    sample: &Sample,
) -> Result<GenerationResult, ProviderError> {
    let timeout = Duration::from_millis(config.timeout_ms);
    let generation = summarizer.generate(
        &sample.article,
        sample.title.as_deref(),
        sample.intro.as_deref(),
    );

    match tokio::time::timeout(timeout, generation).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            timeout_ms: config.timeout_ms,
        }),
    }
}

/// Progress callback for tracking execution
pub trait ProgressCallback: Send + Sync {
    fn on_sample_complete(&self, sample_id: &str, model: &str, success: bool);
    fn on_progress(&self, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_sample_complete(&self, _sample_id: &str, _model: &str, _success: bool) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Console progress callback
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_sample_complete(&self, sample_id: &str, model: &str, success: bool) {
        let status = if success { "OK" } else { "FAILED" };
        println!("  [{}] {} on {}", status, sample_id, model);
    }

    fn on_progress(&self, completed: usize, total: usize) {
        if completed == total || completed % 10 == 0 {
            println!("Progress: {}/{} samples complete", completed, total);
        }
    }
}
