//! Summarization Benchmark Suite
//!
//! Evaluates article summaries generated by multiple LLM providers against
//! reference summaries, scoring them with BLEU and ROUGE and recording token
//! usage and latency.
//!
//! # Features
//!
//! - Sentence-level BLEU (orders 1-4, smoothed) and ROUGE-1/2/L
//! - Order-independent per-model aggregation
//! - OpenAI and Gemini providers with rate limiting and retries
//! - JSON report output and console rankings
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use summary_benchmark::{
//!     config::{Config, ModelSpec},
//!     providers::{create_summarizer, Credentials},
//!     runner::{Executor, ExecutorConfig, NoOpProgress},
//!     samples::load_dataset,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let credentials = Credentials::from_env(&config);
//!     let samples = load_dataset("datasets/sample_dataset.json", Some(5))?;
//!
//!     let spec: ModelSpec = "openai:gpt-4o-mini".parse()?;
//!     let summarizer = Arc::new(create_summarizer(&spec, &config, &credentials)?);
//!
//!     let executor = Executor::new(ExecutorConfig::from(&config.benchmark));
//!     let run = executor.run_model(&spec, summarizer, &samples, &NoOpProgress).await;
//!     println!("{:?}", run.aggregate.mean_rouge_l());
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod providers;
pub mod reporting;
pub mod runner;
pub mod samples;

pub use config::{Config, ModelSpec, ProviderKind};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{
        aggregate, evaluate, score_sample, score_texts, tokenize, MetricScores, MetricSummary,
        ModelAggregate, SampleScore,
    };
    pub use crate::config::{Config, ModelSpec, ProviderKind};
    pub use crate::providers::{
        create_summarizer, CompletionRequest, CompletionResponse, Credentials, LLMProvider,
        Message, ProviderError, ProviderResult, Summarizer,
    };
    pub use crate::reporting::{print_console_report, JsonReport};
    pub use crate::runner::{Executor, ExecutorConfig, ModelRun, SampleRecord};
    pub use crate::samples::{load_dataset, GenerationResult, Sample, SampleFailure, TokenUsage};
}
