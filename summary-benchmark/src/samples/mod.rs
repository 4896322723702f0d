//! Benchmark samples and generation results

pub mod loader;

pub use loader::{load_dataset, load_dataset_from_str, DatasetError};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One article with its optional reference summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub article: String,
    pub title: Option<String>,
    pub intro: Option<String>,
    pub reference_summary: Option<String>,
    /// Provenance fields copied verbatim from the dataset
    #[serde(default)]
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl Sample {
    pub fn new(id: impl Into<String>, article: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            article: article.into(),
            title: None,
            intro: None,
            reference_summary: None,
            metadata: IndexMap::new(),
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_summary = Some(reference.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = Some(intro.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn has_reference(&self) -> bool {
        self.reference_summary.is_some()
    }
}

/// Token usage as reported by a provider; any field may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn new(prompt_tokens: Option<u64>, completion_tokens: Option<u64>, total_tokens: Option<u64>) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    /// Sum two usages field by field, keeping whichever side is present
    pub fn merge(self, other: TokenUsage) -> Self {
        fn add(a: Option<u64>, b: Option<u64>) -> Option<u64> {
            match (a, b) {
                (Some(x), Some(y)) => Some(x + y),
                (x, None) => x,
                (None, y) => y,
            }
        }

        Self {
            prompt_tokens: add(self.prompt_tokens, other.prompt_tokens),
            completion_tokens: add(self.completion_tokens, other.completion_tokens),
            total_tokens: add(self.total_tokens, other.total_tokens),
        }
    }

    /// Fill a missing total from prompt + completion when both are known
    pub fn with_derived_total(mut self) -> Self {
        if self.total_tokens.is_none() {
            if let (Some(prompt), Some(completion)) = (self.prompt_tokens, self.completion_tokens) {
                self.total_tokens = Some(prompt + completion);
            }
        }
        self
    }
}

/// Output of one summary generation for a (sample, model) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// Wall time around the whole generation
    pub latency_seconds: Option<f64>,
    /// Time spent inside provider API calls, summed over calls
    #[serde(default)]
    pub api_latency_seconds: Option<f64>,
    /// Provider calls made to produce the summary
    #[serde(default)]
    pub calls: u32,
}

impl GenerationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            latency_seconds: None,
            api_latency_seconds: None,
            calls: 0,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_latency(mut self, seconds: f64) -> Self {
        self.latency_seconds = Some(seconds);
        self
    }

    pub fn with_api_latency(mut self, seconds: f64) -> Self {
        self.api_latency_seconds = Some(seconds);
        self
    }

    pub fn with_calls(mut self, calls: u32) -> Self {
        self.calls = calls;
        self
    }
}

/// A generation call that did not produce a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleFailure {
    pub sample_id: String,
    pub model: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl SampleFailure {
    pub fn new(sample_id: impl Into<String>, model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            model: model.into(),
            error: error.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Result of the generation stage for one sample
#[derive(Debug, Clone)]
pub enum SampleOutcome {
    Generated(GenerationResult),
    Failed(SampleFailure),
}

impl SampleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SampleOutcome::Generated(_))
    }
}
