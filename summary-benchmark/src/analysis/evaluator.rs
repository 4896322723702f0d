//! Per-sample scoring

use serde::{Deserialize, Serialize};

use super::bleu::BleuScorer;
use super::rouge::{rouge_scores, RougeScore};
use super::tokenizer::tokenize;
use crate::samples::{GenerationResult, Sample};

/// Quality metrics for one candidate/reference pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    pub bleu: f64,
    pub rouge_1: RougeScore,
    pub rouge_2: RougeScore,
    pub rouge_l: RougeScore,
}

/// Token counts with unreported values defaulted to zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

/// Scored result for one (sample, model) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleScore {
    pub sample_id: String,
    /// `None` when the sample has no reference summary
    pub metrics: Option<MetricScores>,
    pub latency_seconds: f64,
    #[serde(default)]
    pub api_latency_seconds: f64,
    pub tokens: TokenCounts,
    pub calls: u32,
}

impl SampleScore {
    pub fn bleu(&self) -> Option<f64> {
        self.metrics.map(|m| m.bleu)
    }

    pub fn rouge_1_f1(&self) -> Option<f64> {
        self.metrics.map(|m| m.rouge_1.f1)
    }

    pub fn rouge_2_f1(&self) -> Option<f64> {
        self.metrics.map(|m| m.rouge_2.f1)
    }

    pub fn rouge_l_f1(&self) -> Option<f64> {
        self.metrics.map(|m| m.rouge_l.f1)
    }
}

/// Score candidate tokens against reference tokens.
///
/// Returns `None` only when there is no reference; empty token sequences on
/// either side still produce (zero) scores.
pub fn score_sample(candidate: &[String], reference: Option<&[String]>) -> Option<MetricScores> {
    let reference = reference?;
    let bleu = BleuScorer::default().score(candidate, reference);
    let rouge = rouge_scores(candidate, reference);

    Some(MetricScores {
        bleu: bleu.value,
        rouge_1: rouge.rouge_1,
        rouge_2: rouge.rouge_2,
        rouge_l: rouge.rouge_l,
    })
}

/// Tokenize and score raw texts
pub fn score_texts(candidate: &str, reference: Option<&str>) -> Option<MetricScores> {
    let candidate_tokens = tokenize(candidate);
    let reference_tokens = reference.map(tokenize);
    score_sample(&candidate_tokens, reference_tokens.as_deref())
}

/// Score a generated summary for a sample
pub fn evaluate(sample: &Sample, generation: &GenerationResult) -> SampleScore {
    let metrics = score_texts(&generation.text, sample.reference_summary.as_deref());
    let usage = generation.usage.unwrap_or_default();

    tracing::debug!(
        sample = %sample.id,
        bleu = ?metrics.map(|m| m.bleu),
        rouge_l = ?metrics.map(|m| m.rouge_l.f1),
        "Scored sample"
    );

    SampleScore {
        sample_id: sample.id.clone(),
        metrics,
        latency_seconds: generation.latency_seconds.unwrap_or(0.0),
        api_latency_seconds: generation.api_latency_seconds.unwrap_or(0.0),
        tokens: TokenCounts {
            prompt: usage.prompt_tokens.unwrap_or(0),
            completion: usage.completion_tokens.unwrap_or(0),
            total: usage.total_tokens.unwrap_or(0),
        },
        calls: generation.calls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::TokenUsage;

    #[test]
    fn test_without_reference_metrics_are_absent() {
        let sample = Sample::new("1", "Article body");
        let generation = GenerationResult::new("A summary");

        let score = evaluate(&sample, &generation);
        assert!(score.metrics.is_none());
        assert_eq!(score.bleu(), None);
        assert_eq!(score.rouge_l_f1(), None);
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        let sample = Sample::new("1", "Article body").with_reference("the cat sat");
        let generation = GenerationResult::new("");

        let score = evaluate(&sample, &generation);
        let metrics = score.metrics.expect("reference present");
        assert_eq!(metrics.bleu, 0.0);
        assert_eq!(metrics.rouge_1.f1, 0.0);
        assert_eq!(metrics.rouge_l.f1, 0.0);
    }

    #[test]
    fn test_usage_and_latency_copied() {
        let sample = Sample::new("1", "Body").with_reference("the cat sat on the mat");
        let generation = GenerationResult::new("the cat sat on the mat")
            .with_usage(TokenUsage::new(Some(120), Some(30), Some(150)))
            .with_latency(1.25)
            .with_api_latency(0.75)
            .with_calls(2);

        let score = evaluate(&sample, &generation);
        assert_eq!(score.sample_id, "1");
        assert_eq!(score.tokens, TokenCounts { prompt: 120, completion: 30, total: 150 });
        assert_eq!(score.latency_seconds, 1.25);
        assert_eq!(score.api_latency_seconds, 0.75);
        assert_eq!(score.calls, 2);
        assert_eq!(score.bleu(), Some(1.0));
        assert_eq!(score.rouge_1_f1(), Some(1.0));
        assert_eq!(score.rouge_2_f1(), Some(1.0));
    }

    #[test]
    fn test_unreported_usage_defaults_to_zero() {
        let sample = Sample::new("1", "Body");
        let generation = GenerationResult::new("text")
            .with_usage(TokenUsage::new(Some(10), None, None));

        let score = evaluate(&sample, &generation);
        assert_eq!(score.tokens, TokenCounts { prompt: 10, completion: 0, total: 0 });
        assert_eq!(score.latency_seconds, 0.0);
        assert_eq!(score.api_latency_seconds, 0.0);
    }

    #[test]
    fn test_score_sample_on_tokens() {
        let candidate = tokenize("the cat");
        let reference = tokenize("the cat sat on the mat");

        assert!(score_sample(&candidate, None).is_none());

        let metrics = score_sample(&candidate, Some(reference.as_slice())).unwrap();
        assert_eq!(metrics.rouge_1.precision, 1.0);
        assert!(metrics.bleu > 0.0 && metrics.bleu < 1.0);
    }
}
