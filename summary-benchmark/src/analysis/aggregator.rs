//! Per-model aggregation of sample scores

use serde::{Deserialize, Serialize};

use super::evaluator::SampleScore;

/// Distribution summary for one metric across samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Samples that contributed a value
    pub count: usize,
}

impl MetricSummary {
    /// Summarize a set of values; `None` when the set is empty.
    ///
    /// Values are sorted before any summation, so the result depends only on
    /// the multiset of inputs.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            mean,
            min: values[0],
            max: values[count - 1],
            std_dev: variance.sqrt(),
            count,
        })
    }
}

/// Summary statistics for one model over a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAggregate {
    pub model: String,
    /// Number of scored samples (failures excluded)
    pub sample_count: usize,
    pub bleu: Option<MetricSummary>,
    pub rouge_1: Option<MetricSummary>,
    pub rouge_2: Option<MetricSummary>,
    pub rouge_l: Option<MetricSummary>,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
    pub mean_total_tokens: Option<f64>,
    pub total_latency_seconds: f64,
    pub mean_latency_seconds: Option<f64>,
    /// Provider API time, a subset of the wall-clock latency
    #[serde(default)]
    pub total_api_latency_seconds: f64,
    #[serde(default)]
    pub mean_api_latency_seconds: Option<f64>,
    pub total_calls: u64,
}

impl ModelAggregate {
    pub fn mean_bleu(&self) -> Option<f64> {
        self.bleu.as_ref().map(|s| s.mean)
    }

    pub fn mean_rouge_1(&self) -> Option<f64> {
        self.rouge_1.as_ref().map(|s| s.mean)
    }

    pub fn mean_rouge_2(&self) -> Option<f64> {
        self.rouge_2.as_ref().map(|s| s.mean)
    }

    pub fn mean_rouge_l(&self) -> Option<f64> {
        self.rouge_l.as_ref().map(|s| s.mean)
    }
}

/// Fold the scores of one model into a [`ModelAggregate`].
///
/// Samples without a metric are left out of that metric's summary entirely,
/// and a metric no sample could be scored on stays `None`.
pub fn aggregate(model: &str, scores: &[SampleScore]) -> ModelAggregate {
    let summarize = |metric: fn(&SampleScore) -> Option<f64>| {
        MetricSummary::from_values(scores.iter().filter_map(metric).collect())
    };

    let sample_count = scores.len();
    let total_tokens: u64 = scores.iter().map(|s| s.tokens.total).sum();
    let total_latency_seconds = ordered_sum(scores.iter().map(|s| s.latency_seconds).collect());
    let total_api_latency_seconds = ordered_sum(scores.iter().map(|s| s.api_latency_seconds).collect());

    let mean = |total: f64| {
        if sample_count == 0 {
            None
        } else {
            Some(total / sample_count as f64)
        }
    };

    ModelAggregate {
        model: model.to_string(),
        sample_count,
        bleu: summarize(SampleScore::bleu),
        rouge_1: summarize(SampleScore::rouge_1_f1),
        rouge_2: summarize(SampleScore::rouge_2_f1),
        rouge_l: summarize(SampleScore::rouge_l_f1),
        total_prompt_tokens: scores.iter().map(|s| s.tokens.prompt).sum(),
        total_completion_tokens: scores.iter().map(|s| s.tokens.completion).sum(),
        total_tokens,
        mean_total_tokens: mean(total_tokens as f64),
        total_latency_seconds,
        mean_latency_seconds: mean(total_latency_seconds),
        total_api_latency_seconds,
        mean_api_latency_seconds: mean(total_api_latency_seconds),
        total_calls: scores.iter().map(|s| u64::from(s.calls)).sum(),
    }
}

fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::evaluator::{MetricScores, TokenCounts};
    use crate::analysis::rouge::RougeScore;

    fn rouge(f1: f64) -> RougeScore {
        RougeScore {
            precision: f1,
            recall: f1,
            f1,
        }
    }

    fn scored(id: &str, bleu: f64, latency: f64, tokens: u64) -> SampleScore {
        SampleScore {
            sample_id: id.to_string(),
            metrics: Some(MetricScores {
                bleu,
                rouge_1: rouge(bleu),
                rouge_2: rouge(bleu / 2.0),
                rouge_l: rouge(bleu),
            }),
            latency_seconds: latency,
            api_latency_seconds: latency / 2.0,
            tokens: TokenCounts {
                prompt: tokens,
                completion: tokens / 2,
                total: tokens + tokens / 2,
            },
            calls: 1,
        }
    }

    fn unreferenced(id: &str) -> SampleScore {
        SampleScore {
            sample_id: id.to_string(),
            metrics: None,
            latency_seconds: 1.0,
            api_latency_seconds: 0.5,
            tokens: TokenCounts::default(),
            calls: 1,
        }
    }

    #[test]
    fn test_absent_metrics_are_excluded() {
        let scores = vec![scored("1", 0.8, 1.0, 100), unreferenced("2")];
        let agg = aggregate("openai:gpt-4o-mini", &scores);

        assert_eq!(agg.sample_count, 2);
        assert_eq!(agg.mean_bleu(), Some(0.8));
        assert_eq!(agg.bleu.as_ref().unwrap().count, 1);
        assert_eq!(agg.mean_rouge_2(), Some(0.4));
        assert_eq!(agg.total_calls, 2);
    }

    #[test]
    fn test_no_referenced_samples() {
        let scores = vec![unreferenced("1"), unreferenced("2")];
        let agg = aggregate("m", &scores);

        assert!(agg.bleu.is_none());
        assert!(agg.rouge_1.is_none());
        assert!(agg.rouge_2.is_none());
        assert!(agg.rouge_l.is_none());
        assert_eq!(agg.mean_latency_seconds, Some(1.0));
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate("m", &[]);
        assert_eq!(agg.sample_count, 0);
        assert!(agg.mean_bleu().is_none());
        assert!(agg.mean_total_tokens.is_none());
        assert!(agg.mean_latency_seconds.is_none());
        assert_eq!(agg.total_tokens, 0);
    }

    #[test]
    fn test_totals_and_means() {
        let scores = vec![scored("1", 0.2, 1.5, 100), scored("2", 0.6, 2.5, 200)];
        let agg = aggregate("m", &scores);

        assert_eq!(agg.total_prompt_tokens, 300);
        assert_eq!(agg.total_completion_tokens, 150);
        assert_eq!(agg.total_tokens, 450);
        assert_eq!(agg.mean_total_tokens, Some(225.0));
        assert_eq!(agg.total_latency_seconds, 4.0);
        assert_eq!(agg.mean_latency_seconds, Some(2.0));
        assert_eq!(agg.total_api_latency_seconds, 2.0);
        assert_eq!(agg.mean_api_latency_seconds, Some(1.0));

        let bleu = agg.bleu.unwrap();
        assert!((bleu.mean - 0.4).abs() < 1e-12);
        assert_eq!(bleu.min, 0.2);
        assert_eq!(bleu.max, 0.6);
        assert!((bleu.std_dev - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_order_independent() {
        let forward = vec![
            scored("1", 0.1, 0.3, 10),
            scored("2", 0.7, 1.1, 20),
            unreferenced("3"),
            scored("4", 0.33, 2.7, 30),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(aggregate("m", &forward), aggregate("m", &reversed));
    }

    #[test]
    fn test_metric_summary_single_value() {
        let summary = MetricSummary::from_values(vec![0.5]).unwrap();
        assert_eq!(summary.mean, 0.5);
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.count, 1);
        assert!(MetricSummary::from_values(Vec::new()).is_none());
    }
}
