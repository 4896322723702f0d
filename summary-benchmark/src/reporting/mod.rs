//! Results reporting

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::analysis::{MetricSummary, ModelAggregate};
use crate::runner::{ModelRun, SampleRecord};
use crate::samples::SampleFailure;

/// Error type for report I/O
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Full JSON report for one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub dataset: String,
    pub limit: Option<usize>,
    /// Per-model aggregates keyed by `provider:model`, in run order
    pub aggregates: IndexMap<String, ModelAggregate>,
    pub samples: Vec<SampleRecord>,
    pub failures: Vec<SampleFailure>,
}

impl JsonReport {
    /// Assemble a report from finished model runs.
    ///
    /// Runs are expected to have distinct model labels; for a repeated label
    /// only the last aggregate is kept.
    pub fn from_runs(
        run_id: impl Into<String>,
        dataset: impl Into<String>,
        limit: Option<usize>,
        runs: &[ModelRun],
    ) -> Self {
        let mut aggregates = IndexMap::with_capacity(runs.len());
        for run in runs {
            let label = run.aggregate.model.clone();
            if aggregates.insert(label, run.aggregate.clone()).is_some() {
                tracing::warn!("Model {} appears in more than one run", run.aggregate.model);
            }
        }

        Self {
            run_id: run_id.into(),
            generated_at: Utc::now(),
            dataset: dataset.into(),
            limit,
            aggregates,
            samples: runs.iter().flat_map(|run| run.records.iter().cloned()).collect(),
            failures: runs.iter().flat_map(|run| run.failures.iter().cloned()).collect(),
        }
    }

    /// Aggregates ordered by mean ROUGE-L F1, best first; models without the
    /// metric come last
    pub fn rankings(&self) -> Vec<&ModelAggregate> {
        let mut ranked: Vec<&ModelAggregate> = self.aggregates.values().collect();
        ranked.sort_by(|a, b| match (a.mean_rouge_l(), b.mean_rouge_l()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        ranked
    }

    /// Write to JSON file, creating parent directories
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a report written by [`JsonReport::write_to_file`]
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Write each generated summary to `<dir>/<model>-<sample>.txt`.
/// Returns the number of files written.
pub fn save_responses(dir: impl AsRef<Path>, records: &[SampleRecord]) -> Result<usize, ReportError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut used = HashSet::new();
    for record in records {
        std::fs::write(response_path(dir, record, &mut used), &record.summary)?;
    }
    Ok(records.len())
}

/// File for one record. Names already handed out get a numeric suffix, so
/// ids that sanitize alike (`a/b`, `a_b`) never share a file.
fn response_path(dir: &Path, record: &SampleRecord, used: &mut HashSet<String>) -> PathBuf {
    let stem = format!(
        "{}-{}",
        sanitize_file_component(&record.model),
        sanitize_file_component(&record.score.sample_id)
    );
    let mut name = format!("{}.txt", stem);
    let mut suffix = 2;
    while !used.insert(name.clone()) {
        name = format!("{}-{}.txt", stem, suffix);
        suffix += 1;
    }
    dir.join(name)
}

fn sanitize_file_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

fn fmt_metric(summary: Option<&MetricSummary>) -> String {
    match summary {
        Some(s) => format!("{:.4} (min {:.4}, max {:.4}, sd {:.4}, n={})", s.mean, s.min, s.max, s.std_dev, s.count),
        None => "n/a".to_string(),
    }
}

fn fmt_seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}s", v))
}

fn fmt_score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

/// Generate a console report
pub fn print_console_report(report: &JsonReport, verbose: bool) {
    println!("\n=== Summary Benchmark Results ===\n");
    println!("Run ID:  {}", report.run_id);
    println!("Dataset: {}", report.dataset);
    if let Some(limit) = report.limit {
        println!("Limit:   {}", limit);
    }

    println!("\nModel Rankings (by mean ROUGE-L F1):");
    println!("{:-<72}", "");
    println!(
        "  {:<4} {:<36} {:>8} {:>8} {:>8} {:>8}",
        "#", "Model", "BLEU", "R-1", "R-2", "R-L"
    );
    for (i, agg) in report.rankings().into_iter().enumerate() {
        println!(
            "  {:<4} {:<36} {:>8} {:>8} {:>8} {:>8}",
            i + 1,
            agg.model,
            fmt_score(agg.mean_bleu()),
            fmt_score(agg.mean_rouge_1()),
            fmt_score(agg.mean_rouge_2()),
            fmt_score(agg.mean_rouge_l()),
        );
    }

    for agg in report.aggregates.values() {
        println!("\n{}", agg.model);
        println!("  Evaluated samples: {}", agg.sample_count);
        println!("  BLEU:       {}", fmt_metric(agg.bleu.as_ref()));
        println!("  ROUGE-1 F1: {}", fmt_metric(agg.rouge_1.as_ref()));
        println!("  ROUGE-2 F1: {}", fmt_metric(agg.rouge_2.as_ref()));
        println!("  ROUGE-L F1: {}", fmt_metric(agg.rouge_l.as_ref()));
        println!(
            "  Tokens -> prompt: {}, completion: {}, total: {} (mean {})",
            agg.total_prompt_tokens,
            agg.total_completion_tokens,
            agg.total_tokens,
            agg.mean_total_tokens.map_or_else(|| "n/a".to_string(), |m| format!("{:.1}", m)),
        );
        println!(
            "  Time -> api: {:.2}s (mean {}), wall: {:.2}s (mean {}) across {} calls",
            agg.total_api_latency_seconds,
            fmt_seconds(agg.mean_api_latency_seconds),
            agg.total_latency_seconds,
            fmt_seconds(agg.mean_latency_seconds),
            agg.total_calls,
        );

        let failed = report.failures.iter().filter(|f| f.model == agg.model).count();
        if failed > 0 {
            println!("  Failed samples: {}", failed);
        }

        if verbose {
            println!("  Detailed samples:");
            for record in report.samples.iter().filter(|r| r.model == agg.model) {
                print_sample(record);
            }
        }
    }

    if !report.failures.is_empty() {
        println!("\nFailures:");
        println!("{:-<72}", "");
        for failure in &report.failures {
            println!("  {} | {} | {}", failure.model, failure.sample_id, failure.error);
        }
    }

    println!("\n{:=<72}", "");
}

fn print_sample(record: &SampleRecord) {
    let score = &record.score;
    println!("    - Sample: {}", score.sample_id);
    println!(
        "      Time: api {:.2}s, wall {:.2}s | Tokens: prompt {}, completion {}, total {} | Calls: {}",
        score.api_latency_seconds, score.latency_seconds, score.tokens.prompt, score.tokens.completion, score.tokens.total, score.calls
    );
    for (key, value) in &record.metadata {
        match value.as_str() {
            Some(text) => println!("      {}: {}", key, text),
            None => println!("      {}: {}", key, value),
        }
    }
    match &score.metrics {
        Some(m) => println!(
            "      BLEU: {:.4} | ROUGE-1 F1={:.4}, ROUGE-2 F1={:.4}, ROUGE-L F1={:.4}",
            m.bleu, m.rouge_1.f1, m.rouge_2.f1, m.rouge_l.f1
        ),
        None => println!("      (no reference summary)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelSpec, ProviderKind};
    use crate::samples::{GenerationResult, Sample, SampleOutcome};

    fn run(model: &str, summary: &str) -> ModelRun {
        let samples = vec![
            Sample::new("1", "Body")
                .with_reference("the cat sat on the mat")
                .with_metadata("source", serde_json::json!("wire")),
            Sample::new("2", "Body"),
        ];
        ModelRun::from_outcomes(
            ModelSpec::new(ProviderKind::OpenAI, model),
            vec![
                (&samples[0], SampleOutcome::Generated(GenerationResult::new(summary))),
                (
                    &samples[1],
                    SampleOutcome::Failed(SampleFailure::new("2", format!("openai:{}", model), "timeout")),
                ),
            ],
        )
    }

    #[test]
    fn test_from_runs() {
        let runs = vec![run("a", "the cat sat on the mat"), run("b", "a dog")];
        let report = JsonReport::from_runs("run-1", "data.json", Some(2), &runs);

        assert_eq!(report.aggregates.len(), 2);
        assert_eq!(report.samples.len(), 2);
        assert_eq!(report.failures.len(), 2);
        let keys: Vec<_> = report.aggregates.keys().cloned().collect();
        assert_eq!(keys, vec!["openai:a", "openai:b"]);
    }

    #[test]
    fn test_rankings_put_missing_metrics_last() {
        let mut runs = vec![run("weak", "a dog"), run("strong", "the cat sat on the mat")];
        runs.push(ModelRun::from_outcomes(ModelSpec::new(ProviderKind::Gemini, "none"), Vec::new()));
        let report = JsonReport::from_runs("run-1", "data.json", None, &runs);

        let order: Vec<_> = report.rankings().iter().map(|a| a.model.as_str()).collect();
        assert_eq!(order, vec!["openai:strong", "openai:weak", "gemini:none"]);
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        let report = JsonReport::from_runs("run-1", "data.json", None, &[run("a", "the cat")]);
        report.write_to_file(&path).unwrap();

        let loaded = JsonReport::read_from_file(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_save_responses() {
        let dir = tempfile::tempdir().unwrap();
        let run = run("gpt-4.1", "the cat");

        let written = save_responses(dir.path().join("responses"), &run.records).unwrap();
        assert_eq!(written, 1);

        let content = std::fs::read_to_string(dir.path().join("responses").join("openai_gpt-4.1-1.txt")).unwrap();
        assert_eq!(content, "the cat");
    }

    #[test]
    fn test_save_responses_keeps_ids_that_sanitize_alike() {
        let samples = vec![
            Sample::new("a/b", "Body").with_reference("x"),
            Sample::new("a_b", "Body").with_reference("x"),
        ];
        let run = ModelRun::from_outcomes(
            ModelSpec::new(ProviderKind::OpenAI, "m"),
            vec![
                (&samples[0], SampleOutcome::Generated(GenerationResult::new("slash"))),
                (&samples[1], SampleOutcome::Generated(GenerationResult::new("underscore"))),
            ],
        );

        let dir = tempfile::tempdir().unwrap();
        let written = save_responses(dir.path(), &run.records).unwrap();
        assert_eq!(written, 2);

        let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("openai_m-a_b.txt"), "slash");
        assert_eq!(read("openai_m-a_b-2.txt"), "underscore");
    }

    #[test]
    fn test_repeated_model_keeps_last_aggregate() {
        let runs = vec![run("m", "the cat sat on the mat"), run("m", "a dog")];
        let report = JsonReport::from_runs("run-1", "data.json", None, &runs);

        assert_eq!(report.aggregates.len(), 1);
        assert_eq!(report.aggregates["openai:m"].mean_bleu(), Some(0.0));
    }
}
