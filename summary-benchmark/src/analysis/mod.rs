//! Summary quality scoring
//!
//! Tokenization, n-gram matching, BLEU and ROUGE scoring, per-sample
//! evaluation and per-model aggregation. Everything here is pure and
//! synchronous.

pub mod aggregator;
pub mod bleu;
pub mod evaluator;
pub mod ngram;
pub mod rouge;
pub mod tokenizer;

pub use aggregator::{aggregate, MetricSummary, ModelAggregate};
pub use bleu::{brevity_penalty, BleuScore, BleuScorer, DEFAULT_MAX_ORDER};
pub use evaluator::{evaluate, score_sample, score_texts, MetricScores, SampleScore, TokenCounts};
pub use ngram::{count_ngrams, ngram_overlap, NgramOverlap};
pub use rouge::{lcs_length, rouge_l, rouge_n, rouge_scores, RougeScore, RougeScores};
pub use tokenizer::tokenize;
