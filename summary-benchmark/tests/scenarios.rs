//! Concrete scoring scenarios on raw text

use approx::assert_relative_eq;
use summary_benchmark::analysis::{aggregate, score_texts, tokenize, MetricScores, RougeScore, SampleScore, TokenCounts};
use summary_benchmark::samples::{GenerationResult, Sample};

fn metrics(candidate: &str, reference: &str) -> MetricScores {
    score_texts(candidate, Some(reference)).expect("reference given")
}

#[test]
fn test_identical_texts() {
    let m = metrics("the cat sat on the mat", "the cat sat on the mat");
    assert_relative_eq!(m.bleu, 1.0);
    assert_relative_eq!(m.rouge_1.f1, 1.0);
    assert_relative_eq!(m.rouge_2.f1, 1.0);
    assert_relative_eq!(m.rouge_l.f1, 1.0);
}

#[test]
fn test_disjoint_texts() {
    let m = metrics("a completely different sentence", "the cat sat on the mat");
    assert_relative_eq!(m.bleu, 0.0, epsilon = 1e-9);
    assert_relative_eq!(m.rouge_1.f1, 0.0);
    assert_relative_eq!(m.rouge_l.f1, 0.0);
}

#[test]
fn test_empty_candidate() {
    let m = metrics("", "the cat sat");
    assert_relative_eq!(m.bleu, 0.0);
    assert_relative_eq!(m.rouge_1.f1, 0.0);
    assert_relative_eq!(m.rouge_2.f1, 0.0);
    assert_relative_eq!(m.rouge_l.f1, 0.0);
}

#[test]
fn test_both_empty() {
    let m = metrics("", "");
    assert_relative_eq!(m.bleu, 0.0);
    assert_relative_eq!(m.rouge_1.f1, 0.0);
}

#[test]
fn test_case_and_punctuation_are_ignored() {
    let m = metrics("The cat, sat on the mat!", "the CAT sat on the mat");
    assert_relative_eq!(m.bleu, 1.0);
    assert_relative_eq!(m.rouge_l.f1, 1.0);
}

#[test]
fn test_partial_overlap() {
    // candidate: the cat sat on the mat / reference: the cat lay on the mat
    let m = metrics("the cat sat on the mat", "the cat lay on the mat");

    // 5 of 6 unigrams, 3 of 5 bigrams, LCS 5
    assert_relative_eq!(m.rouge_1.precision, 5.0 / 6.0, epsilon = 1e-12);
    assert_relative_eq!(m.rouge_1.recall, 5.0 / 6.0, epsilon = 1e-12);
    assert_relative_eq!(m.rouge_2.f1, 3.0 / 5.0, epsilon = 1e-12);
    assert_relative_eq!(m.rouge_l.f1, 5.0 / 6.0, epsilon = 1e-12);
    assert!(m.bleu > 0.0 && m.bleu < 1.0);
}

#[test]
fn test_rouge_l_rewards_order() {
    let reference = "police arrested the suspect on friday";
    let ordered = metrics("police arrested the suspect", reference);
    let scrambled = metrics("suspect the arrested police", reference);

    assert_relative_eq!(ordered.rouge_1.f1, scrambled.rouge_1.f1, epsilon = 1e-12);
    assert!(ordered.rouge_l.f1 > scrambled.rouge_l.f1);
}

#[test]
fn test_slovak_text_tokenizes_whole_words() {
    let tokens = tokenize("Mestské zastupiteľstvo schválilo rozpočet.");
    assert_eq!(tokens, vec!["mestské", "zastupiteľstvo", "schválilo", "rozpočet"]);

    let m = metrics("Zastupiteľstvo schválilo rozpočet.", "Mestské zastupiteľstvo schválilo rozpočet.");
    assert_relative_eq!(m.rouge_1.precision, 1.0);
    assert_relative_eq!(m.rouge_1.recall, 0.75);
}

#[test]
fn test_mean_bleu_skips_unreferenced_sample() {
    let with_reference = SampleScore {
        sample_id: "1".to_string(),
        metrics: Some(MetricScores {
            bleu: 0.8,
            rouge_1: RougeScore::default(),
            rouge_2: RougeScore::default(),
            rouge_l: RougeScore::default(),
        }),
        latency_seconds: 1.0,
        api_latency_seconds: 0.8,
        tokens: TokenCounts::default(),
        calls: 1,
    };
    let without_reference = SampleScore {
        sample_id: "2".to_string(),
        metrics: None,
        ..with_reference.clone()
    };

    let agg = aggregate("openai:gpt-4o-mini", &[with_reference, without_reference]);
    assert_relative_eq!(agg.mean_bleu().unwrap(), 0.8);
    assert_eq!(agg.bleu.unwrap().count, 1);
    assert_eq!(agg.sample_count, 2);
}

#[test]
fn test_evaluate_from_dataset_sample() {
    let sample = Sample::new("city-1", "The council approved the budget on Tuesday.")
        .with_reference("The council approved the budget.");
    let generation = GenerationResult::new("The council approved the budget on Tuesday.").with_latency(0.5);

    let score = summary_benchmark::analysis::evaluate(&sample, &generation);
    assert_relative_eq!(score.rouge_1_f1().unwrap(), 2.0 * (5.0 / 7.0) / (5.0 / 7.0 + 1.0), epsilon = 1e-12);
    assert_relative_eq!(score.latency_seconds, 0.5);
}
