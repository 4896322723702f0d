//! ROUGE-N and ROUGE-L

use serde::{Deserialize, Serialize};

use super::ngram::ngram_overlap;

/// Precision, recall and F1 for one ROUGE variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl RougeScore {
    /// Build from a match count and the two denominators.
    ///
    /// A zero denominator gives 0 for that component; F1 is 0 whenever
    /// precision and recall are both 0.
    pub fn from_counts(matches: usize, candidate_total: usize, reference_total: usize) -> Self {
        let precision = ratio(matches, candidate_total);
        let recall = ratio(matches, reference_total);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            precision,
            recall,
            f1,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// ROUGE-1, ROUGE-2 and ROUGE-L for one candidate/reference pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RougeScores {
    pub rouge_1: RougeScore,
    pub rouge_2: RougeScore,
    pub rouge_l: RougeScore,
}

/// Compute all three ROUGE variants
pub fn rouge_scores(candidate: &[String], reference: &[String]) -> RougeScores {
    if candidate.is_empty() || reference.is_empty() {
        return RougeScores::default();
    }

    RougeScores {
        rouge_1: rouge_n(candidate, reference, 1),
        rouge_2: rouge_n(candidate, reference, 2),
        rouge_l: rouge_l(candidate, reference),
    }
}

/// ROUGE-N over clipped n-gram overlap
pub fn rouge_n(candidate: &[String], reference: &[String], n: usize) -> RougeScore {
    let overlap = ngram_overlap(candidate, reference, n);
    RougeScore::from_counts(
        overlap.clipped,
        overlap.candidate_total,
        overlap.reference_total,
    )
}

/// ROUGE-L from the longest common subsequence
pub fn rouge_l(candidate: &[String], reference: &[String]) -> RougeScore {
    let lcs = lcs_length(candidate, reference);
    RougeScore::from_counts(lcs, candidate.len(), reference.len())
}

/// Length of the longest common subsequence of two token sequences.
///
/// Classic O(|a|·|b|) dynamic programme keeping two rows sized by the
/// shorter input.
pub fn lcs_length(a: &[String], b: &[String]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if inner.is_empty() {
        return 0;
    }

    let mut previous = vec![0usize; inner.len() + 1];
    let mut current = vec![0usize; inner.len() + 1];

    for token in outer {
        for (j, other) in inner.iter().enumerate() {
            current[j + 1] = if token == other {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[inner.len()]
}
