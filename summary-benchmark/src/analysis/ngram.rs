//! N-gram counting and clipped overlap

use std::collections::HashMap;

/// Overlap statistics between a candidate and a reference at one n-gram order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NgramOverlap {
    /// Candidate n-gram matches, each capped by its reference count
    pub clipped: usize,
    pub candidate_total: usize,
    pub reference_total: usize,
}

/// Number of n-grams of order `n` in a sequence of `len` tokens
pub fn ngram_total(len: usize, n: usize) -> usize {
    if n == 0 || len < n {
        0
    } else {
        len - n + 1
    }
}

/// Count every n-gram of order `n` in `tokens`
pub fn count_ngrams(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }

    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

/// Compute clipped overlap and totals at order `n`
pub fn ngram_overlap(candidate: &[String], reference: &[String], n: usize) -> NgramOverlap {
    let candidate_total = ngram_total(candidate.len(), n);
    let reference_total = ngram_total(reference.len(), n);

    if candidate_total == 0 || reference_total == 0 {
        return NgramOverlap {
            clipped: 0,
            candidate_total,
            reference_total,
        };
    }

    let reference_counts = count_ngrams(reference, n);
    let clipped = count_ngrams(candidate, n)
        .iter()
        .map(|(ngram, &count)| count.min(reference_counts.get(ngram).copied().unwrap_or(0)))
        .sum();

    NgramOverlap {
        clipped,
        candidate_total,
        reference_total,
    }
}
