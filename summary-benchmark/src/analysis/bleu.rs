//! Sentence-level BLEU

use serde::{Deserialize, Serialize};

use super::ngram::ngram_overlap;

/// Default maximum n-gram order
pub const DEFAULT_MAX_ORDER: usize = 4;

/// BLEU value together with the quantities it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BleuScore {
    pub value: f64,
    /// Per-order precision after smoothing, orders 1..=max_order
    pub precisions: Vec<f64>,
    pub brevity_penalty: f64,
}

impl BleuScore {
    fn zero(max_order: usize) -> Self {
        Self {
            value: 0.0,
            precisions: vec![0.0; max_order],
            brevity_penalty: 0.0,
        }
    }
}

/// BLEU with uniform order weights and add-one smoothing on orders above one.
///
/// An order n >= 2 with no clipped matches contributes `1 / (total + 1)`
/// instead of zero. Unigrams are never smoothed, so a candidate sharing no
/// word with the reference scores exactly 0.
#[derive(Debug, Clone)]
pub struct BleuScorer {
    max_order: usize,
}

impl BleuScorer {
    pub fn new(max_order: usize) -> Self {
        Self {
            max_order: max_order.max(1),
        }
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Score candidate tokens against reference tokens
    pub fn score(&self, candidate: &[String], reference: &[String]) -> BleuScore {
        if candidate.is_empty() || reference.is_empty() {
            return BleuScore::zero(self.max_order);
        }

        let precisions: Vec<f64> = (1..=self.max_order)
            .map(|n| {
                let overlap = ngram_overlap(candidate, reference, n);
                if overlap.clipped > 0 {
                    overlap.clipped as f64 / overlap.candidate_total as f64
                } else if n == 1 {
                    0.0
                } else {
                    1.0 / (overlap.candidate_total as f64 + 1.0)
                }
            })
            .collect();

        let brevity_penalty = brevity_penalty(candidate.len(), reference.len());

        if precisions[0] == 0.0 {
            return BleuScore {
                value: 0.0,
                precisions,
                brevity_penalty,
            };
        }

        let log_mean =
            precisions.iter().map(|p| p.ln()).sum::<f64>() / self.max_order as f64;

        BleuScore {
            value: brevity_penalty * log_mean.exp(),
            precisions,
            brevity_penalty,
        }
    }
}

impl Default for BleuScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ORDER)
    }
}

/// `exp(1 - r/c)` for candidates shorter than the reference, else 1
pub fn brevity_penalty(candidate_len: usize, reference_len: usize) -> f64 {
    if candidate_len == 0 {
        return 0.0;
    }
    if candidate_len >= reference_len {
        1.0
    } else {
        (1.0 - reference_len as f64 / candidate_len as f64).exp()
    }
}
