//! Maximal marginal relevance over source sentences.
//!
//! Each hypothesis carries an MMR vector: how much unexploited value every
//! source sentence still holds given what the hypothesis has written. Before
//! each decoder step the vector is gated down to the top sentences and
//! broadcast to word level, where it scales the decoder's attention.

mod expand;
mod gate;
pub mod trace;

pub use expand::{expand_to_words, uniform_word_scores};
pub use gate::{mute_all_except_top_k, MuteK, SourceGate};
pub use trace::{trace_best, MmrSnapshot, MmrTrace};

/// Blend importance and redundancy into per-sentence MMR scores:
/// `max(0, λ·importance[i] − (1−λ)·similarity[i])`.
///
/// Negative values mean the sentence has nothing left to contribute and are
/// clamped to zero. `importance` and `similarity` must have equal length;
/// the shorter one bounds the output.
pub fn mmr_scores(importance: &[f32], similarity: &[f32], lambda: f32) -> Vec<f32> {
    importance
        .iter()
        .zip(similarity)
        .map(|(&imp, &sim)| (lambda * imp - (1.0 - lambda) * sim).max(0.0))
        .collect()
}
