//! Offline MMR diagnostics for a finished summary.
//!
//! Replays the summary one sentence at a time and records, after each
//! prefix, what the similarity and MMR vectors looked like. Useful for
//! inspecting which source sentences the gate would have opened.

use serde::Serialize;

use crate::scorer::SimilarityScorer;
use crate::{BoxError, TokenId};

use super::mmr_scores;

/// Scores after the first `sentences_written` summary sentences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MmrSnapshot {
    pub sentences_written: usize,
    pub similarity: Vec<f32>,
    pub importance: Vec<f32>,
    pub mmr: Vec<f32>,
}

impl MmrSnapshot {
    /// Source sentence indices ordered by importance, highest first. Ties
    /// keep sentence order.
    pub fn order_by_importance(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.importance.len()).collect();
        order.sort_by(|&a, &b| self.importance[b].total_cmp(&self.importance[a]));
        order
    }

    /// The same snapshot with every vector permuted into importance order.
    pub fn sorted_by_importance(&self) -> MmrSnapshot {
        let order = self.order_by_importance();
        let pick = |v: &[f32]| order.iter().map(|&i| v[i]).collect::<Vec<f32>>();
        MmrSnapshot {
            sentences_written: self.sentences_written,
            similarity: pick(&self.similarity),
            importance: pick(&self.importance),
            mmr: pick(&self.mmr),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MmrTrace {
    /// One entry per summary prefix, from the empty summary up to the full one.
    pub snapshots: Vec<MmrSnapshot>,
}

impl MmrTrace {
    pub fn last(&self) -> Option<&MmrSnapshot> {
        self.snapshots.last()
    }
}

/// Build the trace for `summary_sentences` (completed sentences only).
///
/// The first snapshot describes the empty summary, where similarity is zero
/// and MMR is the importance scaled by `lambda`.
pub fn trace_best(
    importance: &[f32],
    source_sentences: &[Vec<TokenId>],
    summary_sentences: &[Vec<TokenId>],
    scorer: &dyn SimilarityScorer,
    lambda: f32,
) -> Result<MmrTrace, BoxError> {
    let mut snapshots = Vec::with_capacity(summary_sentences.len() + 1);
    for written in 0..=summary_sentences.len() {
        let similarity = if written == 0 {
            vec![0.0; source_sentences.len()]
        } else {
            scorer.similarity(source_sentences, &summary_sentences[..written])?
        };
        if similarity.len() != importance.len() {
            return Err(format!(
                "similarity has {} entries for {} importance scores",
                similarity.len(),
                importance.len()
            )
            .into());
        }
        let mmr = mmr_scores(importance, &similarity, lambda);
        snapshots.push(MmrSnapshot {
            sentences_written: written,
            similarity,
            importance: importance.to_vec(),
            mmr,
        });
    }
    Ok(MmrTrace { snapshots })
}
