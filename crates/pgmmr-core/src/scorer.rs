//! Sentence-level scoring collaborators.
//!
//! The search needs two per-source-sentence signals: how important each
//! sentence is (computed once per document) and how much of it the summary
//! already covers (recomputed whenever a hypothesis finishes a sentence).

use std::collections::HashSet;

use crate::source::SourceDocument;
use crate::{BoxError, TokenId};

/// Produces one non-negative relevance score per source sentence.
pub trait ImportanceEstimator {
    fn estimate(&self, source: &SourceDocument) -> Result<Vec<f32>, BoxError>;
}

/// Produces one redundancy score per source sentence given the summary
/// sentences written so far.
pub trait SimilarityScorer {
    fn similarity(
        &self,
        source_sentences: &[Vec<TokenId>],
        summary_sentences: &[Vec<TokenId>],
    ) -> Result<Vec<f32>, BoxError>;
}

/// Importance scores computed elsewhere (an offline model, or an oracle
/// against reference summaries).
#[derive(Debug, Clone)]
pub struct FixedImportance(pub Vec<f32>);

impl ImportanceEstimator for FixedImportance {
    fn estimate(&self, _source: &SourceDocument) -> Result<Vec<f32>, BoxError> {
        Ok(self.0.clone())
    }
}

/// Unigram recall of each source sentence against the summary: the share of
/// a sentence's distinct tokens that the summary already contains.
///
/// Tokens in `ignore` (typically the unknown id and the sentence boundary)
/// never count as overlap.
#[derive(Debug, Clone, Default)]
pub struct UnigramOverlap {
    pub ignore: Vec<TokenId>,
}

impl UnigramOverlap {
    pub fn new(ignore: Vec<TokenId>) -> Self {
        Self { ignore }
    }
}

impl SimilarityScorer for UnigramOverlap {
    fn similarity(
        &self,
        source_sentences: &[Vec<TokenId>],
        summary_sentences: &[Vec<TokenId>],
    ) -> Result<Vec<f32>, BoxError> {
        let summary: HashSet<TokenId> = summary_sentences
            .iter()
            .flatten()
            .copied()
            .filter(|t| !self.ignore.contains(t))
            .collect();
        let scores = source_sentences
            .iter()
            .map(|sent| {
                let distinct: HashSet<TokenId> = sent
                    .iter()
                    .copied()
                    .filter(|t| !self.ignore.contains(t))
                    .collect();
                if distinct.is_empty() || summary.is_empty() {
                    return 0.0;
                }
                let hits = distinct.iter().filter(|t| summary.contains(t)).count();
                hits as f32 / distinct.len() as f32
            })
            .collect();
        Ok(scores)
    }
}
