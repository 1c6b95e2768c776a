use std::sync::Arc;

use tracing::debug;

use crate::hypothesis::Hypothesis;
use crate::mmr::{expand_to_words, mmr_scores, SourceGate};
use crate::scorer::SimilarityScorer;
use crate::settings::{ConfigError, DiversityConfig};
use crate::source::{completed_sentences, SourceDocument};
use crate::vocab::SpecialTokens;

use super::{DecodeError, DiversityScorers};

/// Diversity scoring, resolved once before the first step.
///
/// `Enabled` carries the document's importance vector, computed once and
/// shared by every MMR recomputation.
pub(super) enum Diversity<'a> {
    Disabled,
    Enabled {
        importance: Arc<[f32]>,
        similarity: &'a dyn SimilarityScorer,
        lambda: f32,
        gate: SourceGate,
    },
}

impl<'a> Diversity<'a> {
    pub fn resolve(
        scorers: Option<DiversityScorers<'a>>,
        config: &DiversityConfig,
        source: &SourceDocument,
    ) -> Result<Self, DecodeError> {
        if !config.enabled {
            return Ok(Self::Disabled);
        }
        let Some(scorers) = scorers else {
            return Err(ConfigError::new(
                "diversity.enabled",
                "diversity scoring needs importance and similarity scorers",
            )
            .into());
        };
        let importance = scorers
            .importance
            .estimate(source)
            .map_err(DecodeError::Importance)?;
        check_len("importance", importance.len(), source.num_sentences())?;
        debug!(sentences = importance.len(), "sentence importance estimated");
        Ok(Self::Enabled {
            importance: importance.into(),
            similarity: scorers.similarity,
            lambda: config.lambda,
            gate: config.gate(),
        })
    }

    /// MMR vector of the initial hypotheses: the raw importance.
    pub fn initial_mmr(&self) -> Option<Arc<[f32]>> {
        match self {
            Self::Disabled => None,
            Self::Enabled { importance, .. } => Some(Arc::clone(importance)),
        }
    }

    /// Gate each hypothesis' MMR vector and broadcast it to the encoder
    /// positions.
    pub fn word_gating<S>(
        &self,
        hyps: &[Hypothesis<S>],
        source: &SourceDocument,
    ) -> Option<Vec<Vec<f32>>> {
        let Self::Enabled { gate, .. } = self else {
            return None;
        };
        let lengths = source.sentence_lengths();
        let gating = hyps
            .iter()
            .map(|h| {
                let gated = gate.apply(h.mmr().unwrap_or_default());
                expand_to_words(&gated, &lengths, source.encoder_len)
            })
            .collect();
        Some(gating)
    }

    /// Recompute similarity and MMR for a hypothesis that just completed a
    /// sentence. Returns `None` when diversity scoring is off.
    pub fn refresh<S: Clone>(
        &self,
        hyp: &Hypothesis<S>,
        source: &SourceDocument,
        specials: &SpecialTokens,
    ) -> Result<Option<Hypothesis<S>>, DecodeError> {
        let Self::Enabled {
            importance,
            similarity,
            lambda,
            ..
        } = self
        else {
            return Ok(None);
        };
        let summary = completed_sentences(&hyp.tokens(), specials);
        let sim = similarity
            .similarity(&source.sentences, &summary)
            .map_err(DecodeError::Similarity)?;
        check_len("similarity", sim.len(), importance.len())?;
        let mmr = mmr_scores(importance, &sim, *lambda);
        debug!(
            summary_sentences = summary.len(),
            active = mmr.iter().filter(|&&v| v > 0.0).count(),
            "mmr refreshed"
        );
        Ok(Some(hyp.with_mmr(sim.into(), mmr.into())))
    }
}

fn check_len(what: &'static str, got: usize, expected: usize) -> Result<(), DecodeError> {
    if got == expected {
        Ok(())
    } else {
        Err(DecodeError::ScoreShape {
            what,
            got,
            expected,
        })
    }
}
