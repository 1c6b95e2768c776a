//! Beam-search decoding with MMR source gating.
//!
//! Runs the encoder once, then steps the decoder until `max_decode_steps`
//! is reached or `beam_width` hypotheses have emitted the stop token. Each
//! step fans every live hypothesis out into `2×beam_width` candidates,
//! keeps the best `beam_width`, and refreshes the MMR vector of every
//! survivor that just completed a sentence.

mod diversity;
mod search;
mod select;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::scorer::{ImportanceEstimator, SimilarityScorer};
use crate::settings::ConfigError;
use crate::BoxError;

pub use search::{run_beam_search, run_beam_search_traced};
pub use select::{select_best, sort_hyps};

/// External scorers used when diversity scoring is enabled.
#[derive(Clone, Copy)]
pub struct DiversityScorers<'a> {
    pub importance: &'a dyn ImportanceEstimator,
    pub similarity: &'a dyn SimilarityScorer,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("decoder failed: {0}")]
    Decoder(#[source] BoxError),

    #[error("importance estimation failed: {0}")]
    Importance(#[source] BoxError),

    #[error("similarity scoring failed: {0}")]
    Similarity(#[source] BoxError),

    #[error("malformed decoder output at step {step}: {reason}")]
    MalformedStep { step: usize, reason: String },

    #[error("{what} has {got} scores for {expected} source sentences")]
    ScoreShape {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    /// The search ended with neither finished nor live hypotheses.
    #[error("beam search produced no hypotheses")]
    EmptyResultSet,
}

/// Counters describing how a decode went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Decoder steps executed.
    pub steps: usize,
    /// Hypotheses that emitted the stop token after `min_decode_steps`.
    pub finished: usize,
    /// No hypothesis finished; the best live one was returned instead.
    pub fell_back: bool,
    /// Copy-placeholder ids mapped to the unknown id before feedback.
    pub oov_substitutions: usize,
    /// MMR recomputations triggered by completed sentences.
    pub mmr_refreshes: usize,
}
