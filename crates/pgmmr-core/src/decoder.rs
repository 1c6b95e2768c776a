//! The single-step model interface driven by the beam search.
//!
//! The search never looks inside encoder outputs or decoder states; it
//! only threads them back into the next call.

use crate::source::SourceDocument;
use crate::{BoxError, TokenId};

/// Inputs for one decoding step, aligned by hypothesis index.
pub struct StepInput<'a, E, S> {
    /// Latest token of each hypothesis, copy placeholders already mapped to
    /// the unknown id.
    pub latest_tokens: &'a [TokenId],
    pub encoder_states: &'a E,
    pub states: Vec<&'a S>,
    pub coverage: Vec<Option<&'a [f32]>>,
    /// Word-level attention budget per hypothesis; `None` when diversity
    /// scoring is off.
    pub gating: Option<&'a [Vec<f32>]>,
    /// Number of candidates to return per hypothesis.
    pub top_k: usize,
}

impl<E, S> StepInput<'_, E, S> {
    pub fn len(&self) -> usize {
        self.latest_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest_tokens.is_empty()
    }
}

/// What the model produced for one hypothesis.
#[derive(Debug, Clone)]
pub struct StepOutput<S> {
    /// Candidate next tokens, best first.
    pub top_ids: Vec<TokenId>,
    pub top_log_probs: Vec<f32>,
    pub state: S,
    pub attn_dist: Vec<f32>,
    /// Generation probability; `None` for models without a copy mechanism.
    pub p_gen: Option<f32>,
    /// Updated coverage; `None` when coverage is disabled.
    pub coverage: Option<Vec<f32>>,
}

/// A sequence-to-sequence model that can be stepped one token at a time.
pub trait Decoder {
    type EncoderStates;
    type State: Clone;

    /// Encode the article, returning encoder outputs and the initial decoder
    /// state.
    fn run_encoder(
        &mut self,
        source: &SourceDocument,
    ) -> Result<(Self::EncoderStates, Self::State), BoxError>;

    /// Whether the model tracks coverage. When true, hypotheses start with a
    /// zero coverage vector over the encoder positions.
    fn uses_coverage(&self) -> bool {
        true
    }

    /// Advance every hypothesis by one token. Must return one output per
    /// input hypothesis, in input order.
    fn decode_one_step(
        &mut self,
        input: StepInput<'_, Self::EncoderStates, Self::State>,
    ) -> Result<Vec<StepOutput<Self::State>>, BoxError>;
}
