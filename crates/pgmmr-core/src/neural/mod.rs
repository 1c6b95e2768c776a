//! Adapter from a logits-producing step model to [`Decoder`].
//!
//! The network itself lives elsewhere. A [`LogitsModel`] advances every
//! hypothesis by one step and returns a `[batch, vocab]` logits tensor;
//! [`LogitsDecoder`] normalizes it, picks the top candidates and keeps the
//! coverage bookkeeping the search expects.

use candle_core::{DType, Tensor, D};

use crate::decoder::{Decoder, StepInput, StepOutput};
use crate::source::SourceDocument;
use crate::{BoxError, TokenId};

/// What a model returns for one batched decoding step.
pub struct StepLogits<S> {
    /// Unnormalized scores, shape `[batch, vocab]`. The vocabulary may be
    /// extended with copy placeholders.
    pub logits: Tensor,
    pub states: Vec<S>,
    /// Attention over encoder positions, one row per hypothesis.
    pub attn_dists: Vec<Vec<f32>>,
    /// Generation probability per hypothesis, for pointer-generator models.
    pub p_gens: Option<Vec<f32>>,
}

/// A step model that produces logits.
pub trait LogitsModel {
    type EncoderStates;
    type State: Clone;

    fn encode(&mut self, source: &SourceDocument)
        -> anyhow::Result<(Self::EncoderStates, Self::State)>;

    /// Advance every hypothesis in `input` by one token. The gating vector,
    /// when present, should scale the model's attention before it is used.
    fn step(
        &mut self,
        input: &StepInput<'_, Self::EncoderStates, Self::State>,
    ) -> anyhow::Result<StepLogits<Self::State>>;
}

/// Wraps a [`LogitsModel`] as a [`Decoder`].
pub struct LogitsDecoder<M> {
    model: M,
    coverage: bool,
}

impl<M: LogitsModel> LogitsDecoder<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            coverage: true,
        }
    }

    /// Disable coverage tracking for models trained without it.
    pub fn without_coverage(mut self) -> Self {
        self.coverage = false;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_inner(self) -> M {
        self.model
    }
}

impl<M: LogitsModel> Decoder for LogitsDecoder<M> {
    type EncoderStates = M::EncoderStates;
    type State = M::State;

    fn run_encoder(
        &mut self,
        source: &SourceDocument,
    ) -> Result<(Self::EncoderStates, Self::State), BoxError> {
        Ok(self.model.encode(source)?)
    }

    fn uses_coverage(&self) -> bool {
        self.coverage
    }

    fn decode_one_step(
        &mut self,
        input: StepInput<'_, Self::EncoderStates, Self::State>,
    ) -> Result<Vec<StepOutput<Self::State>>, BoxError> {
        let step = self.model.step(&input)?;
        let batch = input.len();
        if step.states.len() != batch || step.attn_dists.len() != batch {
            return Err(format!(
                "model returned {} states and {} attention rows for {batch} hypotheses",
                step.states.len(),
                step.attn_dists.len()
            )
            .into());
        }

        let mut outputs = Vec::with_capacity(batch);
        let rows = step.states.into_iter().zip(step.attn_dists).enumerate();
        for (i, (state, attn_dist)) in rows {
            let row = step.logits.get(i)?;
            let (top_ids, top_log_probs) = top_k_log_probs(&row, input.top_k)?;
            let coverage = match input.coverage.get(i).copied().flatten() {
                Some(prev) if self.coverage => Some(accumulate(prev, &attn_dist)),
                _ => None,
            };
            outputs.push(StepOutput {
                top_ids,
                top_log_probs,
                state,
                attn_dist,
                p_gen: step.p_gens.as_ref().and_then(|p| p.get(i).copied()),
                coverage,
            });
        }
        Ok(outputs)
    }
}

fn accumulate(coverage: &[f32], attn_dist: &[f32]) -> Vec<f32> {
    coverage
        .iter()
        .zip(attn_dist)
        .map(|(c, a)| c + a)
        .collect()
}

/// Log-softmax a 1-D logits tensor and return the `k` most probable ids
/// with their log-probabilities, best first.
///
/// Equal log-probabilities keep ascending id order. Fewer than `k` entries
/// are returned only when the vocabulary is smaller than `k`.
pub fn top_k_log_probs(logits: &Tensor, k: usize) -> anyhow::Result<(Vec<TokenId>, Vec<f32>)> {
    let log_probs = candle_nn::ops::log_softmax(&logits.to_dtype(DType::F32)?, D::Minus1)
        .map_err(|e| anyhow::anyhow!("log_softmax failed: {e}"))?;
    let values: Vec<f32> = log_probs
        .to_vec1()
        .map_err(|e| anyhow::anyhow!("top_k to_vec1 failed: {e}"))?;
    if values.is_empty() {
        anyhow::bail!("empty logits tensor");
    }
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    order.truncate(k);
    let ids = order.iter().map(|&i| i as TokenId).collect();
    let lps = order.iter().map(|&i| values[i]).collect();
    Ok((ids, lps))
}
