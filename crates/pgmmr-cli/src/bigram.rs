//! A table-driven [`Decoder`] for replaying fixtures without a model.

use std::collections::BTreeMap;

use pgmmr_core::decoder::{Decoder, StepInput, StepOutput};
use pgmmr_core::source::SourceDocument;
use pgmmr_core::vocab::{SpecialTokens, Vocabulary};
use pgmmr_core::{BoxError, TokenId};

use crate::fixture::Prepared;

/// Scores the next token from the previous one alone.
///
/// Listed continuations come first; every other id of the extended
/// vocabulary follows at the fixture's default log-probability, so each
/// step can offer as many candidates as the search asks for. Attention is
/// the normalized gating vector when diversity scoring is on and uniform
/// otherwise.
pub struct BigramDecoder<'a> {
    table: &'a BTreeMap<TokenId, Vec<(TokenId, f32)>>,
    specials: SpecialTokens,
    extended_size: usize,
    default_log_prob: f32,
    encoder_len: usize,
}

impl<'a> BigramDecoder<'a> {
    pub fn new(prepared: &'a Prepared) -> Self {
        Self {
            table: &prepared.bigrams,
            specials: prepared.vocab.specials(),
            extended_size: prepared.extended_size,
            default_log_prob: prepared.default_log_prob,
            encoder_len: prepared.source.encoder_len,
        }
    }

    fn candidates(&self, prev: TokenId, top_k: usize) -> Vec<(TokenId, f32)> {
        let mut out: Vec<(TokenId, f32)> = self.table.get(&prev).cloned().unwrap_or_default();
        out.truncate(top_k);
        let fill = (0..self.extended_size as TokenId)
            .filter(|&id| id != self.specials.start && id != self.specials.unknown)
            .filter(|id| !out.iter().any(|(t, _)| t == id))
            .take(top_k.saturating_sub(out.len()))
            .map(|id| (id, self.default_log_prob))
            .collect::<Vec<_>>();
        out.extend(fill);
        out
    }

    fn attention(&self, gating: Option<&Vec<f32>>) -> Vec<f32> {
        let uniform = || vec![1.0 / self.encoder_len.max(1) as f32; self.encoder_len];
        match gating {
            Some(g) => {
                let total: f32 = g.iter().sum();
                if total > 0.0 {
                    g.iter().map(|v| v / total).collect()
                } else {
                    uniform()
                }
            }
            None => uniform(),
        }
    }
}

impl Decoder for BigramDecoder<'_> {
    type EncoderStates = ();
    /// Steps taken so far.
    type State = usize;

    fn run_encoder(&mut self, _source: &SourceDocument) -> Result<((), usize), BoxError> {
        Ok(((), 0))
    }

    fn decode_one_step(
        &mut self,
        input: StepInput<'_, (), usize>,
    ) -> Result<Vec<StepOutput<usize>>, BoxError> {
        let outputs = input
            .latest_tokens
            .iter()
            .enumerate()
            .map(|(i, &prev)| {
                let (top_ids, top_log_probs) = self.candidates(prev, input.top_k).into_iter().unzip();
                let attn_dist = self.attention(input.gating.map(|g| &g[i]));
                let coverage = input.coverage[i]
                    .map(|c| c.iter().zip(&attn_dist).map(|(c, a)| c + a).collect());
                StepOutput {
                    top_ids,
                    top_log_probs,
                    state: input.states[i] + 1,
                    attn_dist,
                    p_gen: None,
                    coverage,
                }
            })
            .collect();
        Ok(outputs)
    }
}
