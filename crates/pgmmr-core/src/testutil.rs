//! Shared fakes for beam-search tests.

use crate::decoder::{Decoder, StepInput, StepOutput};
use crate::source::SourceDocument;
use crate::vocab::Vocab;
use crate::{BoxError, TokenId};

/// Vocabulary `{[UNK], [PAD], [START], [STOP], a, b, c, .}`.
pub fn test_vocab() -> Vocab {
    Vocab::from_words(["a", "b", "c", "."])
}

pub const A: TokenId = 4;
pub const B: TokenId = 5;
pub const C: TokenId = 6;
pub const PERIOD: TokenId = 7;
pub const START: TokenId = 2;
pub const STOP: TokenId = 3;

/// What the decoder was asked on one step.
#[derive(Debug, Clone)]
pub struct StepCall {
    pub latest_tokens: Vec<TokenId>,
    pub gating: Option<Vec<Vec<f32>>>,
    pub had_coverage: Vec<bool>,
}

/// Decoder whose candidates come from a closure over the hypothesis'
/// token history (start symbol included, latest token last).
///
/// The decoder state is that history. Attention follows the gating vector
/// when one is given and is uniform otherwise; coverage accumulates it.
pub struct ScriptedDecoder<F> {
    script: F,
    encoder_len: usize,
    coverage: bool,
    pub calls: Vec<StepCall>,
}

impl<F> ScriptedDecoder<F>
where
    F: FnMut(&[TokenId]) -> Vec<(TokenId, f32)>,
{
    pub fn new(encoder_len: usize, script: F) -> Self {
        Self {
            script,
            encoder_len,
            coverage: true,
            calls: Vec::new(),
        }
    }

    pub fn without_coverage(mut self) -> Self {
        self.coverage = false;
        self
    }
}

impl<F> Decoder for ScriptedDecoder<F>
where
    F: FnMut(&[TokenId]) -> Vec<(TokenId, f32)>,
{
    type EncoderStates = ();
    type State = Vec<TokenId>;

    fn run_encoder(&mut self, _source: &SourceDocument) -> Result<((), Vec<TokenId>), BoxError> {
        Ok(((), Vec::new()))
    }

    fn uses_coverage(&self) -> bool {
        self.coverage
    }

    fn decode_one_step(
        &mut self,
        input: StepInput<'_, (), Vec<TokenId>>,
    ) -> Result<Vec<StepOutput<Vec<TokenId>>>, BoxError> {
        self.calls.push(StepCall {
            latest_tokens: input.latest_tokens.to_vec(),
            gating: input.gating.map(<[Vec<f32>]>::to_vec),
            had_coverage: input.coverage.iter().map(Option::is_some).collect(),
        });
        let mut outputs = Vec::with_capacity(input.len());
        for (i, &token) in input.latest_tokens.iter().enumerate() {
            let mut history = input.states[i].clone();
            if history.is_empty() {
                history.push(START);
            } else {
                history.push(token);
            }
            let mut candidates = (self.script)(&history);
            candidates.truncate(input.top_k);
            let attn_dist = match input.gating {
                Some(g) => normalize(&g[i]),
                None => vec![1.0 / self.encoder_len.max(1) as f32; self.encoder_len],
            };
            let coverage = input.coverage[i].map(|prev| {
                prev.iter()
                    .zip(&attn_dist)
                    .map(|(c, a)| c + a)
                    .collect::<Vec<f32>>()
            });
            outputs.push(StepOutput {
                top_ids: candidates.iter().map(|&(t, _)| t).collect(),
                top_log_probs: candidates.iter().map(|&(_, lp)| lp).collect(),
                state: history,
                attn_dist,
                p_gen: Some(1.0),
                coverage,
            });
        }
        Ok(outputs)
    }
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let total: f32 = v.iter().sum();
    if total > 0.0 {
        v.iter().map(|x| x / total).collect()
    } else {
        vec![0.0; v.len()]
    }
}

/// Candidate list in which each token gets its own log-probability.
pub fn dist(pairs: &[(TokenId, f32)]) -> Vec<(TokenId, f32)> {
    pairs.to_vec()
}
