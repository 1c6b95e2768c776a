use std::sync::Arc;

use tracing::{debug, debug_span, trace};

use crate::decoder::{Decoder, StepInput, StepOutput};
use crate::hypothesis::{Emission, Hypothesis};
use crate::settings::BeamConfig;
use crate::source::SourceDocument;
use crate::vocab::{map_oov, Vocabulary};
use crate::TokenId;

use super::diversity::Diversity;
use super::select::{select_best, sort_hyps};
use super::{DecodeError, DecodeStats, DiversityScorers};

/// Run beam search over one article and return the best hypothesis.
///
/// Finished hypotheses (those that emitted the stop token on or after
/// `min_decode_steps`) are preferred; when none finish within
/// `max_decode_steps`, the best live hypothesis is returned instead.
///
/// [`DecodeError::EmptyResultSet`] can only come from a decoder that repeats
/// candidate ids, since distinct ids leave at most one stop per parent.
pub fn run_beam_search<D: Decoder>(
    decoder: &mut D,
    vocab: &dyn Vocabulary,
    source: &SourceDocument,
    scorers: Option<DiversityScorers<'_>>,
    config: &BeamConfig,
) -> Result<Hypothesis<D::State>, DecodeError> {
    run_beam_search_traced(decoder, vocab, source, scorers, config).map(|(best, _)| best)
}

/// [`run_beam_search`], also returning counters about the decode.
pub fn run_beam_search_traced<D: Decoder>(
    decoder: &mut D,
    vocab: &dyn Vocabulary,
    source: &SourceDocument,
    scorers: Option<DiversityScorers<'_>>,
    config: &BeamConfig,
) -> Result<(Hypothesis<D::State>, DecodeStats), DecodeError> {
    config.validate()?;
    let beam_width = config.search.beam_width;
    let max_steps = config.search.max_decode_steps;
    let min_steps = config.search.min_decode_steps;
    let top_k = beam_width * 2;
    let specials = vocab.specials();
    let _span = debug_span!(
        "run_beam_search",
        beam_width,
        max_steps,
        sentences = source.num_sentences(),
        encoder_len = source.encoder_len
    )
    .entered();

    let (enc_states, dec_in_state) = decoder.run_encoder(source).map_err(DecodeError::Decoder)?;
    let diversity = Diversity::resolve(scorers, &config.diversity, source)?;

    let coverage_init: Option<Arc<[f32]>> = decoder
        .uses_coverage()
        .then(|| Arc::from(vec![0.0f32; source.encoder_len]));
    let mmr_init = diversity.initial_mmr();
    let mut hyps: Vec<Hypothesis<D::State>> = (0..beam_width)
        .map(|_| {
            Hypothesis::initial(
                specials.start,
                dec_in_state.clone(),
                coverage_init.clone(),
                mmr_init.clone(),
            )
        })
        .collect();
    let mut results: Vec<Hypothesis<D::State>> = Vec::with_capacity(beam_width);
    let mut stats = DecodeStats::default();

    let mut steps = 0;
    while steps < max_steps && results.len() < beam_width {
        if hyps.is_empty() {
            debug!(steps, "every candidate stopped early; live beam is empty");
            break;
        }

        let latest_tokens: Vec<TokenId> = hyps
            .iter()
            .map(|h| {
                let token = h.latest_token();
                let mapped = map_oov(token, vocab);
                if mapped != token {
                    stats.oov_substitutions += 1;
                    trace!(token, "copy placeholder fed back as unknown");
                }
                mapped
            })
            .collect();
        let gating = diversity.word_gating(&hyps, source);

        let input = StepInput {
            latest_tokens: &latest_tokens,
            encoder_states: &enc_states,
            states: hyps.iter().map(|h| h.state()).collect(),
            coverage: hyps.iter().map(|h| h.coverage()).collect(),
            gating: gating.as_deref(),
            top_k,
        };
        let outputs = decoder.decode_one_step(input).map_err(DecodeError::Decoder)?;
        check_step_output(&outputs, hyps.len(), top_k, steps)?;

        // On the first step every hypothesis is the same start state.
        let num_orig_hyps = if steps == 0 { 1 } else { hyps.len() };
        let mut all_hyps = Vec::with_capacity(num_orig_hyps * top_k);
        for (h, out) in hyps.iter().zip(outputs).take(num_orig_hyps) {
            let attn_dist: Arc<[f32]> = Arc::from(out.attn_dist);
            let coverage: Option<Arc<[f32]>> = out.coverage.map(Arc::from);
            for j in 0..top_k {
                let emission = Emission {
                    token: out.top_ids[j],
                    log_prob: out.top_log_probs[j],
                    attn_dist: Arc::clone(&attn_dist),
                    p_gen: out.p_gen,
                };
                all_hyps.push(h.extend(emission, out.state.clone(), coverage.clone()));
            }
        }

        sort_hyps(&mut all_hyps);
        hyps = Vec::with_capacity(beam_width);
        for h in all_hyps {
            if h.latest_token() == specials.stop {
                if steps >= min_steps {
                    results.push(h);
                }
            } else {
                hyps.push(h);
            }
            if hyps.len() == beam_width || results.len() == beam_width {
                break;
            }
        }

        for h in hyps.iter_mut() {
            if h.latest_token() != specials.sentence_end {
                continue;
            }
            if let Some(refreshed) = diversity.refresh(h, source, &specials)? {
                *h = refreshed;
                stats.mmr_refreshes += 1;
            }
        }

        steps += 1;
        trace!(
            steps,
            live = hyps.len(),
            finished = results.len(),
            best = hyps.first().map(|h| h.avg_log_prob())
        );
    }

    stats.steps = steps;
    stats.finished = results.len();
    if results.is_empty() {
        stats.fell_back = true;
        results = hyps;
    }
    let best = select_best(results).ok_or(DecodeError::EmptyResultSet)?;
    debug!(
        steps,
        finished = stats.finished,
        fell_back = stats.fell_back,
        len = best.len(),
        avg_log_prob = best.avg_log_prob(),
        "beam search done"
    );
    Ok((best, stats))
}

fn check_step_output<S>(
    outputs: &[StepOutput<S>],
    num_hyps: usize,
    top_k: usize,
    step: usize,
) -> Result<(), DecodeError> {
    let malformed = |reason: String| DecodeError::MalformedStep { step, reason };
    if outputs.len() != num_hyps {
        return Err(malformed(format!(
            "{} outputs for {num_hyps} hypotheses",
            outputs.len()
        )));
    }
    for (i, out) in outputs.iter().enumerate() {
        if out.top_ids.len() < top_k {
            return Err(malformed(format!(
                "hypothesis {i}: {} candidates, expected {top_k}",
                out.top_ids.len()
            )));
        }
        if out.top_log_probs.len() != out.top_ids.len() {
            return Err(malformed(format!(
                "hypothesis {i}: {} ids but {} log-probs",
                out.top_ids.len(),
                out.top_log_probs.len()
            )));
        }
    }
    Ok(())
}
