use super::super::*;
use super::plain_config;
use crate::decoder::{Decoder, StepInput, StepOutput};
use crate::source::SourceDocument;
use crate::testutil::*;
use crate::{BoxError, TokenId};

fn doc() -> SourceDocument {
    SourceDocument::new(vec![vec![A, B, PERIOD], vec![C, PERIOD]])
}

/// Same four candidates regardless of history.
fn constant(_: &[TokenId]) -> Vec<(TokenId, f32)> {
    dist(&[(A, -0.1), (B, -0.5), (C, -2.0), (STOP, -3.0)])
}

#[test]
fn test_falls_back_to_live_beam() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, constant);
    let config = plain_config(2, 3, 1);

    let (best, stats) =
        run_beam_search_traced(&mut decoder, &vocab, &doc(), None, &config).unwrap();

    assert_eq!(best.tokens(), vec![START, A, A, A]);
    assert!((best.log_prob() + 0.3).abs() < 1e-6);
    assert_eq!(stats.steps, 3);
    assert_eq!(stats.finished, 0);
    assert!(stats.fell_back);
    assert_eq!(decoder.calls.len(), 3);
}

#[test]
fn test_first_step_expands_a_single_parent() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, constant);
    let config = plain_config(2, 2, 0);

    run_beam_search(&mut decoder, &vocab, &doc(), None, &config).unwrap();

    // Both initial hypotheses are fed, but only one is expanded, so the
    // second step sees two different tokens rather than `a` twice.
    assert_eq!(decoder.calls[0].latest_tokens, vec![START, START]);
    assert_eq!(decoder.calls[1].latest_tokens, vec![A, B]);
}

#[test]
fn test_stop_before_min_steps_is_discarded() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, |_: &[TokenId]| {
        dist(&[(STOP, -0.01), (A, -0.1), (B, -0.5), (C, -2.0)])
    });
    let config = plain_config(2, 5, 2);

    let (best, stats) =
        run_beam_search_traced(&mut decoder, &vocab, &doc(), None, &config).unwrap();

    assert_eq!(best.tokens(), vec![START, A, A, STOP]);
    assert_eq!(stats.finished, 2);
    assert!(!stats.fell_back);
    assert_eq!(stats.steps, 3);
}

#[test]
fn test_finished_hypothesis_beats_better_live_one() {
    let vocab = test_vocab();
    let script = |history: &[TokenId]| match history {
        [START] => dist(&[(A, -0.1), (B, -0.2), (C, -3.0), (STOP, -4.0)]),
        [START, B] => dist(&[(STOP, -0.5), (A, -1.0), (B, -1.0), (C, -1.0)]),
        _ => dist(&[(A, -0.01), (B, -1.0), (C, -2.0), (STOP, -5.0)]),
    };
    let mut decoder = ScriptedDecoder::new(5, script);
    let config = plain_config(2, 3, 0);

    let (best, stats) =
        run_beam_search_traced(&mut decoder, &vocab, &doc(), None, &config).unwrap();

    assert_eq!(best.tokens(), vec![START, B, STOP]);
    assert_eq!(stats.finished, 1);
    assert!(!stats.fell_back);
}

#[test]
fn test_search_stops_once_beam_width_results_exist() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, |_: &[TokenId]| {
        dist(&[(STOP, -0.1), (A, -1.0)])
    });
    let config = plain_config(1, 50, 0);

    let (best, stats) =
        run_beam_search_traced(&mut decoder, &vocab, &doc(), None, &config).unwrap();

    assert_eq!(best.tokens(), vec![START, STOP]);
    assert_eq!(stats.steps, 1);
    assert_eq!(decoder.calls.len(), 1);
}

#[test]
fn test_oov_ids_are_fed_back_as_unknown() {
    let vocab = test_vocab();
    let placeholder: TokenId = 9;
    let script = move |history: &[TokenId]| match history {
        [START] => dist(&[(placeholder, -0.1), (A, -0.2), (B, -1.0), (C, -1.0)]),
        _ => dist(&[(A, -0.1), (B, -0.2), (C, -1.0), (STOP, -2.0)]),
    };
    let mut decoder = ScriptedDecoder::new(5, script);
    let config = plain_config(2, 2, 0);
    let source = doc().with_oovs(vec!["x".into(), "zebra".into()]);

    let (best, stats) =
        run_beam_search_traced(&mut decoder, &vocab, &source, None, &config).unwrap();

    assert_eq!(decoder.calls[1].latest_tokens, vec![0, A]);
    assert_eq!(stats.oov_substitutions, 1);
    assert_eq!(best.tokens(), vec![START, placeholder, A]);
    assert_eq!(
        vocab.render(&best.tokens()[1..], &source.oovs),
        vec!["zebra", "a"]
    );
}

#[test]
fn test_coverage_follows_decoder_capability() {
    let vocab = test_vocab();
    let config = plain_config(2, 2, 0);

    let mut with = ScriptedDecoder::new(4, constant);
    let best = run_beam_search(&mut with, &vocab, &doc().with_encoder_len(4), None, &config)
        .unwrap();
    assert_eq!(with.calls[0].had_coverage, vec![true, true]);
    // Two steps of uniform attention over four positions.
    assert_eq!(best.coverage(), Some(&[0.5f32, 0.5, 0.5, 0.5][..]));

    let mut without = ScriptedDecoder::new(4, constant).without_coverage();
    let best = run_beam_search(&mut without, &vocab, &doc().with_encoder_len(4), None, &config)
        .unwrap();
    assert_eq!(without.calls[0].had_coverage, vec![false, false]);
    assert!(best.coverage().is_none());
}

#[test]
fn test_hypothesis_records_per_step_outputs() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, constant);
    let config = plain_config(2, 3, 1);

    let best = run_beam_search(&mut decoder, &vocab, &doc(), None, &config).unwrap();

    assert_eq!(best.log_probs().len(), best.len());
    assert_eq!(best.attn_dists().len(), best.len() - 1);
    assert_eq!(best.p_gens(), Some(vec![1.0; best.len() - 1]));
    assert_eq!(*best.state(), vec![START, A, A]);
}

#[test]
fn test_gating_absent_when_diversity_disabled() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, constant);
    run_beam_search(&mut decoder, &vocab, &doc(), None, &plain_config(2, 2, 0)).unwrap();
    assert!(decoder.calls.iter().all(|c| c.gating.is_none()));
}

#[test]
fn test_empty_result_set() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, |_: &[TokenId]| {
        dist(&[(STOP, -0.1), (STOP, -0.2)])
    });
    let config = plain_config(1, 10, 5);

    let err = run_beam_search(&mut decoder, &vocab, &doc(), None, &config).unwrap_err();
    assert!(matches!(err, DecodeError::EmptyResultSet));
    assert_eq!(decoder.calls.len(), 1);
}

#[test]
fn test_invalid_config_is_rejected_before_decoding() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, constant);

    let err = run_beam_search(&mut decoder, &vocab, &doc(), None, &plain_config(0, 3, 0))
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidConfiguration(ref e) if e.field == "beam.beam_width"));

    let err = run_beam_search(&mut decoder, &vocab, &doc(), None, &plain_config(2, 3, 4))
        .unwrap_err();
    assert!(matches!(err, DecodeError::InvalidConfiguration(_)));
    assert!(decoder.calls.is_empty());
}

#[test]
fn test_short_candidate_list_is_malformed() {
    let vocab = test_vocab();
    let mut decoder = ScriptedDecoder::new(5, |_: &[TokenId]| dist(&[(A, -0.1), (B, -0.2)]));

    let err = run_beam_search(&mut decoder, &vocab, &doc(), None, &plain_config(2, 3, 0))
        .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedStep { step: 0, .. }));
}

struct FailingDecoder;

#[derive(Debug, thiserror::Error)]
#[error("device lost")]
struct DeviceLost;

impl Decoder for FailingDecoder {
    type EncoderStates = ();
    type State = ();

    fn run_encoder(&mut self, _source: &SourceDocument) -> Result<((), ()), BoxError> {
        Ok(((), ()))
    }

    fn decode_one_step(
        &mut self,
        _input: StepInput<'_, (), ()>,
    ) -> Result<Vec<StepOutput<()>>, BoxError> {
        Err(Box::new(DeviceLost))
    }
}

#[test]
fn test_decoder_error_propagates() {
    let vocab = test_vocab();
    let err = run_beam_search(
        &mut FailingDecoder,
        &vocab,
        &doc(),
        None,
        &plain_config(2, 3, 0),
    )
    .unwrap_err();

    match err {
        DecodeError::Decoder(source) => assert!(source.downcast_ref::<DeviceLost>().is_some()),
        other => panic!("expected a decoder error, got {other:?}"),
    }
}

#[test]
fn test_repeated_decodes_are_identical() {
    let vocab = test_vocab();
    let config = plain_config(3, 6, 2);
    let script = |history: &[TokenId]| {
        let n = history.len() as f32;
        dist(&[
            (A, -0.3 * n),
            (B, -0.3 * n),
            (C, -0.2),
            (PERIOD, -0.25),
            (STOP, -0.4),
            (A, -0.9),
        ])
    };

    let mut first = ScriptedDecoder::new(5, script);
    let mut second = ScriptedDecoder::new(5, script);
    let (a, stats_a) = run_beam_search_traced(&mut first, &vocab, &doc(), None, &config).unwrap();
    let (b, stats_b) = run_beam_search_traced(&mut second, &vocab, &doc(), None, &config).unwrap();

    assert_eq!(a.tokens(), b.tokens());
    assert_eq!(a.log_prob().to_bits(), b.log_prob().to_bits());
    assert_eq!(stats_a, stats_b);
}
