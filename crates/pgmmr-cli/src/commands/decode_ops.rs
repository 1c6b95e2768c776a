use std::path::Path;
use std::process;

use serde::Serialize;
use tracing::info;

use pgmmr_core::beam::{DecodeError, DecodeStats, DiversityScorers};
use pgmmr_core::mmr::{trace_best, MmrTrace};
use pgmmr_core::scorer::{FixedImportance, UnigramOverlap};
use pgmmr_core::settings::{default_config, load_settings, BeamConfig};
use pgmmr_core::source::completed_sentences;
use pgmmr_core::vocab::Vocabulary;
use pgmmr_core::{run_beam_search_traced, BoxError};

use crate::bigram::BigramDecoder;
use crate::fixture::{Fixture, FixtureError, Prepared};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeCmdError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("MMR trace failed: {0}")]
    Trace(#[source] BoxError),
}

/// Everything `decode` reports about one run.
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    /// Generated words, start and stop symbols excluded.
    pub summary: Vec<String>,
    pub tokens: Vec<u32>,
    pub log_prob: f32,
    pub avg_log_prob: f32,
    pub stats: DecodeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<MmrTrace>,
}

/// Decode a fixture and build the report.
///
/// Diversity scoring uses the fixture's importances and unigram overlap as
/// similarity. Without importances it is switched off.
pub fn decode_fixture(
    fixture: &Fixture,
    config: &BeamConfig,
    with_trace: bool,
) -> Result<DecodeReport, DecodeCmdError> {
    let prepared = fixture.prepare()?;
    let specials = prepared.vocab.specials();
    let importance = fixture.importance.clone().map(FixedImportance);
    let similarity = UnigramOverlap::new(vec![specials.unknown, specials.sentence_end]);

    let mut config = config.clone();
    if importance.is_none() && config.diversity.enabled {
        info!("fixture has no importances; diversity scoring disabled");
        config.diversity.enabled = false;
    }
    let scorers = importance.as_ref().map(|importance| DiversityScorers {
        importance,
        similarity: &similarity,
    });

    let mut decoder = BigramDecoder::new(&prepared);
    let (best, stats) = run_beam_search_traced(
        &mut decoder,
        &prepared.vocab,
        &prepared.source,
        scorers,
        &config,
    )?;

    let tokens = best.tokens();
    let body: Vec<u32> = tokens
        .iter()
        .copied()
        .skip(1)
        .filter(|&t| t != specials.stop)
        .collect();
    let summary = prepared.vocab.render(&body, &prepared.source.oovs);

    let trace = match (&importance, with_trace) {
        (Some(importance), true) => Some(mmr_trace(
            &prepared,
            &importance.0,
            &tokens,
            &similarity,
            config.diversity.lambda,
        )?),
        _ => None,
    };

    Ok(DecodeReport {
        summary,
        tokens,
        log_prob: best.log_prob(),
        avg_log_prob: best.avg_log_prob(),
        stats,
        trace,
    })
}

fn mmr_trace(
    prepared: &Prepared,
    importance: &[f32],
    tokens: &[u32],
    similarity: &UnigramOverlap,
    lambda: f32,
) -> Result<MmrTrace, DecodeCmdError> {
    let summary = completed_sentences(tokens, &prepared.vocab.specials());
    trace_best(
        importance,
        &prepared.source.sentences,
        &summary,
        similarity,
        lambda,
    )
    .map_err(DecodeCmdError::Trace)
}

pub fn decode_cmd(fixture_file: &str, config_file: Option<&str>, json: bool, with_trace: bool) {
    let fixture = die!(
        Fixture::load(Path::new(fixture_file)),
        "Error reading fixture {fixture_file}: {}"
    );
    let config = match config_file {
        Some(path) => die!(load_settings(Path::new(path)), "Error loading settings: {}"),
        None => default_config(),
    };
    let report = die!(decode_fixture(&fixture, &config, with_trace), "Error: {}");

    if json {
        let out = die!(serde_json::to_string_pretty(&report), "JSON serialization failed: {}");
        println!("{out}");
        return;
    }

    println!("{}", report.summary.join(" "));
    println!(
        "avg_log_prob={:.4} log_prob={:.4} len={}",
        report.avg_log_prob,
        report.log_prob,
        report.tokens.len()
    );
    let s = &report.stats;
    println!(
        "steps={} finished={} fell_back={} oov_substitutions={} mmr_refreshes={}",
        s.steps, s.finished, s.fell_back, s.oov_substitutions, s.mmr_refreshes
    );
    if let Some(trace) = &report.trace {
        println!();
        println!("=== MMR trace ===");
        for snap in &trace.snapshots {
            let fmt = |v: &[f32]| {
                v.iter()
                    .map(|x| format!("{x:.3}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            println!("after {} sentence(s):", snap.sentences_written);
            println!("  importance: {}", fmt(&snap.importance));
            println!("  similarity: {}", fmt(&snap.similarity));
            println!("  mmr:        {}", fmt(&snap.mmr));
        }
    }
}
