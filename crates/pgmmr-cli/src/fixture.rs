//! JSON decode fixtures: a vocabulary, one tokenized article, optional
//! sentence importances and a bigram table standing in for the model.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use pgmmr_core::source::SourceDocument;
use pgmmr_core::vocab::{Vocab, Vocabulary};
use pgmmr_core::TokenId;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown word {word:?} in {context}")]
    UnknownWord { word: String, context: &'static str },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    /// Vocabulary words in id order, reserved symbols excluded.
    pub vocab: Vec<String>,
    /// Source article, one word list per sentence.
    pub sentences: Vec<Vec<String>>,
    /// Sentence importances; diversity scoring needs them.
    #[serde(default)]
    pub importance: Option<Vec<f32>>,
    /// `previous word -> next word -> log-probability`.
    pub bigrams: BTreeMap<String, BTreeMap<String, f32>>,
    /// Log-probability of every next word the table does not list.
    #[serde(default = "default_log_prob")]
    pub default_log_prob: f32,
    #[serde(default)]
    pub encoder_len: Option<usize>,
}

fn default_log_prob() -> f32 {
    -20.0
}

/// A fixture resolved to ids.
#[derive(Debug)]
pub struct Prepared {
    pub vocab: Vocab,
    pub source: SourceDocument,
    /// Candidate table keyed by previous id, best first.
    pub bigrams: BTreeMap<TokenId, Vec<(TokenId, f32)>>,
    /// Vocabulary plus article-local placeholder ids.
    pub extended_size: usize,
    pub default_log_prob: f32,
}

impl Fixture {
    pub fn parse(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Map every word to an id. Article words missing from the vocabulary
    /// get copy placeholders after the vocabulary ids.
    pub fn prepare(&self) -> Result<Prepared, FixtureError> {
        if self.sentences.is_empty() {
            return Err(FixtureError::Invalid("fixture has no sentences".into()));
        }
        if let Some(importance) = &self.importance {
            if importance.len() != self.sentences.len() {
                return Err(FixtureError::Invalid(format!(
                    "{} importances for {} sentences",
                    importance.len(),
                    self.sentences.len()
                )));
            }
        }

        let vocab = Vocab::from_words(&self.vocab);
        let unknown = vocab.specials().unknown;
        let mut oovs: Vec<String> = Vec::new();
        let sentences: Vec<Vec<TokenId>> = self
            .sentences
            .iter()
            .map(|sent| {
                sent.iter()
                    .map(|w| {
                        let id = vocab.token_to_id(w);
                        if id != unknown || w == pgmmr_core::vocab::UNKNOWN_TOKEN {
                            return id;
                        }
                        let pos = oovs.iter().position(|o| o == w).unwrap_or_else(|| {
                            oovs.push(w.clone());
                            oovs.len() - 1
                        });
                        (vocab.size() + pos) as TokenId
                    })
                    .collect()
            })
            .collect();

        let resolve = |word: &str, context: &'static str| -> Result<TokenId, FixtureError> {
            if let Some(pos) = oovs.iter().position(|o| o == word) {
                return Ok((vocab.size() + pos) as TokenId);
            }
            let id = vocab.token_to_id(word);
            if id == unknown && word != pgmmr_core::vocab::UNKNOWN_TOKEN {
                return Err(FixtureError::UnknownWord {
                    word: word.to_string(),
                    context,
                });
            }
            Ok(id)
        };

        let mut bigrams = BTreeMap::new();
        for (prev, nexts) in &self.bigrams {
            let prev_id = resolve(prev.as_str(), "bigram context")?;
            let mut row = nexts
                .iter()
                .map(|(w, &lp)| resolve(w.as_str(), "bigram continuation").map(|id| (id, lp)))
                .collect::<Result<Vec<_>, _>>()?;
            row.sort_by(|a, b| b.1.total_cmp(&a.1));
            bigrams.insert(prev_id, row);
        }

        let extended_size = vocab.size() + oovs.len();
        let mut source = SourceDocument::new(sentences).with_oovs(oovs);
        if let Some(n) = self.encoder_len {
            source = source.with_encoder_len(n);
        }
        Ok(Prepared {
            vocab,
            source,
            bigrams,
            extended_size,
            default_log_prob: self.default_log_prob,
        })
    }
}

/// The bundled example fixture.
#[cfg(test)]
pub(crate) const TINY: &str = include_str!("../fixtures/tiny.json");
