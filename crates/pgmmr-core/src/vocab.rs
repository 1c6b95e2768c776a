//! Vocabulary lookup and the special ids the search depends on.
//!
//! `Vocab` reads the conventional `word count` vocabulary file: one entry per
//! line, most frequent first. Ids 0..4 are reserved for the special symbols.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::TokenId;

pub const UNKNOWN_TOKEN: &str = "[UNK]";
pub const PAD_TOKEN: &str = "[PAD]";
pub const START_DECODING: &str = "[START]";
pub const STOP_DECODING: &str = "[STOP]";
pub const PERIOD: &str = ".";

const RESERVED: [&str; 4] = [UNKNOWN_TOKEN, PAD_TOKEN, START_DECODING, STOP_DECODING];

#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("duplicate word in vocabulary: {0}")]
    Duplicate(String),
}

/// Fixed ids the decoding loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub start: TokenId,
    pub stop: TokenId,
    pub unknown: TokenId,
    /// Emitting this token completes a summary sentence.
    pub sentence_end: TokenId,
}

pub trait Vocabulary {
    /// Number of in-vocabulary ids. Larger ids are copy placeholders.
    fn size(&self) -> usize;
    fn token_to_id(&self, word: &str) -> TokenId;
    fn id_to_token(&self, id: TokenId) -> Option<&str>;
    fn specials(&self) -> SpecialTokens;
}

/// Replace a copy-placeholder id with the unknown id so it can be fed back
/// to the decoder's embedding lookup.
pub fn map_oov(token: TokenId, vocab: &dyn Vocabulary) -> TokenId {
    if (token as usize) < vocab.size() {
        token
    } else {
        vocab.specials().unknown
    }
}

/// In-memory word list.
#[derive(Debug, Clone)]
pub struct Vocab {
    words: Vec<String>,
    ids: HashMap<String, TokenId>,
    specials: SpecialTokens,
}

impl Vocab {
    /// Build a vocabulary from words in id order. Reserved symbols are
    /// skipped in the input, repeated words keep their first id, and the
    /// sentence boundary `.` is appended when absent.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Builder::new();
        for w in words {
            let w = w.as_ref();
            if !builder.contains(w) {
                builder.push(w);
            }
        }
        builder.finish()
    }

    /// Read a `word count` vocabulary file, stopping after `max_size`
    /// entries (reserved symbols included) when given.
    pub fn from_reader<R: BufRead>(reader: R, max_size: Option<usize>) -> Result<Self, VocabError> {
        let mut builder = Builder::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            if fields.next().is_none() {
                return Err(VocabError::Parse {
                    line: i + 1,
                    reason: "expected `word count`".to_string(),
                });
            }
            if RESERVED.contains(&word) {
                return Err(VocabError::Parse {
                    line: i + 1,
                    reason: format!("reserved symbol {word} must not appear in the file"),
                });
            }
            if builder.contains(word) {
                return Err(VocabError::Duplicate(word.to_string()));
            }
            if max_size.is_some_and(|max| builder.len() >= max) {
                debug!(max_size = ?max_size, "vocabulary truncated");
                break;
            }
            builder.push(word);
        }
        Ok(builder.finish())
    }

    pub fn open(path: &Path, max_size: Option<usize>) -> Result<Self, VocabError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), max_size)
    }

    /// Words in id order, reserved symbols first.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Render ids as text, resolving copy placeholders from the article's
    /// out-of-vocabulary words (`oovs[id - size]`).
    pub fn render(&self, tokens: &[TokenId], oovs: &[String]) -> Vec<String> {
        tokens
            .iter()
            .map(|&t| match self.id_to_token(t) {
                Some(w) => w.to_string(),
                None => oovs
                    .get(t as usize - self.size())
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_TOKEN.to_string()),
            })
            .collect()
    }
}

impl Vocabulary for Vocab {
    fn size(&self) -> usize {
        self.words.len()
    }

    fn token_to_id(&self, word: &str) -> TokenId {
        self.ids
            .get(word)
            .copied()
            .unwrap_or(self.specials.unknown)
    }

    fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.words.get(id as usize).map(String::as_str)
    }

    fn specials(&self) -> SpecialTokens {
        self.specials
    }
}

struct Builder {
    words: Vec<String>,
    ids: HashMap<String, TokenId>,
}

impl Builder {
    fn new() -> Self {
        let mut b = Self {
            words: Vec::new(),
            ids: HashMap::new(),
        };
        for w in RESERVED {
            b.push(w);
        }
        b
    }

    fn len(&self) -> usize {
        self.words.len()
    }

    fn contains(&self, word: &str) -> bool {
        self.ids.contains_key(word)
    }

    fn push(&mut self, word: &str) {
        self.ids.insert(word.to_string(), self.words.len() as TokenId);
        self.words.push(word.to_string());
    }

    fn finish(mut self) -> Vocab {
        if !self.contains(PERIOD) {
            self.push(PERIOD);
        }
        let specials = SpecialTokens {
            start: self.ids[START_DECODING],
            stop: self.ids[STOP_DECODING],
            unknown: self.ids[UNKNOWN_TOKEN],
            sentence_end: self.ids[PERIOD],
        };
        Vocab {
            words: self.words,
            ids: self.ids,
            specials,
        }
    }
}
