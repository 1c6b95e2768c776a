//! Source document layout and summary sentence segmentation.

use crate::vocab::SpecialTokens;
use crate::TokenId;

/// A tokenized source article, one id list per sentence.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    pub sentences: Vec<Vec<TokenId>>,
    /// Length of the encoder input. Defaults to the total token count; set it
    /// explicitly when the encoder truncates or pads the article.
    pub encoder_len: usize,
    /// Article words that are not in the vocabulary, indexed by
    /// `placeholder_id - vocab_size`.
    pub oovs: Vec<String>,
}

impl SourceDocument {
    pub fn new(sentences: Vec<Vec<TokenId>>) -> Self {
        let encoder_len = sentences.iter().map(Vec::len).sum();
        Self {
            sentences,
            encoder_len,
            oovs: Vec::new(),
        }
    }

    pub fn with_encoder_len(mut self, encoder_len: usize) -> Self {
        self.encoder_len = encoder_len;
        self
    }

    pub fn with_oovs(mut self, oovs: Vec<String>) -> Self {
        self.oovs = oovs;
        self
    }

    pub fn num_sentences(&self) -> usize {
        self.sentences.len()
    }

    pub fn num_tokens(&self) -> usize {
        self.sentences.iter().map(Vec::len).sum()
    }

    pub fn sentence_lengths(&self) -> Vec<usize> {
        self.sentences.iter().map(Vec::len).collect()
    }
}

/// Split a hypothesis' tokens into the summary sentences it has completed.
///
/// The leading start symbol is skipped. Each sentence keeps its boundary
/// token; trailing tokens after the last boundary form an unfinished
/// sentence and are dropped.
pub fn completed_sentences(tokens: &[TokenId], specials: &SpecialTokens) -> Vec<Vec<TokenId>> {
    let body = match tokens.first() {
        Some(&t) if t == specials.start => &tokens[1..],
        _ => tokens,
    };
    body.split_inclusive(|&t| t == specials.sentence_end)
        .filter(|s| s.last() == Some(&specials.sentence_end))
        .map(<[TokenId]>::to_vec)
        .collect()
}
