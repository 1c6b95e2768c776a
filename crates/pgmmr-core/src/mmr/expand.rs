/// Uniform `1/encoder_len` weights, used before any sentence score exists
/// and for encoder positions no sentence covers.
pub fn uniform_word_scores(encoder_len: usize) -> Vec<f32> {
    if encoder_len == 0 {
        return Vec::new();
    }
    vec![1.0 / encoder_len as f32; encoder_len]
}

/// Broadcast per-sentence scores to the encoder positions of each
/// sentence's tokens.
///
/// Sentences are laid out back to back from position 0. Positions past the
/// last sentence keep the uniform default; tokens beyond `encoder_len` were
/// truncated by the encoder and are dropped.
pub fn expand_to_words(
    sentence_scores: &[f32],
    sentence_lengths: &[usize],
    encoder_len: usize,
) -> Vec<f32> {
    let mut words = uniform_word_scores(encoder_len);
    let mut start = 0;
    for (&score, &len) in sentence_scores.iter().zip(sentence_lengths) {
        if start >= encoder_len {
            break;
        }
        let end = (start + len).min(encoder_len);
        words[start..end].fill(score);
        start += len;
    }
    words
}
