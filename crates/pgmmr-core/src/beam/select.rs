use crate::hypothesis::Hypothesis;

/// Sort by average log-probability, best first.
///
/// The sort is stable: hypotheses with equal scores keep their input
/// order, which keeps repeated decodes bit-for-bit identical.
pub fn sort_hyps<S>(hyps: &mut [Hypothesis<S>]) {
    hyps.sort_by(|a, b| b.avg_log_prob().total_cmp(&a.avg_log_prob()));
}

/// The hypothesis with the highest average log-probability; the earliest
/// one wins a tie. `None` only for an empty input.
pub fn select_best<S>(hyps: Vec<Hypothesis<S>>) -> Option<Hypothesis<S>> {
    hyps.into_iter().reduce(|best, h| {
        if h.avg_log_prob().total_cmp(&best.avg_log_prob()).is_gt() {
            h
        } else {
            best
        }
    })
}
