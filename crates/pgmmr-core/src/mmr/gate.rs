use serde::Deserialize;

/// How many source sentences stay visible to the decoder each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i64")]
pub enum MuteK {
    /// No muting: scores pass through unchanged.
    Unbounded,
    TopK(usize),
}

impl TryFrom<i64> for MuteK {
    type Error = String;

    /// `-1` is the unbounded sentinel; otherwise k must be at least 1.
    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Self::Unbounded),
            k if k >= 1 => Ok(Self::TopK(k as usize)),
            k => Err(format!("mute_k must be -1 or >= 1, got {k}")),
        }
    }
}

/// Top-k muting of per-sentence scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceGate {
    pub mute_k: MuteK,
    /// Keep each retained sentence's score instead of writing 1.
    pub retain_values: bool,
}

impl SourceGate {
    pub fn apply(&self, scores: &[f32]) -> Vec<f32> {
        match self.mute_k {
            MuteK::Unbounded => scores.to_vec(),
            MuteK::TopK(k) => mute_all_except_top_k(scores, k, self.retain_values),
        }
    }
}

/// Zero every score except the `k` largest.
///
/// When fewer than `k` scores are positive, exactly the positive ones are
/// kept. Equal scores are ordered by position, so the earlier sentence wins
/// a tie at the cut-off. Retained positions hold their score, or 1 when
/// `retain_values` is false.
pub fn mute_all_except_top_k(scores: &[f32], k: usize, retain_values: bool) -> Vec<f32> {
    let positive = scores.iter().filter(|&&v| v > 0.0).count();
    let selected: Vec<usize> = if positive < k {
        (0..scores.len()).filter(|&i| scores[i] > 0.0).collect()
    } else {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        // Stable: ties keep ascending index order.
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        order.truncate(k);
        order
    };

    let mut muted = vec![0.0; scores.len()];
    for i in selected {
        muted[i] = if retain_values { scores[i] } else { 1.0 };
    }
    muted
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn keeps_top_k_as_mask() {
        let gated = mute_all_except_top_k(&[0.1, 0.7, 0.3, 0.5], 2, false);
        assert_eq!(gated, vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn keeps_top_k_magnitudes() {
        let gated = mute_all_except_top_k(&[0.1, 0.7, 0.3, 0.5], 2, true);
        assert_eq!(gated, vec![0.0, 0.7, 0.0, 0.5]);
    }

    #[test]
    fn fewer_positive_than_k_keeps_all_positive() {
        let gated = mute_all_except_top_k(&[0.0, 0.4, 0.0, 0.2], 3, true);
        assert_eq!(gated, vec![0.0, 0.4, 0.0, 0.2]);
    }

    #[test]
    fn all_zero_stays_zero() {
        assert_eq!(mute_all_except_top_k(&[0.0; 4], 2, false), vec![0.0; 4]);
    }

    #[test]
    fn ties_prefer_earlier_sentences() {
        let gated = mute_all_except_top_k(&[0.5, 0.5, 0.9, 0.5], 2, false);
        assert_eq!(gated, vec![1.0, 0.0, 1.0, 0.0]);
        let gated = mute_all_except_top_k(&[0.2, 0.2, 0.2], 1, true);
        assert_eq!(gated, vec![0.2, 0.0, 0.0]);
    }

    #[test]
    fn gating_is_deterministic() {
        let scores = [0.3, 0.3, 0.3, 0.1, 0.3];
        let first = mute_all_except_top_k(&scores, 2, false);
        for _ in 0..10 {
            assert_eq!(mute_all_except_top_k(&scores, 2, false), first);
        }
    }

    #[test]
    fn unbounded_gate_passes_through() {
        let gate = SourceGate {
            mute_k: MuteK::Unbounded,
            retain_values: false,
        };
        assert_eq!(gate.apply(&[0.2, 0.0, 0.9]), vec![0.2, 0.0, 0.9]);
    }

    #[test]
    fn mute_k_from_sentinel() {
        assert_eq!(MuteK::try_from(-1i64), Ok(MuteK::Unbounded));
        assert_eq!(MuteK::try_from(3i64), Ok(MuteK::TopK(3)));
        assert!(MuteK::try_from(0i64).is_err());
        assert!(MuteK::try_from(-2i64).is_err());
    }

    proptest! {
        #[test]
        fn at_most_k_nonzero(
            scores in prop::collection::vec(0.0f32..1.0, 0..24),
            k in 1usize..8,
            retain in any::<bool>(),
        ) {
            let gated = mute_all_except_top_k(&scores, k, retain);
            prop_assert_eq!(gated.len(), scores.len());
            prop_assert!(gated.iter().filter(|&&v| v != 0.0).count() <= k);
        }

        #[test]
        fn few_positive_are_kept_in_place(
            scores in prop::collection::vec(prop_oneof![Just(0.0f32), 0.01f32..1.0], 0..24),
            extra in 1usize..4,
        ) {
            let positive = scores.iter().filter(|&&v| v > 0.0).count();
            let gated = mute_all_except_top_k(&scores, positive + extra, true);
            prop_assert_eq!(gated, scores);
        }

        #[test]
        fn retained_scores_dominate_muted_ones(
            scores in prop::collection::vec(0.0f32..1.0, 1..24),
            k in 1usize..8,
        ) {
            let gated = mute_all_except_top_k(&scores, k, true);
            let min_kept = scores
                .iter()
                .zip(&gated)
                .filter(|(_, g)| **g != 0.0)
                .map(|(&s, _)| s)
                .fold(f32::INFINITY, f32::min);
            for (s, g) in scores.iter().zip(&gated) {
                if *g == 0.0 {
                    prop_assert!(*s <= min_kept);
                }
            }
        }
    }
}
