//! Beam hypotheses with structurally shared prefixes.
//!
//! A hypothesis is never mutated after construction. Extending one links a
//! new emission onto the parent's trail, so the `2×beam_width` children of a
//! parent share its prefix instead of copying it.

use std::sync::Arc;

use crate::TokenId;

/// Everything recorded for one generated token.
#[derive(Debug)]
pub struct Emission {
    pub token: TokenId,
    pub log_prob: f32,
    /// Shared by every sibling extended from the same decoder output.
    pub attn_dist: Arc<[f32]>,
    pub p_gen: Option<f32>,
}

#[derive(Debug)]
struct TrailNode {
    emission: Emission,
    len: usize,
    parent: Option<Arc<TrailNode>>,
}

/// Persistent list of emissions, newest at the head.
#[derive(Debug, Clone, Default)]
struct Trail(Option<Arc<TrailNode>>);

impl Trail {
    fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |n| n.len)
    }

    fn push(&self, emission: Emission) -> Self {
        Trail(Some(Arc::new(TrailNode {
            emission,
            len: self.len() + 1,
            parent: self.0.clone(),
        })))
    }

    fn last(&self) -> Option<&Emission> {
        self.0.as_deref().map(|n| &n.emission)
    }

    /// Emissions oldest first.
    fn to_vec(&self) -> Vec<&Emission> {
        let mut out = Vec::with_capacity(self.len());
        let mut cur = self.0.as_deref();
        while let Some(node) = cur {
            out.push(&node.emission);
            cur = node.parent.as_deref();
        }
        out.reverse();
        out
    }
}

/// A partial or complete summary under consideration.
#[derive(Debug, Clone)]
pub struct Hypothesis<S> {
    start: TokenId,
    trail: Trail,
    log_prob_sum: f32,
    state: S,
    coverage: Option<Arc<[f32]>>,
    similarity: Option<Arc<[f32]>>,
    mmr: Option<Arc<[f32]>>,
}

impl<S> Hypothesis<S> {
    /// The length-1 hypothesis holding only the start symbol.
    pub fn initial(
        start: TokenId,
        state: S,
        coverage: Option<Arc<[f32]>>,
        mmr: Option<Arc<[f32]>>,
    ) -> Self {
        Self {
            start,
            trail: Trail::default(),
            log_prob_sum: 0.0,
            state,
            coverage,
            similarity: None,
            mmr,
        }
    }

    /// Return a new hypothesis one token longer. The MMR and similarity
    /// vectors are inherited from `self`.
    pub fn extend(&self, emission: Emission, state: S, coverage: Option<Arc<[f32]>>) -> Self {
        let log_prob_sum = self.log_prob_sum + emission.log_prob;
        Self {
            start: self.start,
            trail: self.trail.push(emission),
            log_prob_sum,
            state,
            coverage,
            similarity: self.similarity.clone(),
            mmr: self.mmr.clone(),
        }
    }

    /// Copy of `self` with freshly computed similarity and MMR vectors.
    pub fn with_mmr(&self, similarity: Arc<[f32]>, mmr: Arc<[f32]>) -> Self
    where
        S: Clone,
    {
        Self {
            similarity: Some(similarity),
            mmr: Some(mmr),
            ..self.clone()
        }
    }

    /// Number of tokens including the start symbol.
    pub fn len(&self) -> usize {
        self.trail.len() + 1
    }

    /// Always false: a hypothesis holds at least the start symbol.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn latest_token(&self) -> TokenId {
        self.trail.last().map_or(self.start, |e| e.token)
    }

    pub fn tokens(&self) -> Vec<TokenId> {
        std::iter::once(self.start)
            .chain(self.trail.to_vec().into_iter().map(|e| e.token))
            .collect()
    }

    /// Per-token log-probabilities; the start symbol contributes 0.
    pub fn log_probs(&self) -> Vec<f32> {
        std::iter::once(0.0)
            .chain(self.trail.to_vec().into_iter().map(|e| e.log_prob))
            .collect()
    }

    /// Sum of the per-token log-probabilities.
    pub fn log_prob(&self) -> f32 {
        self.log_prob_sum
    }

    /// Log-probability normalized by length, the ranking key.
    pub fn avg_log_prob(&self) -> f32 {
        self.log_prob_sum / self.len() as f32
    }

    /// One attention distribution per generated token.
    pub fn attn_dists(&self) -> Vec<Arc<[f32]>> {
        self.trail
            .to_vec()
            .into_iter()
            .map(|e| Arc::clone(&e.attn_dist))
            .collect()
    }

    /// Generation probabilities per generated token, or `None` when the
    /// model has no copy mechanism.
    pub fn p_gens(&self) -> Option<Vec<f32>> {
        self.trail.to_vec().into_iter().map(|e| e.p_gen).collect()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn coverage(&self) -> Option<&[f32]> {
        self.coverage.as_deref()
    }

    /// Redundancy of the summary against each source sentence, as of the
    /// last completed sentence. `None` until the first one is completed.
    pub fn similarity(&self) -> Option<&[f32]> {
        self.similarity.as_deref()
    }

    /// Sentence-level MMR scores; `None` when diversity scoring is off.
    pub fn mmr(&self) -> Option<&[f32]> {
        self.mmr.as_deref()
    }
}
