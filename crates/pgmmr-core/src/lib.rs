//! Beam-search decoding for pointer-generator summarization with
//! MMR-driven source gating.
//!
//! The neural network, the sentence-importance model and the redundancy
//! measure are external collaborators reached through the traits in
//! [`decoder`] and [`scorer`]. This crate owns the search: hypothesis
//! bookkeeping, per-step pruning, stop handling, and the MMR state that
//! decides which source sentences the decoder may attend to next.

pub mod beam;
pub mod decoder;
pub mod hypothesis;
pub mod mmr;
#[cfg(feature = "neural")]
pub mod neural;
pub mod scorer;
pub mod settings;
pub mod source;
#[cfg(test)]
pub(crate) mod testutil;
pub mod vocab;

/// Token id in the model vocabulary. Ids at or above the vocabulary size
/// are document-local placeholders for copied source words.
pub type TokenId = u32;

/// Error type returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use beam::{run_beam_search, run_beam_search_traced, DecodeError, DecodeStats};
pub use hypothesis::Hypothesis;
pub use settings::{BeamConfig, DiversityConfig};
