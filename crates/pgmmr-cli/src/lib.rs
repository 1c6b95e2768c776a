//! Diagnostics for the beam-search core: replay JSON fixtures through the
//! search with a table-driven decoder, inspect source gating, and manage
//! settings files.

pub mod bigram;
pub mod commands;
pub mod fixture;
pub mod trace_init;
