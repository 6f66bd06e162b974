//! Enrichment stage: strategy-specific prompt, fenced-JSON parsing and the enrichment schema.

pub(crate) mod enrichment;
mod strategy;

pub use strategy::Strategy;
