//! Gemini `generateContent` client: grounded search and JSON-constrained generation.

pub(crate) mod client;
mod grounding;
pub(crate) mod types;
