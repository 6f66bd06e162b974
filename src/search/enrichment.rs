use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::Strategy;
use crate::gemini::types::RawReference;

/// Upper bound on curated library entries kept from a response.
pub const MAX_LIBRARY_ITEMS: usize = 7;
const FALLBACK_DESCRIPTION: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnrichedReference {
    pub original_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default)]
    pub is_paper: bool,
}

impl EnrichedReference {
    /// Placeholder used for export when enrichment could not be parsed.
    pub fn unenriched(raw: &RawReference) -> Self {
        Self {
            original_url: raw.uri.clone(),
            original_title: raw.title.clone(),
            description: FALLBACK_DESCRIPTION.to_string(),
            is_paper: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LibraryItemType {
    Paper,
    News,
    Blog,
    #[serde(other)]
    Other,
}

impl LibraryItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            LibraryItemType::Paper => "Paper",
            LibraryItemType::News => "News",
            LibraryItemType::Blog => "Blog",
            LibraryItemType::Other => "Other",
        }
    }
}

impl std::fmt::Display for LibraryItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryItem {
    pub original_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: LibraryItemType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnrichmentData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub enriched_references: Vec<EnrichedReference>,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub library_items: Vec<LibraryItem>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, thiserror::Error)]
#[error("enrichment response is not valid JSON for the expected schema: {source}")]
pub struct EnrichmentParseError {
    #[source]
    pub source: serde_json::Error,
    /// Unwrapped text that failed to parse.
    pub text: String,
}

pub fn build_prompt(query: &str, references: &[RawReference], strategy: Strategy) -> String {
    let results = serde_json::to_string(references).unwrap_or_else(|_| "[]".to_string());
    let guidance = strategy.instructions(query);

    format!(
        r#"The user searched for "{query}". These are the web search results:
{results}

**Use this search strategy throughout your analysis and response:**
{guidance}

Respond with exactly one valid JSON object and nothing else: no comments, no markdown, no surrounding text. It must have this shape:
{{
  "enriched_references": [
    {{ "original_url": "URL_STRING", "original_title": "TITLE_STRING", "description": "ONE_SENTENCE_DESCRIPTION (following the strategy)", "is_paper": BOOLEAN }}
  ],
  "suggestion": "ONE_FOLLOW_UP_QUESTION_OR_TOPIC (following the strategy)",
  "library_items": [
    {{ "original_url": "URL_STRING", "original_title": "TITLE_STRING", "description": "ONE_SENTENCE_DESCRIPTION_OF_THE_CONTENT (following the strategy)", "type": "Paper" | "News" | "Blog" | "Other" }}
  ]
}}

Field rules, all following the chosen strategy:
- "enriched_references": a 'description' and an 'is_paper' flag for each result.
- "suggestion": a single follow-up.
- "library_items": up to 5-7 results that fit the strategy, each with its original URL, title, a one-sentence description and a 'type' of 'Paper', 'News', 'Blog' or 'Other'. Leave out results that do not fit; use an empty array if none fit.

Escape every string value correctly. Output only the JSON object."#
    )
}

/// Removes a surrounding ``` fence (with optional language tag) if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    let body = inner
        .trim_start_matches(|c: char| c.is_alphanumeric() || c == '_')
        .trim();
    if body.is_empty() { trimmed } else { body }
}

pub fn parse_enrichment(response: &str) -> Result<EnrichmentData, EnrichmentParseError> {
    let text = strip_code_fence(response);
    let mut data: EnrichmentData =
        serde_json::from_str(text).map_err(|source| EnrichmentParseError {
            source,
            text: text.to_string(),
        })?;

    if data.library_items.len() > MAX_LIBRARY_ITEMS {
        debug!(
            returned = data.library_items.len(),
            kept = MAX_LIBRARY_ITEMS,
            "truncating library items"
        );
        data.library_items.truncate(MAX_LIBRARY_ITEMS);
    }
    if data.suggestion.as_deref().is_some_and(|s| s.trim().is_empty()) {
        data.suggestion = None;
    }

    Ok(data)
}
