use tracing::warn;

use super::types::{GenerateContentResponse, GroundedResult, RawReference};

pub fn extract_grounded_result(response: &GenerateContentResponse) -> GroundedResult {
    let overview = response.text();
    if overview.is_empty() {
        warn!("Gemini returned empty overview (safety filter or empty response)");
    }

    let references = response
        .candidates
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.grounding_metadata.as_ref())
        .and_then(|m| m.grounding_chunks.as_ref())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let web = chunk.web.as_ref()?;
                    let uri = web.uri.as_deref().filter(|u| !u.is_empty())?;
                    Some(RawReference::new(uri, web.title.as_deref()))
                })
                .collect()
        })
        .unwrap_or_default();

    GroundedResult {
        overview,
        references,
    }
}
