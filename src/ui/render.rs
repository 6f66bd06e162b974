//! Panel fragment renderers. Each returns the inner HTML of one named container.

use crate::gemini::types::RawReference;
use crate::markdown::{escape_html, is_safe_href, render_markdown};
use crate::search::enrichment::{EnrichedReference, LibraryItem};

pub const NO_OVERVIEW_HTML: &str = "<p>No overview available.</p>";
pub const NO_REFERENCES: &str = "No references found for this query.";
pub const NO_DETAILED_REFERENCES: &str = "No detailed references available for this query.";

pub fn overview_html(overview: &str) -> String {
    if overview.trim().is_empty() {
        NO_OVERVIEW_HTML.to_string()
    } else {
        render_markdown(overview)
    }
}

/// `None` when there is no suggestion to show.
pub fn suggestion_html(suggestion: Option<&str>) -> Option<String> {
    suggestion
        .filter(|s| !s.trim().is_empty())
        .map(render_markdown)
        .filter(|html| !html.trim().is_empty())
}

pub fn raw_references(references: &[RawReference]) -> String {
    if references.is_empty() {
        return placeholder(NO_REFERENCES);
    }
    references
        .iter()
        .map(|r| format!("<li>{}</li>\n", link(&r.uri, &r.title)))
        .collect()
}

pub fn enriched_references(references: &[EnrichedReference]) -> String {
    if references.is_empty() {
        return placeholder(NO_DETAILED_REFERENCES);
    }
    let mut out = String::new();
    for r in references {
        out.push_str("<li>");
        out.push_str(&link(&r.original_url, &r.original_title));
        if r.is_paper {
            out.push_str(r#"<span class="tag paper-tag"> [Paper]</span>"#);
        }
        push_description(&mut out, &r.description);
        out.push_str("</li>\n");
    }
    out
}

/// Empty string when there are no items; the caller hides the panel.
pub fn library_items(items: &[LibraryItem]) -> String {
    let mut out = String::new();
    for item in items {
        let kind = item.kind.as_str();
        out.push_str("<li>");
        out.push_str(&link(&item.original_url, &item.original_title));
        out.push_str(&format!(
            r#"<span class="tag library-item-type {}-tag"> [{kind}]</span>"#,
            kind.to_ascii_lowercase()
        ));
        push_description(&mut out, &item.description);
        out.push_str("</li>\n");
    }
    out
}

fn link(url: &str, title: &str) -> String {
    let text = if title.is_empty() { url } else { title };
    if is_safe_href(url) {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            escape_html(url),
            escape_html(text)
        )
    } else {
        format!(r#"<span class="unlinked">{}</span>"#, escape_html(text))
    }
}

fn push_description(out: &mut String, description: &str) {
    if !description.is_empty() {
        out.push_str(&format!(
            r#"<p class="reference-description">{}</p>"#,
            escape_html(description)
        ));
    }
}

fn placeholder(message: &str) -> String {
    format!("<li>{message}</li>\n")
}
