//! Plain-text, Markdown and print-page exports of the displayed result.

use clap::ValueEnum;
use tracing::{debug, warn};

use crate::app::{AppState, SearchResult};
use crate::markdown::{escape_md_link, html_to_markdown, html_to_text, sanitize_heading};
use crate::ui::page;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("{0} export is unavailable until a search completes")]
    Disabled(ExportFormat),
}

/// The three export actions: copy (text), download (Markdown), print (HTML page).
#[derive(Debug, ValueEnum, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Text,
    Markdown,
    Html,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }

}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ExportFormat::Text => "text",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Html => "print",
        })
    }
}

#[derive(Debug)]
pub struct Export {
    pub file_name: String,
    pub content: String,
}

/// Runs an export action against the current state.
pub fn export(app: &AppState, format: ExportFormat) -> Result<Export, ExportError> {
    let controls = app.display().actions;
    let enabled = match format {
        ExportFormat::Text => controls.copy,
        ExportFormat::Markdown => controls.download_markdown,
        ExportFormat::Html => controls.print,
    };
    let Some(result) = app.exportable(enabled) else {
        warn!(%format, "export requested while disabled");
        return Err(ExportError::Disabled(format));
    };

    let file_name = file_name(&result.query, format.extension());
    let content = match format {
        ExportFormat::Text => plain_text(result),
        ExportFormat::Markdown => markdown(result),
        ExportFormat::Html => page::render_page(app, true),
    };

    debug!(%format, bytes = content.len(), file = %file_name, "export ready");
    Ok(Export { file_name, content })
}

pub fn plain_text(result: &SearchResult) -> String {
    let mut out = format!("Search Query: {}\n\n", or_na(&result.query));

    if let Some(html) = &result.overview_html {
        out.push_str("## Overview\n");
        out.push_str(html_to_text(html).trim());
        out.push_str("\n\n");
    }

    if !result.references.is_empty() {
        out.push_str("## References\n");
        for r in &result.references {
            out.push_str(&format!("- {} ({})\n", or_na(&r.original_title), r.original_url));
            if !r.description.is_empty() {
                out.push_str(&format!("  {}\n", r.description));
            }
            if r.is_paper {
                out.push_str("  [Paper]\n");
            }
        }
        out.push('\n');
    }

    if let Some(html) = &result.suggestion_html {
        out.push_str("## Suggestion\n");
        out.push_str(html_to_text(html).trim());
        out.push_str("\n\n");
    }

    if !result.library.is_empty() {
        out.push_str("## Library Items\n");
        for item in &result.library {
            out.push_str(&format!(
                "- [{}] {} ({})\n",
                item.kind,
                or_na(&item.original_title),
                item.original_url
            ));
            if !item.description.is_empty() {
                out.push_str(&format!("  {}\n", item.description));
            }
        }
    }

    out.trim().to_string()
}

pub fn markdown(result: &SearchResult) -> String {
    let mut out = format!(
        "# Search Results for: {}\n\n",
        sanitize_heading(or_na(&result.query))
    );

    if let Some(html) = &result.overview_html {
        out.push_str(&format!("## Overview\n\n{}\n\n", html_to_markdown(html)));
    }

    if !result.references.is_empty() {
        out.push_str("## References\n\n");
        for r in &result.references {
            out.push_str(&format!(
                "*   **[{}]({})**\n",
                md_title(&r.original_title),
                r.original_url
            ));
            push_md_description(&mut out, &r.description);
            if r.is_paper {
                out.push_str("    *Type: Paper*\n");
            }
        }
        out.push('\n');
    }

    if let Some(html) = &result.suggestion_html {
        out.push_str(&format!("## Suggestion\n\n{}\n\n", html_to_markdown(html)));
    }

    if !result.library.is_empty() {
        out.push_str("## Library Items\n\n");
        for item in &result.library {
            out.push_str(&format!(
                "*   **[{}] [{}]({})**\n",
                item.kind,
                md_title(&item.original_title),
                item.original_url
            ));
            push_md_description(&mut out, &item.description);
        }
        out.push('\n');
    }

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push('\n');
    out
}

/// `search_results_<query>.<ext>` with every non-alphanumeric character replaced.
pub fn file_name(query: &str, extension: &str) -> String {
    let stem: String = if query.is_empty() {
        "export".to_string()
    } else {
        query
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!("search_results_{stem}.{extension}")
}

fn push_md_description(out: &mut String, description: &str) {
    if !description.is_empty() {
        out.push_str(&format!("    *{}*\n", description.replace('\n', "\n    ")));
    }
}

fn md_title(title: &str) -> String {
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        escape_md_link(title)
    }
}

fn or_na(s: &str) -> &str {
    if s.is_empty() { "N/A" } else { s }
}
