//! Full-page assembly. The print action opens this page with the print dialog.

use crate::app::AppState;
use crate::markdown::escape_html;
use crate::search::Strategy;

use super::Panel;

const STYLESHEET: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 0 auto; padding: 1.5rem; color: #1f2328; }
[hidden] { display: none !important; }
.search-bar { display: flex; gap: .5rem; }
.search-bar input { flex: 1; padding: .5rem; }
.strategy-toggle span { cursor: pointer; padding: 0 .25rem; }
.strategy-toggle span.active { font-weight: 600; text-decoration: underline; }
#errorDisplay { color: #b42318; margin: 1rem 0; }
.tag { font-size: .8em; color: #57606a; }
.paper-tag { color: #0550ae; }
.news-tag { color: #953800; }
.blog-tag { color: #116329; }
.other-tag { color: #57606a; }
.reference-description { margin: .25rem 0 .75rem; color: #57606a; }
.actions { display: flex; gap: .5rem; margin-top: 1.5rem; }
@media print {
  header, .actions, #loadingIndicator, #errorDisplay { display: none !important; }
  body { max-width: none; padding: 0; }
  a { color: inherit; text-decoration: none; }
  a[href]::after { content: " (" attr(href) ")"; font-size: .8em; }
  section { break-inside: avoid-page; }
}
"#;

/// Renders the page for the current state. With `auto_print` the document
/// opens the browser print dialog once loaded.
pub fn render_page(app: &AppState, auto_print: bool) -> String {
    let display = app.display();
    let query = app.result().map(|r| r.query.as_str()).unwrap_or_default();
    let title = if query.is_empty() {
        "gleaner".to_string()
    } else {
        format!("{} - gleaner", escape_html(query))
    };

    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{title}</title>\n<style>{STYLESHEET}</style>\n</head>\n<body>\n"));

    out.push_str(&search_form(query, app.search_enabled(), app.strategy));

    out.push_str(&format!(
        "<div id=\"loadingIndicator\"{}>Searching...</div>\n",
        hidden(!display.loading)
    ));
    let error = display.error.as_deref().unwrap_or_default();
    out.push_str(&format!(
        "<div id=\"errorDisplay\" role=\"alert\"{}>{}</div>\n",
        hidden(error.is_empty()),
        escape_html(error)
    ));

    out.push_str(&format!(
        "<main id=\"resultsContainer\"{}>\n",
        hidden(!display.results_visible)
    ));
    out.push_str(&section("overviewContent", "Overview", "div", &display.overview));
    out.push_str(&section("referencesList", "References", "ul", &display.references));
    out.push_str(&section("suggestionContent", "Suggestion", "div", &display.suggestion));
    out.push_str(&section("libraryList", "Library", "ul", &display.library));
    out.push_str("</main>\n");

    let actions = display.actions;
    out.push_str(&format!(
        "<div class=\"actions\" id=\"actionsContainer\"{}>\n",
        hidden(!actions.visible)
    ));
    out.push_str(&button("copyButton", "Copy", actions.copy));
    out.push_str(&button("downloadMdButton", "Download Markdown", actions.download_markdown));
    out.push_str(&button("downloadPdfButton", "Print / PDF", actions.print));
    out.push_str("</div>\n");

    if auto_print {
        out.push_str("<script>window.addEventListener('load', () => window.print());</script>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}

fn search_form(query: &str, enabled: bool, strategy: Strategy) -> String {
    let disabled = if enabled { "" } else { " disabled" };
    let keyword = strategy == Strategy::Keyword;
    format!(
        "<header>\n<form class=\"search-bar\" method=\"get\">\n\
         <input id=\"searchInput\" name=\"q\" type=\"search\" value=\"{query}\" aria-label=\"Search query\"{disabled}>\n\
         <button id=\"searchButton\" type=\"submit\"{disabled}>Search</button>\n\
         </form>\n\
         <div class=\"strategy-toggle\">\n\
         {semantic}\n\
         <input id=\"searchTypeToggle\" type=\"checkbox\" role=\"switch\"{checked} aria-describedby=\"searchTypeHelp\">\n\
         {keyword_label}\n\
         <p id=\"searchTypeHelp\">{help}</p>\n\
         </div>\n</header>\n",
        query = escape_html(query),
        semantic = mode_label("semanticLabel", Strategy::Semantic, !keyword),
        checked = if keyword { " checked" } else { "" },
        keyword_label = mode_label("keywordLabel", Strategy::Keyword, keyword),
        help = escape_html(&strategy.help_text()),
    )
}

fn mode_label(id: &str, strategy: Strategy, active: bool) -> String {
    format!(
        "<span id=\"{id}\" role=\"button\" tabindex=\"0\"{class} aria-pressed=\"{active}\">{}</span>",
        strategy.label(),
        class = if active { " class=\"active\"" } else { "" },
    )
}

fn section(id: &str, heading: &str, tag: &str, panel: &Panel) -> String {
    format!(
        "<section{}>\n<h2>{heading}</h2>\n<{tag} id=\"{id}\">{}</{tag}>\n</section>\n",
        hidden(!panel.visible),
        panel.html
    )
}

fn button(id: &str, label: &str, enabled: bool) -> String {
    format!(
        "<button id=\"{id}\" type=\"button\"{}>{label}</button>\n",
        if enabled { "" } else { " disabled" }
    )
}

fn hidden(is_hidden: bool) -> &'static str {
    if is_hidden { " hidden" } else { "" }
}
