//! Display state: the named page containers, their visibility, and the export controls.

pub(crate) mod page;
pub(crate) mod render;

use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Panel {
    pub html: String,
    pub visible: bool,
}

impl Panel {
    fn clear(&mut self) {
        self.html.clear();
        self.visible = false;
    }
}

/// Enabled state of the copy, Markdown download and print actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportControls {
    pub visible: bool,
    pub copy: bool,
    pub download_markdown: bool,
    pub print: bool,
}

impl ExportControls {
    fn set_enabled(&mut self, enabled: bool) {
        self.copy = enabled;
        self.download_markdown = enabled;
        self.print = enabled;
    }

    pub fn any_enabled(&self) -> bool {
        self.copy || self.download_markdown || self.print
    }
}

/// Everything the page shows. Only `AppState` mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Display {
    pub error: Option<String>,
    pub loading: bool,
    pub results_visible: bool,
    pub overview: Panel,
    pub references: Panel,
    pub suggestion: Panel,
    pub library: Panel,
    pub actions: ExportControls,
}

impl Display {
    pub(crate) fn show_loading(&mut self) {
        self.loading = true;
        self.error = None;
        self.hide_results();
    }

    pub(crate) fn hide_loading(&mut self) {
        self.loading = false;
    }

    /// Replaces the error text and disables exports.
    pub(crate) fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(%message, "displaying error");
        self.error = Some(message);
        self.actions.set_enabled(false);
        self.actions.visible = false;
    }

    /// Appends to any error already shown.
    pub(crate) fn append_error(&mut self, message: &str) {
        let combined = match self.error.take() {
            Some(existing) if !existing.is_empty() => format!("{existing} {message}"),
            _ => message.to_string(),
        };
        self.show_error(combined);
    }

    pub(crate) fn clear_results(&mut self) {
        self.overview.clear();
        self.references.clear();
        self.suggestion.clear();
        self.library.clear();
        self.actions.visible = false;
        self.actions.set_enabled(false);
    }

    pub(crate) fn hide_results(&mut self) {
        self.results_visible = false;
        self.overview.visible = false;
        self.references.visible = false;
        self.suggestion.visible = false;
        self.library.visible = false;
        self.actions.visible = false;
        self.actions.set_enabled(false);
    }

    /// Shows the results container and enables exports. Suggestion and library
    /// keep the visibility their renderers gave them unless `show_all` is false.
    pub(crate) fn show_results(&mut self, show_all: bool) {
        self.results_visible = true;
        self.overview.visible = true;
        self.references.visible = true;
        self.actions.visible = true;
        self.actions.set_enabled(true);
        if !show_all {
            self.suggestion.visible = false;
            self.library.visible = false;
        }
    }

    pub(crate) fn set_overview(&mut self, html: String) {
        self.overview.html = html;
    }

    pub(crate) fn set_references(&mut self, html: String) {
        self.references.html = html;
    }

    pub(crate) fn set_suggestion(&mut self, html: Option<String>) {
        match html {
            Some(html) => {
                self.suggestion.html = html;
                self.suggestion.visible = true;
            }
            None => self.suggestion.clear(),
        }
    }

    pub(crate) fn set_library(&mut self, html: String) {
        self.library.visible = !html.is_empty();
        self.library.html = html;
    }
}
