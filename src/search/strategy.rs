use clap::ValueEnum;

const HELP_PREFIX: &str = "Toggle to switch between semantic search (focus on meaning and context) and keyword search (focus on exact terms).";

/// How the enrichment prompt frames relevance.
#[derive(Debug, ValueEnum, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Semantic,
    Keyword,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Semantic => "Semantic",
            Strategy::Keyword => "Keyword",
        }
    }

    /// Accessible help text naming the active mode.
    pub fn help_text(self) -> String {
        format!("{HELP_PREFIX} Current mode is {}.", self.label())
    }

    /// Strategy-specific guidance embedded in the enrichment prompt.
    pub fn instructions(self, query: &str) -> String {
        match self {
            Strategy::Keyword => format!(
                "Apply a **Keyword Search Strategy** to these results:\n\
                 - 'enriched_references' descriptions: say how directly the content matches the terms in \"{query}\", pointing out those term matches.\n\
                 - 'library_items' selection and descriptions: favour items that literally contain the terms from \"{query}\"; describe where those terms occur. Pick direct hits only.\n\
                 - 'suggestion': propose a follow-up that tries variations of the exact terms or closely related exact phrases."
            ),
            Strategy::Semantic => format!(
                "Apply a **Semantic Search Strategy** to these results:\n\
                 - 'enriched_references' descriptions: explain the conceptual relevance of the content to \"{query}\", even where the wording differs.\n\
                 - 'library_items' selection and descriptions: favour items by thematic and conceptual fit with \"{query}\"; describe that broader relevance.\n\
                 - 'suggestion': propose a follow-up that explores related concepts or a deeper aspect of \"{query}\"."
            ),
        }
    }
}
