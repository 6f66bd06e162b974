//! Application state and the search handler.
//!
//! `AppState` is the single writer of the displayed result: the search handler
//! clears and refills it, and the export actions read it.

use tracing::{error, info, warn};

use crate::gemini::client::{GeminiError, GenerativeClient};
use crate::gemini::types::RawReference;
use crate::search::Strategy;
use crate::search::enrichment::{
    EnrichedReference, EnrichmentData, LibraryItem, build_prompt, parse_enrichment,
};
use crate::ui::{Display, render};

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a search query.";
pub const NOT_CONFIGURED_MESSAGE: &str = "API Key is not configured. Cannot perform search.";
pub const CONFIG_ERROR_MESSAGE: &str =
    "Configuration error: GEMINI_API_KEY is missing. Please ensure it is set in your environment.";
pub const ENRICHMENT_FALLBACK_MESSAGE: &str =
    "Could not process additional details. Displaying basic references.";
const FETCH_FAILED_MESSAGE: &str = "Failed to fetch or process data. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("search is not configured: GEMINI_API_KEY is missing")]
    NotConfigured,

    #[error("a search is already in progress")]
    InProgress,

    #[error("{0}")]
    Gemini(#[from] GeminiError),
}

/// The currently displayed result. Replaced wholesale by each search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub query: String,
    pub overview_html: Option<String>,
    pub references: Vec<EnrichedReference>,
    pub suggestion_html: Option<String>,
    pub library: Vec<LibraryItem>,
}

/// How the enrichment stage ended for a completed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enrichment {
    /// No references were returned, so no enrichment call was made.
    Skipped,
    Applied,
    /// The response could not be parsed; raw references are shown.
    Fallback,
}

#[derive(Debug)]
pub struct AppState {
    pub strategy: Strategy,
    display: Display,
    result: Option<SearchResult>,
    search_enabled: bool,
    in_flight: bool,
}

impl AppState {
    /// `configured` is false when no API key is available; search is then disabled.
    pub fn new(configured: bool, strategy: Strategy) -> Self {
        let mut display = Display::default();
        if !configured {
            error!("GEMINI_API_KEY environment variable not set");
            display.show_error(CONFIG_ERROR_MESSAGE);
        }
        Self {
            strategy,
            display,
            result: None,
            search_enabled: configured,
            in_flight: false,
        }
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn result(&self) -> Option<&SearchResult> {
        self.result.as_ref()
    }

    pub fn search_enabled(&self) -> bool {
        self.search_enabled && !self.in_flight
    }

    /// Empties every panel, drops the stored result and disables exports.
    pub fn clear_previous_results(&mut self) {
        self.display.clear_results();
        self.result = None;
    }

    /// Runs one search: grounded query, then enrichment when references came back.
    /// `client` is `None` when no API key is configured.
    pub async fn handle_search(
        &mut self,
        client: Option<&impl GenerativeClient>,
        query: &str,
    ) -> Result<Enrichment, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            self.display.show_error(EMPTY_QUERY_MESSAGE);
            self.display.hide_results();
            return Err(SearchError::EmptyQuery);
        }
        let Some(client) = client.filter(|_| self.search_enabled) else {
            self.display.show_error(NOT_CONFIGURED_MESSAGE);
            self.display.hide_results();
            return Err(SearchError::NotConfigured);
        };
        if self.in_flight {
            warn!(query, "search rejected: another search is in progress");
            return Err(SearchError::InProgress);
        }

        self.in_flight = true;
        self.display.show_loading();
        self.clear_previous_results();

        let outcome = self.run_stages(client, query).await;

        self.display.hide_loading();
        self.in_flight = false;
        outcome
    }

    async fn run_stages(
        &mut self,
        client: &impl GenerativeClient,
        query: &str,
    ) -> Result<Enrichment, SearchError> {
        let strategy = self.strategy;
        info!(query, strategy = strategy.label(), "search started");

        let grounded = match client.search(query).await {
            Ok(grounded) => grounded,
            Err(e) => {
                error!(error = %e, "query stage failed");
                self.display
                    .show_error(format!("{FETCH_FAILED_MESSAGE} Details: {e}"));
                return Err(e.into());
            }
        };

        let overview_html = render::overview_html(&grounded.overview);
        self.display.set_overview(overview_html.clone());
        let mut result = SearchResult {
            query: query.to_string(),
            overview_html: Some(overview_html),
            ..SearchResult::default()
        };
        let references = grounded.references;

        if references.is_empty() {
            self.display.set_references(render::raw_references(&[]));
            self.result = Some(result);
            self.display.show_results(true);
            info!("search complete without references");
            return Ok(Enrichment::Skipped);
        }

        let prompt = build_prompt(query, &references, strategy);
        let response = match client.generate_json(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "enrichment stage failed");
                self.display
                    .show_error(format!("{FETCH_FAILED_MESSAGE} Details: {e}"));
                self.show_raw_references(&references, &mut result);
                self.result = Some(result);
                self.display.show_results(false);
                return Err(e.into());
            }
        };

        let enrichment = match parse_enrichment(&response) {
            Ok(data) => {
                self.apply_enrichment(data, &mut result);
                Enrichment::Applied
            }
            Err(e) => {
                error!(error = %e, raw = %e.text, "failed to parse enrichment response");
                self.display.append_error(ENRICHMENT_FALLBACK_MESSAGE);
                self.show_raw_references(&references, &mut result);
                Enrichment::Fallback
            }
        };

        self.result = Some(result);
        self.display.show_results(true);
        info!(
            references = references.len(),
            enrichment = ?enrichment,
            "search complete"
        );
        Ok(enrichment)
    }

    fn apply_enrichment(&mut self, data: EnrichmentData, result: &mut SearchResult) {
        let suggestion_html = render::suggestion_html(data.suggestion.as_deref());

        self.display
            .set_references(render::enriched_references(&data.enriched_references));
        self.display.set_suggestion(suggestion_html.clone());
        self.display
            .set_library(render::library_items(&data.library_items));

        result.references = data.enriched_references;
        result.suggestion_html = suggestion_html;
        result.library = data.library_items;
    }

    fn show_raw_references(&mut self, references: &[RawReference], result: &mut SearchResult) {
        self.display
            .set_references(render::raw_references(references));
        result.references = references.iter().map(EnrichedReference::unenriched).collect();
    }

    /// Snapshot for an export action, if that action is currently enabled.
    pub(crate) fn exportable(&self, enabled: bool) -> Option<&SearchResult> {
        if !enabled || self.in_flight {
            return None;
        }
        self.result.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gemini::types::GroundedResult;
    use crate::ui::render::{NO_OVERVIEW_HTML, NO_REFERENCES};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted client recording every call it receives.
    pub(crate) struct MockClient {
        searches: Mutex<VecDeque<Result<GroundedResult, GeminiError>>>,
        enrichments: Mutex<VecDeque<Result<String, GeminiError>>>,
        pub(crate) search_calls: Mutex<Vec<String>>,
        pub(crate) enrichment_calls: Mutex<Vec<String>>,
    }

    impl MockClient {
        pub(crate) fn new(
            search: Result<GroundedResult, GeminiError>,
            enrichment: Option<Result<String, GeminiError>>,
        ) -> Self {
            Self {
                searches: Mutex::new(VecDeque::from([search])),
                enrichments: Mutex::new(enrichment.into_iter().collect()),
                search_calls: Mutex::new(Vec::new()),
                enrichment_calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> (usize, usize) {
            (
                self.search_calls.lock().unwrap().len(),
                self.enrichment_calls.lock().unwrap().len(),
            )
        }
    }

    impl GenerativeClient for MockClient {
        async fn search(&self, query: &str) -> Result<GroundedResult, GeminiError> {
            self.search_calls.lock().unwrap().push(query.to_string());
            self.searches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GeminiError::RateLimited))
        }

        async fn generate_json(&self, prompt: &str) -> Result<String, GeminiError> {
            self.enrichment_calls.lock().unwrap().push(prompt.to_string());
            self.enrichments
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(GeminiError::RateLimited))
        }
    }

    pub(crate) fn scenario_grounded() -> GroundedResult {
        GroundedResult {
            overview: "Transformers are...".into(),
            references: vec![
                RawReference::new("https://a.com", Some("Paper A")),
                RawReference::new("https://b.com", None),
            ],
        }
    }

    pub(crate) const SCENARIO_ENRICHMENT: &str = r#"```json
{
  "enriched_references": [
    {"original_url": "https://a.com", "original_title": "Paper A", "description": "Introduces the architecture.", "is_paper": true},
    {"original_url": "https://b.com", "original_title": "https://b.com", "description": "A tutorial.", "is_paper": false}
  ],
  "suggestion": "Explore attention mechanisms",
  "library_items": [
    {"original_url": "https://a.com", "original_title": "Paper A", "description": "The original paper.", "type": "Paper"}
  ]
}
```"#;

    #[tokio::test]
    async fn full_scenario_renders_every_panel() {
        let client = MockClient::new(
            Ok(scenario_grounded()),
            Some(Ok(SCENARIO_ENRICHMENT.into())),
        );
        let mut app = AppState::new(true, Strategy::Semantic);

        let outcome = app
            .handle_search(Some(&client), "transformer architecture")
            .await
            .unwrap();

        assert_eq!(outcome, Enrichment::Applied);
        assert_eq!(client.calls(), (1, 1));

        let d = app.display();
        assert!(d.error.is_none());
        assert!(!d.loading);
        assert!(d.overview.visible);
        assert!(d.overview.html.contains("<p>Transformers are...</p>"));
        assert_eq!(d.references.html.matches("<li>").count(), 2);
        assert!(d.references.html.contains(">Paper A</a>"));
        assert!(d.references.html.contains(">https://b.com</a>"));
        assert!(d.suggestion.visible);
        assert!(d.suggestion.html.contains("Explore attention mechanisms"));
        assert!(d.library.visible);
        assert_eq!(d.library.html.matches("<li>").count(), 1);
        assert!(d.library.html.contains("[Paper]"));
        assert!(d.actions.copy && d.actions.download_markdown && d.actions.print);

        let result = app.result().unwrap();
        assert_eq!(result.query, "transformer architecture");
        assert_eq!(result.references.len(), 2);
        assert_eq!(result.library.len(), 1);
    }

    #[tokio::test]
    async fn strategy_reaches_enrichment_prompt() {
        let client = MockClient::new(
            Ok(scenario_grounded()),
            Some(Ok(SCENARIO_ENRICHMENT.into())),
        );
        let mut app = AppState::new(true, Strategy::Keyword);
        app.handle_search(Some(&client), "  transformer architecture ")
            .await
            .unwrap();

        assert_eq!(
            client.search_calls.lock().unwrap()[0],
            "transformer architecture"
        );
        let prompts = client.enrichment_calls.lock().unwrap();
        assert!(prompts[0].contains("Keyword Search Strategy"));
        assert!(prompts[0].contains("https://b.com"));
    }

    #[tokio::test]
    async fn no_references_skips_enrichment() {
        let client = MockClient::new(
            Ok(GroundedResult {
                overview: "Transformers are...".into(),
                references: vec![],
            }),
            None,
        );
        let mut app = AppState::new(true, Strategy::Semantic);

        let outcome = app
            .handle_search(Some(&client), "transformer architecture")
            .await
            .unwrap();

        assert_eq!(outcome, Enrichment::Skipped);
        assert_eq!(client.calls(), (1, 0));
        let d = app.display();
        assert_eq!(d.references.html, format!("<li>{NO_REFERENCES}</li>\n"));
        assert!(!d.suggestion.visible);
        assert!(!d.library.visible);
        assert!(d.actions.copy);
    }

    #[tokio::test]
    async fn empty_query_makes_no_calls() {
        for query in ["", "   ", "\n\t"] {
            let client = MockClient::new(Ok(scenario_grounded()), None);
            let mut app = AppState::new(true, Strategy::Semantic);

            let err = app.handle_search(Some(&client), query).await.unwrap_err();

            assert!(matches!(err, SearchError::EmptyQuery));
            assert_eq!(client.calls(), (0, 0));
            assert_eq!(app.display().error.as_deref(), Some(EMPTY_QUERY_MESSAGE));
            assert!(!app.display().results_visible);
            assert!(!app.display().actions.any_enabled());
        }
    }

    #[tokio::test]
    async fn unconfigured_app_refuses_to_search() {
        let client = MockClient::new(Ok(scenario_grounded()), None);
        let mut app = AppState::new(false, Strategy::Semantic);
        assert_eq!(app.display().error.as_deref(), Some(CONFIG_ERROR_MESSAGE));
        assert!(!app.search_enabled());

        let err = app.handle_search(Some(&client), "rust").await.unwrap_err();

        assert!(matches!(err, SearchError::NotConfigured));
        let err = app
            .handle_search(None::<&MockClient>, "rust")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured));
        assert_eq!(client.calls(), (0, 0));
        assert_eq!(app.display().error.as_deref(), Some(NOT_CONFIGURED_MESSAGE));
    }

    #[tokio::test]
    async fn in_flight_search_rejects_second_submission() {
        let client = MockClient::new(Ok(scenario_grounded()), None);
        let mut app = AppState::new(true, Strategy::Semantic);
        app.in_flight = true;

        let err = app.handle_search(Some(&client), "rust").await.unwrap_err();

        assert!(matches!(err, SearchError::InProgress));
        assert_eq!(client.calls(), (0, 0));
        assert!(app.in_flight);
    }

    #[tokio::test]
    async fn invalid_enrichment_json_falls_back_to_raw_references() {
        let client = MockClient::new(
            Ok(scenario_grounded()),
            Some(Ok("{\"enriched_references\": [oops".into())),
        );
        let mut app = AppState::new(true, Strategy::Semantic);

        let outcome = app.handle_search(Some(&client), "transformers").await.unwrap();

        assert_eq!(outcome, Enrichment::Fallback);
        let d = app.display();
        assert_eq!(d.error.as_deref(), Some(ENRICHMENT_FALLBACK_MESSAGE));
        assert!(d.overview.html.contains("Transformers are..."));
        assert!(d.references.html.contains(">Paper A</a>"));
        assert!(d.references.html.contains(">https://b.com</a>"));
        assert!(!d.references.html.contains("reference-description"));
        assert!(!d.references.html.contains("[Paper]"));
        assert!(!d.suggestion.visible);
        assert!(!d.library.visible);
        assert!(d.actions.copy);

        let refs = &app.result().unwrap().references;
        assert_eq!(refs.len(), 2);
        assert!(refs.iter().all(|r| r.description == "N/A" && !r.is_paper));
        assert_eq!(refs[1].original_title, "https://b.com");
    }

    #[tokio::test]
    async fn query_stage_failure_shows_nothing() {
        let client = MockClient::new(
            Err(GeminiError::Api {
                code: 500,
                message: "backend down".into(),
            }),
            None,
        );
        let mut app = AppState::new(true, Strategy::Semantic);

        let err = app.handle_search(Some(&client), "rust").await.unwrap_err();

        assert!(matches!(err, SearchError::Gemini(_)));
        assert_eq!(client.calls(), (1, 0));
        let d = app.display();
        let message = d.error.as_deref().unwrap();
        assert!(message.starts_with("Failed to fetch or process data."));
        assert!(message.contains("backend down"));
        assert!(!d.results_visible);
        assert!(!d.actions.any_enabled());
        assert!(app.result().is_none());
        assert!(!app.in_flight);
    }

    #[tokio::test]
    async fn enrichment_transport_failure_keeps_overview_and_raw_references() {
        let client = MockClient::new(Ok(scenario_grounded()), Some(Err(GeminiError::RateLimited)));
        let mut app = AppState::new(true, Strategy::Semantic);

        let err = app.handle_search(Some(&client), "rust").await.unwrap_err();

        assert!(matches!(err, SearchError::Gemini(GeminiError::RateLimited)));
        let d = app.display();
        assert!(d.error.as_deref().unwrap().contains("rate limit"));
        assert!(d.results_visible);
        assert!(d.overview.html.contains("Transformers are..."));
        assert_eq!(d.references.html.matches("<li>").count(), 2);
        assert!(!d.suggestion.visible);
        assert!(d.actions.copy);
        assert_eq!(app.result().unwrap().references.len(), 2);
    }

    #[tokio::test]
    async fn empty_overview_uses_placeholder() {
        let client = MockClient::new(Ok(GroundedResult::default()), None);
        let mut app = AppState::new(true, Strategy::Semantic);
        app.handle_search(Some(&client), "rust").await.unwrap();
        assert_eq!(app.display().overview.html, NO_OVERVIEW_HTML);
    }

    #[tokio::test]
    async fn new_search_replaces_previous_result() {
        let mut app = AppState::new(true, Strategy::Semantic);
        let first = MockClient::new(
            Ok(scenario_grounded()),
            Some(Ok(SCENARIO_ENRICHMENT.into())),
        );
        app.handle_search(Some(&first), "first").await.unwrap();

        let second = MockClient::new(Err(GeminiError::RateLimited), None);
        app.handle_search(Some(&second), "second").await.unwrap_err();

        assert!(app.result().is_none());
        assert!(app.display().references.html.is_empty());
        assert!(!app.display().library.visible);
    }

    #[tokio::test]
    async fn clearing_twice_equals_clearing_once() {
        let client = MockClient::new(
            Ok(scenario_grounded()),
            Some(Ok(SCENARIO_ENRICHMENT.into())),
        );
        let mut app = AppState::new(true, Strategy::Semantic);
        app.handle_search(Some(&client), "rust").await.unwrap();

        app.clear_previous_results();
        let once = app.display().clone();
        app.clear_previous_results();

        assert_eq!(app.display(), &once);
        assert!(app.result().is_none());
        for panel in [&once.overview, &once.references, &once.suggestion, &once.library] {
            assert!(panel.html.is_empty());
            assert!(!panel.visible);
        }
        assert!(!once.actions.any_enabled());
    }
}
