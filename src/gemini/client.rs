use std::env;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::grounding::extract_grounded_result;
use super::types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleSearch, GroundedResult, Part, Tool,
};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The only model the enrichment prompt is tuned for.
pub const ALLOWED_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY not set. Get one at https://aistudio.google.com/apikey")]
    ApiKeyNotSet,

    #[error("API rate limit exceeded. Please retry later.")]
    RateLimited,

    #[error("API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// The two call shapes the search pipeline needs from a generative model.
/// Implemented by `GeminiClient` for production; mock implementations used in tests.
pub trait GenerativeClient {
    /// Free-text answer grounded with Google Search.
    async fn search(&self, query: &str) -> Result<GroundedResult, GeminiError>;

    /// Raw response text of a generation constrained to JSON output.
    async fn generate_json(&self, prompt: &str) -> Result<String, GeminiError>;
}

#[derive(Clone)]
struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn from_env(http: Client) -> Result<Self, GeminiError> {
        let api_key = env::var("GEMINI_API_KEY").map_err(|_| GeminiError::ApiKeyNotSet)?;
        if api_key.trim().is_empty() {
            return Err(GeminiError::ApiKeyNotSet);
        }
        let requested = env::var("GEMINI_MODEL").ok();
        Ok(Self {
            http,
            api_key: ApiKey(api_key.trim().to_string()),
            model: resolve_model(requested.as_deref()).to_string(),
            base_url: API_BASE.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey("test-key".to_string()),
            model: ALLOWED_MODEL.to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        debug_assert!(
            url.starts_with("https://") || cfg!(test),
            "API key must only be sent over HTTPS"
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key.0)
            .header("User-Agent", crate::USER_AGENT)
            .json(request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini API rate limited");
            return Err(GeminiError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<GenerateContentResponse>(&text)
                && let Some(err) = &body.error
            {
                let classified = classify_api_error(err);
                warn!(error = %classified, "Gemini API error");
                return Err(classified);
            }
            let end = text.floor_char_boundary(200);
            warn!(status = %status, "Gemini API error (no structured body)");
            return Err(GeminiError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {}", &text[..end]),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        debug!(model = %self.model, "gemini generation complete");

        if let Some(err) = &body.error {
            let classified = classify_api_error(err);
            warn!(error = %classified, "Gemini API error in 200 response");
            return Err(classified);
        }

        Ok(body)
    }
}

impl GenerativeClient for GeminiClient {
    async fn search(&self, query: &str) -> Result<GroundedResult, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![user_content(query)],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            generation_config: None,
        };
        let response = self.generate(&request).await?;
        Ok(extract_grounded_result(&response))
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![user_content(prompt)],
            tools: vec![],
            generation_config: Some(GenerationConfig {
                response_mime_type: JSON_MIME_TYPE.to_string(),
            }),
        };
        let response = self.generate(&request).await?;
        Ok(response.text())
    }
}

fn user_content(text: &str) -> Content {
    Content {
        parts: vec![Part {
            text: text.to_string(),
        }],
        role: Some("user".to_string()),
    }
}

/// Accepts a model override only when it names the allow-listed model.
pub fn resolve_model(requested: Option<&str>) -> &'static str {
    match requested.map(str::trim).filter(|m| !m.is_empty()) {
        None => ALLOWED_MODEL,
        Some(m) if m == ALLOWED_MODEL => ALLOWED_MODEL,
        Some(m) => {
            warn!(
                requested = m,
                default = ALLOWED_MODEL,
                "GEMINI_MODEL is not an allowed text model, using default"
            );
            ALLOWED_MODEL
        }
    }
}

fn classify_api_error(err: &ApiError) -> GeminiError {
    let message = err
        .message
        .clone()
        .unwrap_or_else(|| "Unknown error".to_string());

    match err.code {
        Some(429) => GeminiError::RateLimited,
        Some(403) => GeminiError::QuotaExhausted(message),
        Some(code) => GeminiError::Api { code, message },
        None => GeminiError::Api {
            code: 0,
            message: format!("Unknown error (no status code): {message}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_429_as_rate_limited() {
        let err = ApiError {
            code: Some(429),
            message: Some("Resource exhausted".into()),
        };
        assert!(matches!(classify_api_error(&err), GeminiError::RateLimited));
    }

    #[test]
    fn classify_403_as_quota_exhausted() {
        let err = ApiError {
            code: Some(403),
            message: Some("Quota exceeded".into()),
        };
        assert!(matches!(
            classify_api_error(&err),
            GeminiError::QuotaExhausted(_)
        ));
    }

    #[test]
    fn classify_missing_code() {
        let err = ApiError {
            code: None,
            message: Some("odd".into()),
        };
        match classify_api_error(&err) {
            GeminiError::Api { code, message } => {
                assert_eq!(code, 0);
                assert!(message.contains("odd"));
            }
            other => panic!("expected Api error, got: {other:?}"),
        }
    }

    #[test]
    fn resolve_model_accepts_only_allow_listed() {
        assert_eq!(resolve_model(None), ALLOWED_MODEL);
        assert_eq!(resolve_model(Some("")), ALLOWED_MODEL);
        assert_eq!(resolve_model(Some(" gemini-2.5-flash ")), ALLOWED_MODEL);
        assert_eq!(resolve_model(Some("gemini-1.0-pro")), ALLOWED_MODEL);
    }

    #[test]
    fn api_key_is_redacted_in_debug() {
        let client = GeminiClient::with_base_url(Client::new(), "http://localhost");
        let debug = format!("{client:?}");
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
