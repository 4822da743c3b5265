//! Provider-agnostic types shared across the chat completions client.

use std::fmt;

use anyhow::{Context, Result};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard User-Agent header for tela API requests.
pub const USER_AGENT: &str = concat!("tela/", env!("CARGO_PKG_VERSION"));

/// Environment variable that overrides any configured base URL.
pub const BASE_URL_ENV_VAR: &str = "TELA_BASE_URL";

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves an API key with precedence: config > env.
///
/// # Arguments
/// * `config_api_key` - Value from config file (if present)
/// * `env_var` - Environment variable name (e.g., "`OPENAI_API_KEY`")
///
/// # Errors
/// Returns an error naming the variable when neither source has a key.
pub fn resolve_api_key(config_api_key: Option<&str>, env_var: &str) -> Result<String> {
    // Try config value first
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    // Fall back to env var
    std::env::var(env_var).context(format!(
        "No API key available. Set {env_var} or api_key in the config file."
    ))
}

/// Resolves a base URL with precedence: env > config > default.
///
/// Validated as http/https and stripped of trailing slashes. When no
/// default applies (Azure endpoints have none) and nothing is set,
/// this is an error.
pub fn resolve_base_url(config_base_url: Option<&str>, default_url: Option<&str>) -> Result<String> {
    // Try env var first
    if let Ok(env_url) = std::env::var(BASE_URL_ENV_VAR) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    // Try config value
    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    default_url
        .map(|url| url.trim_end_matches('/').to_string())
        .context("No base URL available. Set base_url in the config file.")
}

/// Validates that a URL is well-formed http/https.
fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => anyhow::bail!("Unsupported base URL scheme '{scheme}': {url}"),
    }
}

// ============================================================================
// Messages
// ============================================================================

/// A single conversation message as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Categories of provider errors for consistent error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Credentials rejected (HTTP 401/403)
    Auth,
    /// Rate limited (HTTP 429)
    RateLimit,
    /// Malformed request rejected by the API (other 4xx)
    InvalidRequest,
    /// Provider-side failure (5xx or mid-stream error event)
    Api,
    /// Connection, DNS or timeout failure before a response arrived
    Network,
    /// Failed to parse response (JSON parse error, invalid SSE, etc.)
    Parse,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Auth => write!(f, "auth"),
            ProviderErrorKind::RateLimit => write!(f, "rate_limit"),
            ProviderErrorKind::InvalidRequest => write!(f, "invalid_request"),
            ProviderErrorKind::Api => write!(f, "api"),
            ProviderErrorKind::Network => write!(f, "network"),
            ProviderErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the provider with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    /// Error category
    pub kind: ProviderErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ProviderError {
    /// Creates a new provider error.
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an error from a non-2xx HTTP response, classifying by status.
    pub fn http_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => ProviderErrorKind::Auth,
            429 => ProviderErrorKind::RateLimit,
            400..=499 => ProviderErrorKind::InvalidRequest,
            _ => ProviderErrorKind::Api,
        };

        let message = format!("HTTP {status}");
        let details = if body.is_empty() {
            None
        } else {
            // Try to extract a cleaner error message from JSON
            if let Ok(json) = serde_json::from_str::<Value>(body)
                && let Some(error_obj) = json.get("error")
                && let Some(msg) = error_obj.get("message").and_then(|v| v.as_str())
            {
                return Self {
                    kind,
                    message: format!("HTTP {status}: {msg}"),
                    details: Some(body.to_string()),
                };
            }
            Some(body.to_string())
        };
        Self {
            kind,
            message,
            details,
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Parse, message)
    }

    /// Creates an API error (from a mid-stream error event).
    pub fn api_error(error_type: &str, message: &str) -> Self {
        Self {
            kind: ProviderErrorKind::Api,
            message: format!("{error_type}: {message}"),
            details: None,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ============================================================================
// Stream events
// ============================================================================

/// Token usage as reported by the final stream chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Events emitted while streaming one assistant reply.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A fragment of assistant text
    TextDelta(String),
    /// Token accounting, usually in a dedicated chunk near the end
    Usage(TokenUsage),
    /// The `[DONE]` sentinel arrived (or the stream ended cleanly)
    Completed,
}

/// Boxed stream of provider events.
pub type ProviderStream = BoxStream<'static, ProviderResult<StreamEvent>>;

/// Model metadata from the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// API key resolution: config value wins and is trimmed.
    #[test]
    fn test_resolve_api_key_prefers_config() {
        let key = resolve_api_key(Some("  sk-config  "), "TELA_TEST_KEY_UNSET").unwrap();
        assert_eq!(key, "sk-config");
    }

    /// API key resolution: whitespace config value falls through to env,
    /// and a missing env var names itself in the error.
    #[test]
    fn test_resolve_api_key_missing_names_env_var() {
        let err = resolve_api_key(Some("   "), "TELA_TEST_KEY_UNSET").unwrap_err();
        assert!(err.to_string().contains("TELA_TEST_KEY_UNSET"));
    }

    /// Base URL resolution: trailing slashes are trimmed.
    #[test]
    fn test_resolve_base_url_trims_trailing_slash() {
        let url = resolve_base_url(Some("https://proxy.example.com/v1/"), None).unwrap();
        assert_eq!(url, "https://proxy.example.com/v1");
    }

    /// Base URL resolution: invalid and non-http values are rejected.
    #[test]
    fn test_resolve_base_url_rejects_bad_urls() {
        assert!(resolve_base_url(Some("not a url"), None).is_err());
        assert!(resolve_base_url(Some("ftp://example.com"), None).is_err());
    }

    /// Base URL resolution: default applies only when nothing is configured.
    #[test]
    fn test_resolve_base_url_default_and_missing() {
        let url = resolve_base_url(None, Some("https://api.openai.com/v1")).unwrap();
        assert_eq!(url, "https://api.openai.com/v1");

        assert!(resolve_base_url(None, None).is_err());
    }

    /// HTTP status classification: kinds follow the status ranges.
    #[test]
    fn test_http_status_classification() {
        assert_eq!(ProviderError::http_status(401, "").kind, ProviderErrorKind::Auth);
        assert_eq!(ProviderError::http_status(403, "").kind, ProviderErrorKind::Auth);
        assert_eq!(
            ProviderError::http_status(429, "").kind,
            ProviderErrorKind::RateLimit
        );
        assert_eq!(
            ProviderError::http_status(400, "").kind,
            ProviderErrorKind::InvalidRequest
        );
        assert_eq!(ProviderError::http_status(500, "").kind, ProviderErrorKind::Api);
    }

    /// HTTP status errors surface the provider's JSON error message.
    #[test]
    fn test_http_status_extracts_json_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let err = ProviderError::http_status(401, body);
        assert_eq!(err.message, "HTTP 401: Incorrect API key provided");
        assert_eq!(err.details.as_deref(), Some(body));
    }

    /// HTTP status errors keep a non-JSON body as details.
    #[test]
    fn test_http_status_plain_body_becomes_details() {
        let err = ProviderError::http_status(502, "Bad Gateway");
        assert_eq!(err.message, "HTTP 502");
        assert_eq!(err.details.as_deref(), Some("Bad Gateway"));
    }
}
