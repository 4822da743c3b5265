//! OpenAI-compatible chat completions client.
//!
//! Covers two endpoint shapes, selected by `api_type` in config:
//! plain OpenAI (`{base}/chat/completions`, Bearer auth) and Azure
//! OpenAI (`{base}/openai/deployments/{deployment}/chat/completions`,
//! `api-key` auth, `api-version` query parameter).

use anyhow::Result;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::{ApiType, Config};
use crate::providers::sse::ChatCompletionsSseParser;
use crate::providers::{
    ChatMessage, ModelInfo, ProviderError, ProviderStream, USER_AGENT, resolve_api_key,
    resolve_base_url,
};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Resolved connection settings for one client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_type: ApiType,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    /// Azure api-version query value (unused for openai)
    pub azure_api_version: String,
    /// Azure deployment path segment (unused for openai)
    pub azure_deployment: String,
}

impl ClientConfig {
    /// Resolves a client config from the loaded configuration.
    ///
    /// Key resolution: config value, then the env var for the api type.
    /// Base URL resolution: `TELA_BASE_URL`, then config, then the
    /// OpenAI default. Azure has no default and requires `base_url`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = resolve_api_key(
            config.effective_api_key(),
            config.api_type.api_key_env_var(),
        )?;

        let default_url = match config.api_type {
            ApiType::OpenAi => Some(DEFAULT_OPENAI_BASE_URL),
            ApiType::Azure => None,
        };
        let base_url = resolve_base_url(config.effective_base_url(), default_url)?;

        Ok(Self {
            api_type: config.api_type,
            api_key,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            azure_api_version: config.azure.effective_api_version().to_string(),
            azure_deployment: config.azure.effective_deployment(&config.model).to_string(),
        })
    }

    fn completions_url(&self) -> String {
        match self.api_type {
            ApiType::OpenAi => format!("{}{}", self.base_url, CHAT_COMPLETIONS_PATH),
            ApiType::Azure => format!(
                "{}/openai/deployments/{}{}?api-version={}",
                self.base_url, self.azure_deployment, CHAT_COMPLETIONS_PATH, self.azure_api_version
            ),
        }
    }

    fn models_url(&self) -> String {
        match self.api_type {
            ApiType::OpenAi => format!("{}/models", self.base_url),
            ApiType::Azure => format!(
                "{}/openai/models?api-version={}",
                self.base_url, self.azure_api_version
            ),
        }
    }
}

/// Chat completions client for one configured endpoint.
pub struct ChatClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Builds a client straight from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ClientConfig::from_config(config)?))
    }

    /// The model name requests are issued for.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends the conversation and returns the event stream for the reply.
    ///
    /// An optional system prompt is prepended to the outgoing messages.
    /// One attempt, no retries; errors surface immediately.
    pub async fn send_messages_stream(
        &self,
        messages: &[ChatMessage],
        system: Option<&str>,
    ) -> Result<ProviderStream> {
        let request = build_request(&self.config, messages, system);
        let url = self.config.completions_url();
        let headers = build_headers(&self.config, "text/event-stream");

        tracing::debug!(url = %url, model = %self.config.model, "sending chat completions request");

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status.as_u16(), &error_body).into());
        }

        let byte_stream = response.bytes_stream();
        Ok(ChatCompletionsSseParser::new(byte_stream).boxed())
    }

    /// Fetches the model listing, sorted by id.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self.config.models_url();
        let headers = build_headers(&self.config, "application/json");

        let response = self
            .http
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::http_status(status.as_u16(), &error_body).into());
        }

        let listing: ModelsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::parse(format!("Failed to parse models response: {e}")))?;

        let mut models = listing.data;
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }
}

fn build_headers(config: &ClientConfig, accept: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match config.api_type {
        ApiType::OpenAi => {
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                    .unwrap_or_else(|_| HeaderValue::from_static("")),
            );
        }
        ApiType::Azure => {
            headers.insert(
                "api-key",
                HeaderValue::from_str(&config.api_key)
                    .unwrap_or_else(|_| HeaderValue::from_static("")),
            );
        }
    }
    headers.insert("accept", HeaderValue::from_static(accept));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}

fn classify_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::network(format!("Connection failed: {e}"))
    } else {
        ProviderError::network(format!("Network error: {e}"))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream_options: StreamOptions,
}

#[derive(Debug, Serialize)]
struct StreamOptions {
    include_usage: bool,
}

fn build_request<'a>(
    config: &'a ClientConfig,
    messages: &[ChatMessage],
    system: Option<&str>,
) -> ChatCompletionRequest<'a> {
    let mut out_messages = Vec::with_capacity(messages.len() + 1);

    if let Some(prompt) = system
        && !prompt.trim().is_empty()
    {
        out_messages.push(ChatMessage::system(prompt));
    }
    out_messages.extend(messages.iter().cloned());

    ChatCompletionRequest {
        model: &config.model,
        stream: true,
        messages: out_messages,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        stream_options: StreamOptions {
            include_usage: true,
        },
    }
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelInfo>,
}
