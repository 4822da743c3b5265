//! LLM provider client.

pub mod openai;
pub mod shared;
pub mod sse;

pub use openai::{ChatClient, ClientConfig};
pub use shared::{
    BASE_URL_ENV_VAR, ChatMessage, ModelInfo, ProviderError, ProviderErrorKind, ProviderResult,
    ProviderStream, StreamEvent, TokenUsage, USER_AGENT, resolve_api_key, resolve_base_url,
};
