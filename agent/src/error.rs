use async_openai::error::OpenAIError;
use thiserror::Error;

/// Lower-cased fragments that mark a provider message as a transient condition.
const TRANSIENT_MARKERS: &[&str] = &[
    "rate_limit",
    "rate limit",
    "no healthy upstream",
    "too many requests",
    "service unavailable",
    "overloaded",
    "server_error",
    "internal server error",
    "bad gateway",
    "gateway timeout",
    "temporarily unavailable",
];

#[derive(Error, Debug)]
pub enum Error {
    #[error("Json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Openai error: {0}")]
    OpenaiError(#[from] OpenAIError),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("No response from llm: {0}")]
    LLMResponseError(String),

    #[error("Tool {0} does not exist")]
    ToolDoesNotExist(String),

    #[error("Missing arg: {0}")]
    MissingArg(String),

    #[error("Agent workflow error: {0}")]
    AgentWorkflowError(String),

    #[error("Http error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    /// Builds a provider error from its message, classifying it as transient
    /// when it carries one of the known rate-limit or upstream markers.
    pub fn provider(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_transient_message(&message) {
            Error::ProviderUnavailable(message)
        } else {
            Error::ProviderError(message)
        }
    }

    /// Whether retrying the same call later is likely to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ProviderUnavailable(_))
    }
}

pub(crate) fn is_transient_message(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
