use thiserror::Error;

use super::FAILURE_MESSAGE;

/// Failure of a caption generation call.
///
/// The variants keep the underlying cause for logs; what the user sees is
/// always [`GenerationError::user_message`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("HTTP request to {provider} failed: {source}")]
    Http {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP status {status} from {provider}: {message}")]
    HttpStatus {
        provider: &'static str,
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("unable to parse response from {provider}: {message}")]
    ResponseParse {
        provider: &'static str,
        message: String,
    },
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// The request URL carries the API key, so it is stripped from the source.
    pub fn http(provider: &'static str, source: reqwest::Error) -> Self {
        Self::Http {
            provider,
            source: source.without_url(),
        }
    }

    pub fn status(provider: &'static str, status: reqwest::StatusCode, message: String) -> Self {
        Self::HttpStatus {
            provider,
            status,
            message,
        }
    }

    pub fn response(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ResponseParse {
            provider,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http { source, .. } if source.is_timeout())
    }

    pub fn user_message(&self) -> &'static str {
        FAILURE_MESSAGE
    }
}
