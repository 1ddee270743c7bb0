//! Provider error types.

use thiserror::Error;

/// Errors that can occur when talking to an assessment backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The API answered but carried no message content.
    #[error("response contained no assessment")]
    EmptyResponse,
}

impl ProviderError {
    /// Errors that will not go away by asking again.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        ) || matches!(self, ProviderError::ApiError { status, .. } if (400..500).contains(status))
    }

    /// Server-provided backoff hint, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Map a transport error from reqwest.
pub(crate) fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::NetworkError(err.to_string())
    }
}

/// Turn a non-success HTTP response into a [`ProviderError`].
pub(crate) async fn from_status(response: reqwest::Response, model: &str) -> ProviderError {
    let status = response.status().as_u16();
    match status {
        429 => {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                .saturating_mul(1000);
            ProviderError::RateLimited { retry_after_ms }
        }
        401 | 403 => ProviderError::AuthenticationFailed(response.text().await.unwrap_or_default()),
        404 => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::ApiError {
            status,
            message: response.text().await.unwrap_or_default(),
        },
    }
}
