use thiserror::Error;

/// Failures from a single call to the booking API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("credential rejected (403)")]
    Forbidden,

    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("login response carried no Authorization header")]
    MissingToken,
}

/// Failures that end a poll cycle. Every variant is recoverable: the watch
/// loop logs it and enters backoff.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("token refresh failed")]
    AuthRefresh(#[source] ApiError),

    #[error("appointment fetch failed")]
    Fetch(#[source] ApiError),

    #[error("malformed appointment date {value:?}")]
    Parse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
