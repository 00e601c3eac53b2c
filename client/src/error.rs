use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripError {
    /// Input rejected before any network call was attempted.
    #[error("{0}")]
    Validation(String),
    #[error("stop index {index} out of range for {len} stop(s)")]
    Index { index: usize, len: usize },
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("event `{event}` is not valid while in {state} mode")]
    UnexpectedEvent {
        state: &'static str,
        event: &'static str,
    },
}

impl From<reqwest::Error> for TripError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TripError::Decode(err.to_string())
        } else {
            TripError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TripError {
    fn from(err: serde_json::Error) -> Self {
        TripError::Decode(err.to_string())
    }
}
