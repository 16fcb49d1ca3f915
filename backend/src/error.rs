use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("no route found between {origin:?} and {destination:?}")]
    NoRoute { origin: String, destination: String },

    #[error("no geocoding results for {0:?}")]
    NoGeocodeResults(String),

    #[error("{service} returned status {status}: {message}")]
    Upstream {
        service: &'static str,
        status: String,
        message: String,
    },

    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("failed to parse upstream response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

// Request URLs carry provider keys in their query string.
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Request(err.without_url())
    }
}
