use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::backend::StoreError;

/// Failures surfaced by the webhook and query handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller's credential does not match the configured webhook secret.
    #[error("webhook request doesn't carry a valid Authorization header")]
    Unauthorized,
    #[error("malformed event payload: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("event store: {0}")]
    Store(#[from] StoreError),
    #[error("encoding response: {0}")]
    Encoding(#[source] serde_json::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, "request rejected");
        }
        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_and_server_faults_map_to_distinct_statuses() {
        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Decode(decode).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::Store(StoreError::Task("cancelled".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
