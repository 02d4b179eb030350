use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

/// Failure modes of one analysis round trip. Everything here is surfaced
/// to the browser as an inline message; nothing kills the server.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("no response from the AI service within {}s", .0.as_secs())]
    Timeout(Duration),
}

/// What went wrong on the Gemini side, triaged so the UI can say something
/// more useful than "error".
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("API key rejected - check that the key is valid and has vision access enabled")]
    Auth,

    #[error("API quota exceeded - the free tier limit has been reached, wait for it to reset or enable billing")]
    Quota,

    #[error("no usable model: {0}")]
    ModelUnavailable(String),

    #[error("AI service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error talking to the AI service: {0}")]
    Transport(String),

    #[error("unexpected response from the AI service: {0}")]
    MalformedResponse(String),
}

impl AnalyzeError {
    fn status(&self) -> StatusCode {
        match self {
            AnalyzeError::Input(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AnalyzeError::Remote(RemoteError::Quota) => StatusCode::TOO_MANY_REQUESTS,
            AnalyzeError::Remote(_) => StatusCode::BAD_GATEWAY,
            AnalyzeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "analysis failed");
        } else {
            tracing::warn!(error = %self, "analysis rejected");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
