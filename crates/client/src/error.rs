use goodvibes_core::error::CoreError;
use goodvibes_core::types::DbId;
use serde::Deserialize;

/// Errors from the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request itself failed (connect, timeout, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
}

/// Error envelope produced by the API server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ClientError {
    /// Map into the domain error, using `project_id` for 404s on a
    /// specific project.
    pub fn into_core(self, project_id: Option<DbId>) -> CoreError {
        match self {
            ClientError::Request(e) if e.is_connect() || e.is_timeout() => {
                CoreError::Unavailable(e.to_string())
            }
            ClientError::Request(e) if e.is_decode() => {
                CoreError::Internal(format!("Unexpected response body: {e}"))
            }
            ClientError::Request(e) => CoreError::Unavailable(e.to_string()),
            ClientError::Api { status, body } => {
                let message = serde_json::from_str::<ErrorBody>(&body)
                    .map(|b| b.error)
                    .unwrap_or(body);
                match (status, project_id) {
                    (400 | 422, _) => CoreError::Validation(message),
                    (401, _) => CoreError::Unauthorized(message),
                    (403, _) => CoreError::Forbidden(message),
                    (404, Some(id)) => CoreError::project_not_found(id),
                    (409, _) => CoreError::Conflict(message),
                    (404, None) | (502..=504, _) => CoreError::Unavailable(message),
                    _ => CoreError::Internal(format!("API error ({status}): {message}")),
                }
            }
        }
    }
}

impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        err.into_core(None)
    }
}
