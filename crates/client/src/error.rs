use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),
}

pub type ClientResult<T> = Result<T, ClientError>;
