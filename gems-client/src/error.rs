use gems_protocol::{GemsResult, Message, ProtocolError};
use thiserror::Error;

/// Client-side error domain.
///
/// `ErrorResponse` deserves a note: a structurally valid response whose
/// result code is not `SUCCESS` is surfaced as an error that still carries
/// the full response, so callers can inspect the result description or any
/// returned parameters.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unknown PSM '{0}'")]
    UnknownPsm(String),
    #[error("{0}")]
    Protocol(#[from] ProtocolError),
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("send failed: {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("tls error: {0}")]
    Tls(String),
    #[error("timeout waiting for response")]
    Timeout,
    #[error("connection closed")]
    Closed,
    #[error("not connected")]
    NotConnected,
    #[error("did not receive a response type message")]
    NotAResponse,
    #[error("gems response: {}", .0.result().map(GemsResult::to_string).unwrap_or_default())]
    ErrorResponse(Box<Message>),
}

impl ClientError {
    /// The response carried by an `ErrorResponse`, if any.
    pub fn response(&self) -> Option<&Message> {
        match self {
            ClientError::ErrorResponse(msg) => Some(msg),
            _ => None,
        }
    }
}
