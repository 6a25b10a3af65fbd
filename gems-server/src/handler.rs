use crate::DEFAULT_SESSION_TOKEN;
use gems_protocol::{
    Message, MessageBuilder, MessageKind, ProtocolError, ResultCode,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The application seam: handles one request from a connected peer and
/// produces its response. The server never inspects handler internals.
pub type MessageHandler = Arc<dyn Fn(&Message) -> Result<Message, HandlerError> + Send + Sync>;

/// An application failure, mapped into the response `Result`.
///
/// Errors the handler cannot classify surface as `INTERNAL_ERROR` with the
/// error text attached as the response description.
#[derive(Debug, Error)]
pub struct HandlerError {
    pub code: ResultCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(code: ResultCode, message: impl Into<String>) -> Self {
        HandlerError {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        HandlerError::new(ResultCode::InternalError, message)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<ProtocolError> for HandlerError {
    fn from(e: ProtocolError) -> Self {
        let code = if e.is_malformed() {
            ResultCode::MalformedMessage
        } else {
            ResultCode::InternalError
        };
        HandlerError::new(code, e.to_string())
    }
}

/// A stock handler answering every request with a successful
/// `UnknownResponse`. Useful for smoke tests and as a placeholder backend.
pub fn default_handler() -> MessageHandler {
    Arc::new(|req: &Message| {
        let mut builder = MessageBuilder::new()
            .kind(MessageKind::UnknownResponse)
            .token(DEFAULT_SESSION_TOKEN)
            .result_code(ResultCode::Success);
        if let Some(id) = req.transaction_id() {
            builder = builder.transaction_id(id);
        }
        builder.build().map_err(HandlerError::from)
    })
}

/// Outcome of gating a message from a peer that is not yet connected.
pub(crate) struct GateOutcome {
    pub response: Message,
    /// True when the peer authenticated and joins the connected set.
    pub accepted: bool,
}

/// Answer a message from an unconnected peer.
///
/// A `ConnectionRequestMessage` is checked against the configured auth
/// token; on success the server's session token is handed back. Any other
/// kind is refused with `INVALID_STATE`.
pub(crate) fn connection_gate(
    req: &Message,
    auth_token: Option<&str>,
) -> Result<GateOutcome, ProtocolError> {
    let mut builder = MessageBuilder::new().kind(MessageKind::ConnectResponse);
    if let Some(id) = req.transaction_id() {
        builder = builder.transaction_id(id);
    }

    match req.kind() {
        MessageKind::Connect => {
            if let Some(expected) = auth_token {
                if !expected.is_empty() && req.header().token != expected {
                    let response = builder
                        .result_code(ResultCode::AccessDenied)
                        .response_description("Authentication failed.")
                        .build()?;
                    return Ok(GateOutcome {
                        response,
                        accepted: false,
                    });
                }
            }
            let response = builder
                .token(DEFAULT_SESSION_TOKEN)
                .result_code(ResultCode::Success)
                .build()?;
            Ok(GateOutcome {
                response,
                accepted: true,
            })
        }
        _ => {
            let response = builder
                .kind(MessageKind::UnknownResponse)
                .result_code(ResultCode::InvalidState)
                .response_description("Not connected")
                .build()?;
            Ok(GateOutcome {
                response,
                accepted: false,
            })
        }
    }
}

/// Map a handler failure to the `UnknownResponse` sent in its place.
pub(crate) fn error_response(
    req: &Message,
    err: &HandlerError,
) -> Result<Message, ProtocolError> {
    let mut builder = MessageBuilder::new()
        .kind(MessageKind::UnknownResponse)
        .result_code(err.code)
        .response_description(err.message.as_str());
    if let Some(id) = req.transaction_id() {
        builder = builder.transaction_id(id);
    }
    builder.build()
}
