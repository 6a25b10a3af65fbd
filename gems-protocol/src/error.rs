use thiserror::Error;

/// Protocol-level error for GEMS encoding and decoding.
///
/// The variants mirror the failure classes the protocol distinguishes:
/// frame-level faults (header, trailer, length), structurally malformed
/// message content, marshal-time input violations, type errors and builder
/// validation failures. Transport failures are out of scope here and live
/// with the client/server crates.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Missing or corrupt frame header/trailer, wrong protocol version, or a
    /// length field that does not match the data.
    #[error("gems-ascii: {0}")]
    Framing(String),
    /// Structurally invalid message or parameter content.
    #[error("{0}")]
    Malformed(String),
    /// Marshal-time rejection of user-supplied data.
    #[error("gems: marshal failed, {0}")]
    Marshal(String),
    /// Unknown or inconsistent datatype.
    #[error("gems: type error, {0}")]
    Type(String),
    /// Parameter or message invariant violated at build time.
    #[error("gems: build failed: {0}")]
    Validation(String),
    /// Underlying XML reader/writer failure.
    #[error("gems-xml: {0}")]
    Xml(#[from] quick_xml::Error),
}

impl ProtocolError {
    /// Malformed-content error quoting the offending input.
    pub fn unmarshal(data: impl AsRef<[u8]>, msg: impl Into<String>) -> Self {
        ProtocolError::Malformed(format!(
            "gems: unmarshal of '{}' failed, {}",
            String::from_utf8_lossy(data.as_ref()),
            msg.into()
        ))
    }

    /// Malformed-content error without input context.
    pub fn malformed(msg: impl Into<String>) -> Self {
        ProtocolError::Malformed(format!("gems: unmarshal failed, {}", msg.into()))
    }

    /// True for errors that a server should answer with `MALFORMED_MESSAGE`.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProtocolError::Malformed(_) | ProtocolError::Framing(_))
    }
}

impl From<quick_xml::events::attributes::AttrError> for ProtocolError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        ProtocolError::Xml(quick_xml::Error::InvalidAttr(e))
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(e: std::io::Error) -> Self {
        ProtocolError::Xml(quick_xml::Error::Io(std::sync::Arc::new(e)))
    }
}
