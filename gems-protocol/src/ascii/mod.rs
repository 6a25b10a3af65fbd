//! GEMS-ASCII Platform Specific Module.
//!
//! A framed unit is the byte sequence between a literal `|GEMS` and the
//! literal `|END`, inclusive. The submodules split responsibilities the same
//! way the wire does: `codec` finds frame boundaries in a byte stream,
//! `message` turns one frame into a [`Message`](crate::Message) and back, and
//! `parameter` handles the parameter grammar inside message bodies.

pub mod codec;
mod message;
mod parameter;

pub use codec::GemsFrameCodec;
pub use message::{decode_message, encode_message};
pub use parameter::{decode_parameter, encode_parameter, parameter_string_lossy};

use crate::error::ProtocolError;

/// Frame prefix up to the version field.
pub const FRAME_START: &str = "|GEMS";
/// Frame trailer, including its leading delimiter.
pub const FRAME_END: &str = "|END";

/// Escape the v1.4 reserved characters in user-supplied text.
///
/// One left-to-right pass; `&` maps first so already-escaped sequences are
/// never produced from replacement output.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&a"),
            '|' => out.push_str("&b"),
            ',' => out.push_str("&c"),
            ';' => out.push_str("&d"),
            other => out.push(other),
        }
    }
    out
}

/// Reverse [`escape`]. Unknown `&` sequences pass through unchanged.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('a') => {
                out.push('&');
                chars.next();
            }
            Some('b') => {
                out.push('|');
                chars.next();
            }
            Some('c') => {
                out.push(',');
                chars.next();
            }
            Some('d') => {
                out.push(';');
                chars.next();
            }
            _ => out.push('&'),
        }
    }
    out
}

/// Accumulates one GEMS-ASCII frame or frame fragment.
///
/// `safe_write` is the funnel for user-controlled data: it rejects the
/// reserved framing words and anything outside seven-bit ASCII before a byte
/// reaches the buffer. Escaping is the caller's job, since header fields are
/// written verbatim.
#[derive(Debug, Default)]
pub struct AsciiWriter {
    buf: String,
}

impl AsciiWriter {
    pub fn new() -> Self {
        AsciiWriter::default()
    }

    pub fn write_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn write_char(&mut self, c: char) {
        self.buf.push(c);
    }

    /// Write user-controlled data after validating it.
    pub fn safe_write(&mut self, val: &str) -> Result<(), ProtocolError> {
        if val == FRAME_START || val == "|END|" {
            return Err(ProtocolError::Marshal(format!(
                "use of reserved word '{val}'"
            )));
        }
        if !val.is_ascii() {
            return Err(ProtocolError::Marshal(format!(
                "unable to encode non-ASCII characters in '{val}'"
            )));
        }
        self.buf.push_str(val);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}
