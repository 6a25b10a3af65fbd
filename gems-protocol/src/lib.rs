//! GEMS 1.4 protocol core.
//!
//! This crate implements the message model of the Ground Equipment Monitoring
//! and control System (GEMS) protocol, version 1.4, together with its two
//! Platform Specific Modules: the line-oriented GEMS-ASCII encoding and the
//! GEMS-XML encoding. Transports live in the `gems-client` and `gems-server`
//! crates; everything here is pure, non-blocking codec and validation logic.

pub mod ascii;
pub mod error;
pub mod message;
pub mod parameter;
pub mod time;
pub mod types;
pub mod value;
pub mod xml;

pub use error::ProtocolError;
pub use message::{Message, MessageBuilder, MessageHeader};
pub use parameter::{Parameter, ParameterBuilder, ParameterNode, ParameterSet};
pub use time::GemsTime;
pub use types::{
    ConnectionType, Datatype, DisconnectReason, GemsResult, MessageKind, ResultCode,
};
pub use value::{HexValue, Value};

/// GEMS protocol version implemented by this crate, XML form.
pub const GEMS_VERSION: &str = "1.4";

/// GEMS protocol version implemented by this crate, ASCII header form.
pub const GEMS_ASCII_VERSION: &str = "14";
