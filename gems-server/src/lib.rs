//! GEMS 1.4 server runtimes.
//!
//! Both servers share the same shape: a [`MessageHandler`] supplied by the
//! application handles requests from connected peers, while a connection
//! gate answers everyone else (`ConnectionRequestMessage` with an optional
//! auth-token check; anything else gets `INVALID_STATE`). The ASCII server
//! owns a TCP accept loop with one task per connection; the XML server is an
//! actix-web application handling one request per HTTP POST. Each keeps its
//! connected-peer set in a concurrent map keyed by remote address.

mod ascii;
mod handler;
mod xml;

pub use ascii::AsciiServer;
pub use handler::{default_handler, HandlerError, MessageHandler};
pub use xml::XmlServer;

/// Session token handed to peers on a successful connect when the
/// application does not provide its own.
pub const DEFAULT_SESSION_TOKEN: &str = "Z2Vtcy1ycyBzZXNzaW9u";
