//! GEMS 1.4 client.
//!
//! [`GemsClient`] drives one session against a GEMS server over either
//! Platform Specific Module: GEMS-ASCII over a TCP (optionally TLS) stream,
//! or GEMS-XML over HTTP POST. The client owns the session state the
//! protocol requires: the token handed back by the server on connect, the
//! target path, and the monotonically increasing transaction id used to
//! correlate responses.

mod ascii;
mod client;
mod error;
mod tls;
mod xml;

pub use client::{GemsClient, Psm};
pub use error::ClientError;

use std::time::Duration;

/// Deadline applied to connect attempts and response waits.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);
