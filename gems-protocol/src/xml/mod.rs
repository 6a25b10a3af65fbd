//! GEMS-XML Platform Specific Module.
//!
//! Every element lives in the GEMS base-types namespace, and the `xmlns`
//! declaration is repeated on every message, parameter and value element so
//! that decoders matching on local names interoperate. Elements are never
//! self-closed.

mod decode;
mod encode;

pub use decode::{decode_message, decode_parameter};
pub use encode::{encode_message, encode_parameter};

/// The GEMS 1.4 base-types namespace.
pub const NAMESPACE: &str = "http://www.omg.org/spec/gems/20110323/basetypes";
