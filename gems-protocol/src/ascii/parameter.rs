//! The GEMS-ASCII parameter grammar.
//!
//! A leaf parameter encodes as `name:type=value` (scalar) or
//! `name:type[n]=v1,v2,…` (array). A parameter set uses the `set_type` type
//! name; its body is a `;`-terminated list of child parameter encodings, and
//! with a multiplicity present the body becomes `,`-separated groups of such
//! lists. A bare `name` with no `=` names a desired parameter in a
//! `GetConfigMessage`.

use super::{escape, unescape, AsciiWriter};
use crate::error::ProtocolError;
use crate::parameter::{Parameter, ParameterNode, ParameterSet};
use crate::types::Datatype;
use crate::value::Value;

/// Encode one parameter or parameter set.
pub fn encode_parameter(node: &ParameterNode) -> Result<String, ProtocolError> {
    let mut w = AsciiWriter::new();
    write_parameter(&mut w, node)?;
    Ok(w.into_string())
}

/// Best-effort encoding for display purposes; stops at the first invalid
/// byte instead of failing.
pub fn parameter_string_lossy(node: &ParameterNode) -> String {
    let mut w = AsciiWriter::new();
    let _ = write_parameter(&mut w, node);
    w.into_string()
}

pub(crate) fn write_parameter(w: &mut AsciiWriter, node: &ParameterNode) -> Result<(), ProtocolError> {
    match node {
        ParameterNode::Parameter(p) => write_leaf(w, p),
        ParameterNode::Set(s) => write_set(w, s),
    }
}

fn write_leaf(w: &mut AsciiWriter, p: &Parameter) -> Result<(), ProtocolError> {
    w.safe_write(&escape(p.name()))?;

    match p.value_type() {
        Datatype::Undefined => {
            if p.values.is_empty() {
                // A bare name denotes a desired parameter.
                return Ok(());
            }
            return Err(ProtocolError::Marshal(
                "cannot marshal a Parameter of undefined type".into(),
            ));
        }
        t => {
            w.write_char(':');
            w.write_str(t.ascii_name());
        }
    }

    match p.multiplicity {
        None => w.write_char('='),
        Some(m) => w.write_str(&format!("[{m}]=")),
    }

    write_values(w, &p.values)
}

fn write_set(w: &mut AsciiWriter, s: &ParameterSet) -> Result<(), ProtocolError> {
    w.safe_write(&escape(s.name()))?;
    match s.multiplicity {
        None => w.write_str(&format!(":{}=", Datatype::ParameterSet.ascii_name())),
        Some(m) => w.write_str(&format!(":{}[{m}]=", Datatype::ParameterSet.ascii_name())),
    }
    write_values(w, &s.values)
}

/// Encode a value list. Child parameters terminate with `;`; nested sets
/// inline their own value list and groups separate with `,`; scalar arrays
/// separate with `,`.
fn write_values(w: &mut AsciiWriter, values: &[Value]) -> Result<(), ProtocolError> {
    for (i, v) in values.iter().enumerate() {
        match v {
            Value::Set(child) => write_values(w, &child.values)?,
            other => write_value(w, other)?,
        }

        match v.datatype() {
            Datatype::Parameter => w.write_char(';'),
            _ => {
                if i < values.len() - 1 {
                    w.write_char(',');
                }
            }
        }
    }
    Ok(())
}

fn write_value(w: &mut AsciiWriter, v: &Value) -> Result<(), ProtocolError> {
    match v {
        Value::Empty(_) => Ok(()),
        Value::String(s) => w.safe_write(&escape(s)),
        Value::Hex(h) => {
            if h.bit_length == 0 {
                w.write_str("0/0");
            } else {
                w.write_str(&format!("{}/{}", h.hex_stream(), h.bit_length));
            }
            Ok(())
        }
        Value::Parameter(p) => write_leaf(w, p),
        Value::Set(s) => write_values(w, &s.values),
        other => {
            w.write_str(&other.text());
            Ok(())
        }
    }
}

/// Decode one parameter encoding, dispatching on the type tag: `set_type`
/// yields a `ParameterSet`, everything else a leaf `Parameter`.
pub fn decode_parameter(data: &[u8]) -> Result<ParameterNode, ProtocolError> {
    match sniff_type(data) {
        Datatype::ParameterSet => Ok(ParameterNode::Set(parse_set(data)?)),
        _ => Ok(ParameterNode::Parameter(parse_leaf(data)?)),
    }
}

/// Peek at the declared value type without fully parsing.
fn sniff_type(data: &[u8]) -> Datatype {
    let Some(eq) = data.iter().position(|b| *b == b'=') else {
        return Datatype::Undefined;
    };
    let header = &data[..eq];
    let Some(colon) = header.iter().rposition(|b| *b == b':') else {
        return Datatype::Undefined;
    };

    let typ = &header[colon + 1..];
    let end = typ
        .iter()
        .position(|b| *b == b'[' || *b == b'(')
        .unwrap_or(typ.len());
    Datatype::from_ascii_name(&String::from_utf8_lossy(&typ[..end]))
}

/// Split `name:type[multiplicity]` into its pieces; `Ok(None)` means the
/// input was a bare name with no `=`.
#[allow(clippy::type_complexity)]
fn parse_header(data: &[u8]) -> Result<Option<(String, Datatype, Option<i32>, Vec<u8>)>, ProtocolError> {
    let Some(eq) = data.iter().position(|b| *b == b'=') else {
        return Ok(None);
    };
    let header = &data[..eq];
    let values = data[eq + 1..].to_vec();

    let colon = header
        .iter()
        .rposition(|b| *b == b':')
        .ok_or_else(|| ProtocolError::unmarshal(data, "parameter missing ':' separator"))?;

    let name = unescape(&String::from_utf8_lossy(&header[..colon]));
    let mut typ = &header[colon + 1..];
    let mut multiplicity = None;

    if let Some(bracket) = typ.iter().position(|b| *b == b'[') {
        let valid = typ.last() == Some(&b']') && bracket + 3 <= typ.len();
        if !valid {
            return Err(ProtocolError::unmarshal(typ, "invalid type string"));
        }
        let digits = &typ[bracket + 1..typ.len() - 1];
        let m: i32 = String::from_utf8_lossy(digits)
            .parse()
            .map_err(|_| ProtocolError::unmarshal(digits, "invalid multiplicity value"))?;
        multiplicity = Some(m);
        typ = &typ[..bracket];
    }

    let datatype = Datatype::from_ascii_name(&String::from_utf8_lossy(typ));
    if datatype == Datatype::Undefined {
        return Err(ProtocolError::unmarshal(typ, "invalid value type"));
    }

    Ok(Some((name, datatype, multiplicity, values)))
}

fn parse_leaf(data: &[u8]) -> Result<Parameter, ProtocolError> {
    let Some((name, datatype, multiplicity, values)) = parse_header(data)? else {
        // Bare name: a desired-parameter reference.
        return Ok(Parameter {
            name: unescape(&String::from_utf8_lossy(data)),
            multiplicity: None,
            values: Vec::new(),
        });
    };

    let mut parsed = Vec::new();
    for chunk in values.split(|b| *b == b',') {
        let text = String::from_utf8_lossy(chunk);
        let value = if datatype == Datatype::String && !text.is_empty() {
            Value::String(unescape(&text))
        } else {
            Value::from_text(datatype, &text)?
        };
        parsed.push(value);
    }

    Ok(Parameter {
        name,
        multiplicity,
        values: parsed,
    })
}

fn parse_set(data: &[u8]) -> Result<ParameterSet, ProtocolError> {
    let Some((name, datatype, multiplicity, values)) = parse_header(data)? else {
        return Ok(ParameterSet {
            name: unescape(&String::from_utf8_lossy(data)),
            multiplicity: None,
            values: Vec::new(),
        });
    };

    if multiplicity.is_some() && datatype != Datatype::ParameterSet {
        return Err(ProtocolError::unmarshal(
            data,
            "unexpected type for ParameterSet",
        ));
    }

    let mut set = ParameterSet {
        name,
        multiplicity,
        values: Vec::new(),
    };
    if values.is_empty() {
        return Ok(set);
    }

    let body = values.strip_suffix(b";").unwrap_or(&values);
    if set.multiplicity.is_some() {
        for group in split_on(body, b";,") {
            let mut child = ParameterSet::default();
            for chunk in group.split(|b| *b == b';') {
                child
                    .values
                    .push(Value::Parameter(Box::new(parse_leaf(chunk)?)));
            }
            set.values.push(Value::Set(Box::new(child)));
        }
    } else {
        for chunk in body.split(|b| *b == b';') {
            set.values.push(Value::Parameter(Box::new(parse_leaf(chunk)?)));
        }
    }

    Ok(set)
}

/// Split on a two-byte separator.
fn split_on<'a>(data: &'a [u8], sep: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + sep.len() <= data.len() {
        if &data[i..i + sep.len()] == sep {
            parts.push(&data[start..i]);
            i += sep.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(&data[start..]);
    parts
}
