use crate::error::ProtocolError;
use crate::parameter::{Parameter, ParameterSet};
use crate::time::GemsTime;
use crate::types::Datatype;
use std::fmt;

/// A hex-encoded bit string with an explicit bit length.
///
/// The canonical textual form is `UPPERCASEHEX/BITLEN`; the empty value
/// prints as `0/0`. An optional `0x`/`0X` prefix is accepted on decode and
/// stripped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HexValue {
    pub data: Vec<u8>,
    pub bit_length: u32,
}

impl HexValue {
    pub fn new(data: Vec<u8>, bit_length: u32) -> Self {
        let bit_length = if bit_length == 0 {
            (data.len() * 2) as u32
        } else {
            bit_length
        };
        HexValue { data, bit_length }
    }

    /// Parse the `HEX/BITLEN` form.
    pub fn from_ascii(s: &str) -> Result<Self, ProtocolError> {
        let (value, bits) = s
            .split_once('/')
            .ok_or_else(|| ProtocolError::unmarshal(s, "HexValue missing '/' separator"))?;
        let bit_length: u32 = bits
            .parse()
            .map_err(|_| ProtocolError::unmarshal(s, "invalid HexValue bit length"))?;

        let value = value.to_ascii_uppercase();
        let value = value.strip_prefix("0X").unwrap_or(&value);
        let data = hex::decode(value)
            .map_err(|_| ProtocolError::unmarshal(s, "invalid hexadecimal characters"))?;
        Ok(HexValue { data, bit_length })
    }

    /// The uppercase hex stream without the bit-length suffix.
    pub fn hex_stream(&self) -> String {
        hex::encode_upper(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.bit_length == 0 || self.data.is_empty()
    }
}

impl fmt::Display for HexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("0/0")
        } else {
            write!(f, "{}/{}", self.hex_stream(), self.bit_length)
        }
    }
}

/// A single typed GEMS value.
///
/// `Empty` is a typed placeholder: it serializes no body, but the enclosing
/// element or field still appears on the wire. The `Parameter` and `Set`
/// variants make parameter trees recursive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty(Datatype),
    String(String),
    Boolean(bool),
    Byte(i8),
    Ubyte(u8),
    Short(i16),
    Ushort(u16),
    Int(i32),
    Uint(u32),
    Long(i64),
    Ulong(u64),
    Double(f64),
    Hex(HexValue),
    Time(GemsTime),
    Utime(GemsTime),
    Parameter(Box<Parameter>),
    Set(Box<ParameterSet>),
}

impl Value {
    /// The datatype tag of this value.
    pub fn datatype(&self) -> Datatype {
        match self {
            Value::Empty(t) => *t,
            Value::String(_) => Datatype::String,
            Value::Boolean(_) => Datatype::Boolean,
            Value::Byte(_) => Datatype::Byte,
            Value::Ubyte(_) => Datatype::Ubyte,
            Value::Short(_) => Datatype::Short,
            Value::Ushort(_) => Datatype::Ushort,
            Value::Int(_) => Datatype::Int,
            Value::Uint(_) => Datatype::Uint,
            Value::Long(_) => Datatype::Long,
            Value::Ulong(_) => Datatype::Ulong,
            Value::Double(_) => Datatype::Double,
            Value::Hex(_) => Datatype::HexValue,
            Value::Time(_) => Datatype::Time,
            Value::Utime(_) => Datatype::Utime,
            Value::Parameter(_) => Datatype::Parameter,
            Value::Set(_) => Datatype::ParameterSet,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty(_))
    }

    /// The wire text of this value (empty for `Empty`).
    ///
    /// Node values render their full ASCII encoding; this is what the
    /// ASCII-purity validation inspects.
    pub fn text(&self) -> String {
        match self {
            Value::Empty(_) => String::new(),
            Value::String(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::Ubyte(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Ushort(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Uint(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Ulong(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Hex(h) => {
                if h.is_empty() {
                    "0/0".to_string()
                } else {
                    h.hex_stream()
                }
            }
            Value::Time(t) => t.format_time(),
            Value::Utime(t) => t.format_utime(),
            Value::Parameter(p) => p.to_string(),
            Value::Set(s) => s.to_string(),
        }
    }

    /// Decode a scalar value of the given datatype from its wire text.
    ///
    /// Empty input yields the typed `Empty` marker. Node datatypes are not
    /// scalars and are rejected here; the parameter codecs handle them.
    pub fn from_text(datatype: Datatype, s: &str) -> Result<Self, ProtocolError> {
        if s.is_empty() {
            return Ok(Value::Empty(datatype));
        }

        let invalid =
            |what: &str| ProtocolError::unmarshal(s, format!("invalid syntax in {what} value"));

        Ok(match datatype {
            Datatype::String => Value::String(s.to_string()),
            Datatype::Boolean => Value::Boolean(parse_bool(s).ok_or_else(|| invalid("bool"))?),
            Datatype::Byte => Value::Byte(s.parse().map_err(|_| invalid("byte"))?),
            Datatype::Ubyte => Value::Ubyte(s.parse().map_err(|_| invalid("ubyte"))?),
            Datatype::Short => Value::Short(s.parse().map_err(|_| invalid("short"))?),
            Datatype::Ushort => Value::Ushort(s.parse().map_err(|_| invalid("ushort"))?),
            Datatype::Int => Value::Int(s.parse().map_err(|_| invalid("int"))?),
            Datatype::Uint => Value::Uint(s.parse().map_err(|_| invalid("uint"))?),
            Datatype::Long => Value::Long(s.parse().map_err(|_| invalid("long"))?),
            Datatype::Ulong => Value::Ulong(s.parse().map_err(|_| invalid("ulong"))?),
            Datatype::Double => Value::Double(s.parse().map_err(|_| invalid("double"))?),
            Datatype::HexValue => {
                if s == "0/0" {
                    Value::Empty(Datatype::HexValue)
                } else {
                    Value::Hex(HexValue::from_ascii(s)?)
                }
            }
            Datatype::Time => Value::Time(GemsTime::from_time_str(s)?),
            Datatype::Utime => Value::Utime(GemsTime::from_utime_str(s)?),
            Datatype::Parameter | Datatype::ParameterSet | Datatype::Undefined => {
                return Err(ProtocolError::Type(format!(
                    "unexpected type '{datatype}'"
                )))
            }
        })
    }
}

/// Boolean wire forms: the usual `true`/`false` plus the `1`/`0` and
/// capitalized spellings produced by other GEMS implementations.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "true" | "True" | "TRUE" => Some(true),
        "0" | "f" | "F" | "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
