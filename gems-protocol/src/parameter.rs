use crate::error::ProtocolError;
use crate::time::GemsTime;
use crate::types::Datatype;
use crate::value::{HexValue, Value};
use std::fmt;

/// A named, typed leaf container holding zero or more values of one
/// datatype.
///
/// An absent multiplicity makes the parameter a scalar (at most one value);
/// a multiplicity of `-1` is the variable-length sentinel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    pub(crate) name: String,
    pub multiplicity: Option<i32>,
    pub values: Vec<Value>,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The common datatype of the contained values, or `Undefined` when the
    /// parameter is empty or the values disagree.
    pub fn value_type(&self) -> Datatype {
        common_type(&self.values)
    }

    /// Check the leaf-parameter invariants.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        validate_common(&self.name, &self.values, "Parameter")?;

        if self.multiplicity.is_none() && self.values.len() > 1 {
            return Err(ProtocolError::Validation(
                "scalar Parameter contains multiple values".into(),
            ));
        }
        validate_multiplicity(self.multiplicity, &self.values, "Parameter")?;

        if self.values.is_empty() {
            return Ok(());
        }
        match self.value_type() {
            Datatype::Undefined => Err(ProtocolError::Validation(
                "Parameter contains inconsistent or undefined value types".into(),
            )),
            Datatype::Parameter | Datatype::ParameterSet => Err(ProtocolError::Validation(
                "Parameter contains Parameter or ParameterSet values".into(),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ascii::parameter_string_lossy(&ParameterNode::Parameter(
            self.clone(),
        )))
    }
}

/// A named container of parameters or of nested parameter sets.
///
/// Without a multiplicity the set holds one group of parameters; with one it
/// holds an array of child sets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterSet {
    pub(crate) name: String,
    pub multiplicity: Option<i32>,
    pub values: Vec<Value>,
}

impl ParameterSet {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> Datatype {
        common_type(&self.values)
    }

    /// Check the set invariants.
    ///
    /// A set without a multiplicity holds one group of parameters, so only
    /// child *sets* are bounded by the scalar rule; the multiplicity bound
    /// counts the array of child sets.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        validate_common(&self.name, &self.values, "ParameterSet")?;

        if self.multiplicity.is_none()
            && self.value_type() == Datatype::ParameterSet
            && self.values.len() > 1
        {
            return Err(ProtocolError::Validation(
                "scalar ParameterSet contains multiple values".into(),
            ));
        }
        validate_multiplicity(self.multiplicity, &self.values, "ParameterSet")?;

        if self.values.is_empty() {
            return Ok(());
        }
        if self.value_type() == Datatype::Undefined {
            return Err(ProtocolError::Validation(
                "ParameterSet contains inconsistent or undefined value types".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ascii::parameter_string_lossy(&ParameterNode::Set(
            self.clone(),
        )))
    }
}

/// Either node of the parameter tree: a leaf `Parameter` or a
/// `ParameterSet`.
///
/// Messages carry lists of these; which one a wire encoding denotes is
/// decided by its type tag (`set_type` / `ParameterSet`).
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterNode {
    Parameter(Parameter),
    Set(ParameterSet),
}

impl ParameterNode {
    pub fn name(&self) -> &str {
        match self {
            ParameterNode::Parameter(p) => p.name(),
            ParameterNode::Set(s) => s.name(),
        }
    }

    /// `Parameter` or `ParameterSet`.
    pub fn datatype(&self) -> Datatype {
        match self {
            ParameterNode::Parameter(_) => Datatype::Parameter,
            ParameterNode::Set(_) => Datatype::ParameterSet,
        }
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            ParameterNode::Parameter(p) => p.validate(),
            ParameterNode::Set(s) => s.validate(),
        }
    }

    /// Wrap the node in its `Value` form for use inside a set.
    pub fn into_value(self) -> Value {
        match self {
            ParameterNode::Parameter(p) => Value::Parameter(Box::new(p)),
            ParameterNode::Set(s) => Value::Set(Box::new(s)),
        }
    }
}

impl fmt::Display for ParameterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ascii::parameter_string_lossy(self))
    }
}

fn common_type(values: &[Value]) -> Datatype {
    let mut datatype = Datatype::Undefined;
    for v in values {
        if datatype == Datatype::Undefined {
            datatype = v.datatype();
        }
        if datatype != v.datatype() {
            return Datatype::Undefined;
        }
    }
    datatype
}

fn validate_common(name: &str, values: &[Value], what: &str) -> Result<(), ProtocolError> {
    if name.chars().any(char::is_whitespace) {
        return Err(ProtocolError::Validation(format!(
            "{what} name cannot contain spaces"
        )));
    }

    for v in values {
        if !v.text().is_ascii() {
            return Err(ProtocolError::Validation(format!(
                "{what} contains non-ASCII characters"
            )));
        }
    }
    Ok(())
}

/// Empty markers occupy a slot on the wire but not in the array bound, so a
/// declared-empty array (`name:type[0]=`) stays valid. `-1` lifts the bound.
fn validate_multiplicity(
    multiplicity: Option<i32>,
    values: &[Value],
    what: &str,
) -> Result<(), ProtocolError> {
    let occupied = values.iter().filter(|v| !v.is_empty()).count();
    if let Some(m) = multiplicity {
        if m != -1 && occupied as i64 > m as i64 {
            return Err(ProtocolError::Validation(format!(
                "array {what} has invalid multiplicity value"
            )));
        }
    }
    Ok(())
}

/// Builder for parameters and parameter sets.
///
/// The value setters replace the pending value list; calling one with an
/// empty collection records a typed empty marker instead (the wire still
/// carries the slot). `build` decides between `Parameter` and `ParameterSet`
/// from the value datatype and validates the result.
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    name: String,
    multiplicity: Option<i32>,
    values: Vec<Value>,
    error: Option<ProtocolError>,
}

impl ParameterBuilder {
    pub fn new() -> Self {
        ParameterBuilder::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn multiplicity(mut self, m: i32) -> Self {
        self.multiplicity = Some(m);
        self
    }

    /// Append a typed empty marker.
    pub fn empty(mut self, datatype: Datatype) -> Self {
        self.values.push(Value::Empty(datatype));
        self
    }

    fn set_values<I, T, F>(mut self, values: I, datatype: Datatype, f: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(T) -> Value,
    {
        let parsed: Vec<Value> = values.into_iter().map(f).collect();
        if parsed.is_empty() {
            self.values.push(Value::Empty(datatype));
        } else {
            self.values = parsed;
        }
        self
    }

    pub fn strings<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_values(values, Datatype::String, |v| Value::String(v.into()))
    }

    pub fn bools<I: IntoIterator<Item = bool>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Boolean, Value::Boolean)
    }

    pub fn bytes<I: IntoIterator<Item = i8>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Byte, Value::Byte)
    }

    pub fn ubytes<I: IntoIterator<Item = u8>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Ubyte, Value::Ubyte)
    }

    pub fn shorts<I: IntoIterator<Item = i16>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Short, Value::Short)
    }

    pub fn ushorts<I: IntoIterator<Item = u16>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Ushort, Value::Ushort)
    }

    pub fn ints<I: IntoIterator<Item = i32>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Int, Value::Int)
    }

    pub fn uints<I: IntoIterator<Item = u32>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Uint, Value::Uint)
    }

    pub fn longs<I: IntoIterator<Item = i64>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Long, Value::Long)
    }

    pub fn ulongs<I: IntoIterator<Item = u64>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Ulong, Value::Ulong)
    }

    pub fn doubles<I: IntoIterator<Item = f64>>(self, values: I) -> Self {
        self.set_values(values, Datatype::Double, Value::Double)
    }

    /// Hex values in their `HEX/BITLEN` textual form.
    pub fn hex_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for v in values {
            match HexValue::from_ascii(v.as_ref()) {
                Ok(h) => parsed.push(Value::Hex(h)),
                Err(e) => {
                    self.error.get_or_insert(e);
                    return self;
                }
            }
        }
        if parsed.is_empty() {
            self.values.push(Value::Empty(Datatype::HexValue));
        } else {
            self.values = parsed;
        }
        self
    }

    /// Time values in their `sec.nanos` textual form.
    pub fn times<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for v in values {
            match GemsTime::from_time_str(v.as_ref()) {
                Ok(t) => parsed.push(Value::Time(t)),
                Err(e) => {
                    self.error.get_or_insert(e);
                    return self;
                }
            }
        }
        if parsed.is_empty() {
            self.values.push(Value::Empty(Datatype::Time));
        } else {
            self.values = parsed;
        }
        self
    }

    /// UTC time values in their ordinal-date textual form.
    pub fn utimes<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for v in values {
            match GemsTime::from_utime_str(v.as_ref()) {
                Ok(t) => parsed.push(Value::Utime(t)),
                Err(e) => {
                    self.error.get_or_insert(e);
                    return self;
                }
            }
        }
        if parsed.is_empty() {
            self.values.push(Value::Empty(Datatype::Utime));
        } else {
            self.values = parsed;
        }
        self
    }

    /// Child parameters or sets; makes the result a `ParameterSet`.
    ///
    /// An empty collection records one empty parameter, which is what the
    /// wire carries for a set without content.
    pub fn parameters<I: IntoIterator<Item = ParameterNode>>(mut self, values: I) -> Self {
        let parsed: Vec<Value> = values.into_iter().map(ParameterNode::into_value).collect();
        if parsed.is_empty() {
            self.values.push(Value::Parameter(Box::new(Parameter::default())));
        } else {
            self.values = parsed;
        }
        self
    }

    pub fn build(self) -> Result<ParameterNode, ProtocolError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let value_type = common_type(&self.values);
        if !self.values.is_empty() && value_type == Datatype::Undefined {
            return Err(ProtocolError::Validation(
                "inconsistent value types".into(),
            ));
        }

        let node = match value_type {
            Datatype::ParameterSet => {
                let multiplicity = match self.multiplicity {
                    Some(m) => Some(m),
                    None if self.values.len() > 1 => Some(self.values.len() as i32),
                    None => None,
                };
                ParameterNode::Set(ParameterSet {
                    name: self.name,
                    multiplicity,
                    values: self.values,
                })
            }
            Datatype::Parameter => ParameterNode::Set(ParameterSet {
                name: self.name,
                multiplicity: self.multiplicity,
                values: self.values,
            }),
            _ => {
                let multiplicity = match self.multiplicity {
                    Some(m) => Some(m),
                    None if self.values.len() > 1 => Some(self.values.len() as i32),
                    None => None,
                };
                ParameterNode::Parameter(Parameter {
                    name: self.name,
                    multiplicity,
                    values: self.values,
                })
            }
        };

        node.validate()?;
        Ok(node)
    }
}
