use crate::error::ProtocolError;
use crate::message::*;
use crate::parameter::{Parameter, ParameterNode, ParameterSet};
use crate::time::GemsTime;
use crate::types::{ConnectionType, Datatype, DisconnectReason, GemsResult, MessageKind, ResultCode};
use crate::value::{HexValue, Value};
use crate::GEMS_VERSION;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

type XmlReader<'a> = Reader<&'a [u8]>;

/// Decode one GEMS-XML document into a message.
///
/// The root element's local name selects the variant; elements are matched
/// by local name throughout, so both prefixed and default-namespace
/// documents decode.
pub fn decode_message(data: &[u8]) -> Result<Message, ProtocolError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ProtocolError::malformed("GEMS-XML document is not valid UTF-8"))?;
    let mut reader = Reader::from_reader(text.as_bytes());

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let e = e.into_owned();
                return parse_message(&mut reader, &e, false);
            }
            Event::Empty(e) => {
                let e = e.into_owned();
                return parse_message(&mut reader, &e, true);
            }
            Event::Eof => return Err(ProtocolError::malformed("missing message element")),
            _ => continue,
        }
    }
}

/// Decode a standalone `<Parameter>` or `<ParameterSet>` document.
pub fn decode_parameter(data: &[u8]) -> Result<ParameterNode, ProtocolError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ProtocolError::malformed("GEMS-XML document is not valid UTF-8"))?;
    let mut reader = Reader::from_reader(text.as_bytes());

    loop {
        let (e, empty) = match reader.read_event()? {
            Event::Start(e) => (e.into_owned(), false),
            Event::Empty(e) => (e.into_owned(), true),
            Event::Eof => return Err(ProtocolError::malformed("missing parameter element")),
            _ => continue,
        };
        return match local(&e) {
            b"Parameter" => Ok(ParameterNode::Parameter(parse_leaf(&mut reader, &e, empty)?)),
            b"ParameterSet" => Ok(ParameterNode::Set(parse_set(&mut reader, &e, empty)?)),
            other => Err(ProtocolError::malformed(format!(
                "unknown parameter element '{}'",
                String::from_utf8_lossy(other)
            ))),
        };
    }
}

fn local<'a>(e: &'a BytesStart<'_>) -> &'a [u8] {
    e.local_name().into_inner()
}

fn parse_message(
    reader: &mut XmlReader<'_>,
    start: &BytesStart<'static>,
    empty: bool,
) -> Result<Message, ProtocolError> {
    let root = String::from_utf8_lossy(local(start)).into_owned();
    let kind = MessageKind::from_xml_name(&root);
    if kind == MessageKind::Undefined {
        return Err(ProtocolError::malformed(format!(
            "unknown message element '{root}'"
        )));
    }

    let header = parse_header_attrs(start)?;
    let mut body = Body::default();
    if !empty {
        parse_body(reader, &root, &mut body)?;
    }

    body.into_message(kind, header)
}

fn parse_header_attrs(start: &BytesStart<'_>) -> Result<MessageHeader, ProtocolError> {
    let mut header = MessageHeader::default();
    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.local_name().into_inner() {
            b"gems_version" => {
                if value != GEMS_VERSION {
                    return Err(ProtocolError::malformed(format!(
                        "incorrect gems version '{value}'"
                    )));
                }
            }
            b"target" => header.target = value.into_owned(),
            b"token" => header.token = value.into_owned(),
            b"timestamp" => header.timestamp = GemsTime::from_time_str(&value)?,
            b"transaction_id" => header.transaction_id = value.parse().ok(),
            _ => {}
        }
    }
    Ok(header)
}

/// Accumulated body content, shared by every message kind.
#[derive(Default)]
struct Body {
    result: GemsResult,
    connection_type: Option<ConnectionType>,
    reason: DisconnectReason,
    config_name: String,
    directive_name: String,
    count: i32,
    parameters: Vec<ParameterNode>,
    configurations: Vec<String>,
    arguments: Vec<ParameterNode>,
    return_values: Vec<ParameterNode>,
}

impl Body {
    fn into_message(self, kind: MessageKind, header: MessageHeader) -> Result<Message, ProtocolError> {
        let msg = match kind {
            MessageKind::Connect => {
                let connection_type = self.connection_type.ok_or_else(|| {
                    ProtocolError::malformed("ConnectionRequestMessage missing connection type")
                })?;
                Message::Connect(ConnectMessage {
                    header,
                    connection_type,
                })
            }
            MessageKind::ConnectResponse => Message::ConnectResponse(ConnectResponse {
                header,
                result: self.result,
            }),
            MessageKind::Disconnect => Message::Disconnect(DisconnectMessage {
                header,
                reason: self.reason,
            }),
            MessageKind::Ping => Message::Ping(PingMessage { header }),
            MessageKind::PingResponse => Message::PingResponse(PingResponse {
                header,
                result: self.result,
            }),
            MessageKind::GetConfig => Message::GetConfig(GetConfigMessage {
                header,
                desired_parameters: self
                    .parameters
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect(),
            }),
            MessageKind::GetConfigResponse => Message::GetConfigResponse(GetConfigResponse {
                header,
                result: self.result,
                parameters: self.parameters,
            }),
            MessageKind::SetConfig => Message::SetConfig(SetConfigMessage {
                header,
                parameters: self.parameters,
            }),
            MessageKind::SetConfigResponse => Message::SetConfigResponse(SetConfigResponse {
                header,
                result: self.result,
                parameters_set: self.count,
            }),
            MessageKind::GetConfigList => Message::GetConfigList(GetConfigListMessage { header }),
            MessageKind::GetConfigListResponse => {
                Message::GetConfigListResponse(GetConfigListResponse {
                    header,
                    result: self.result,
                    configurations: self.configurations,
                })
            }
            MessageKind::LoadConfig => Message::LoadConfig(LoadConfigMessage {
                header,
                config_name: self.config_name,
            }),
            MessageKind::LoadConfigResponse => Message::LoadConfigResponse(LoadConfigResponse {
                header,
                result: self.result,
                parameters_loaded: self.count,
            }),
            MessageKind::SaveConfig => Message::SaveConfig(SaveConfigMessage {
                header,
                config_name: self.config_name,
            }),
            MessageKind::SaveConfigResponse => Message::SaveConfigResponse(SaveConfigResponse {
                header,
                result: self.result,
                parameters_saved: self.count,
            }),
            MessageKind::Directive => Message::Directive(DirectiveMessage {
                header,
                directive_name: self.directive_name,
                arguments: self.arguments,
            }),
            MessageKind::DirectiveResponse => Message::DirectiveResponse(DirectiveResponse {
                header,
                result: self.result,
                directive_name: self.directive_name,
                return_values: self.return_values,
            }),
            MessageKind::AsyncStatus => Message::AsyncStatus(AsyncStatusMessage {
                header,
                result: self.result,
                parameters: self.parameters,
            }),
            MessageKind::UnknownResponse => Message::UnknownResponse(UnknownResponse {
                header,
                result: self.result,
            }),
            MessageKind::Undefined => unreachable!("rejected before body parsing"),
        };
        Ok(msg)
    }
}

fn parse_body(
    reader: &mut XmlReader<'_>,
    root: &str,
    body: &mut Body,
) -> Result<(), ProtocolError> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let e = e.into_owned();
                handle_child(reader, &e, false, body)?;
            }
            Event::Empty(e) => {
                let e = e.into_owned();
                handle_child(reader, &e, true, body)?;
            }
            Event::End(e) if e.local_name().into_inner() == root.as_bytes() => break,
            Event::Eof => {
                return Err(ProtocolError::malformed("unexpected end of XML document"))
            }
            _ => continue,
        }
    }
    Ok(())
}

fn handle_child(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'static>,
    empty: bool,
    body: &mut Body,
) -> Result<(), ProtocolError> {
    match local(e) {
        b"Result" => {
            body.result.code = ResultCode::from_str_lossy(&read_text(reader, e, empty)?);
        }
        b"description" => {
            body.result.description = read_text(reader, e, empty)?;
        }
        b"type" => {
            let text = read_text(reader, e, empty)?;
            body.connection_type = Some(ConnectionType::from_wire(&text).ok_or_else(|| {
                ProtocolError::unmarshal(text.as_bytes(), "invalid connection type")
            })?);
        }
        b"reason" => {
            body.reason = DisconnectReason::from_wire(&read_text(reader, e, empty)?);
        }
        b"name" => {
            body.config_name = read_text(reader, e, empty)?;
        }
        b"directive_name" => {
            body.directive_name = read_text(reader, e, empty)?;
        }
        b"parameters_set" | b"parameters_loaded" | b"parameters_saved" => {
            let text = read_text(reader, e, empty)?;
            body.count = text
                .trim()
                .parse()
                .map_err(|_| ProtocolError::unmarshal(text.as_bytes(), "invalid parameter count"))?;
        }
        b"ConfigurationName" => {
            body.configurations.push(read_text(reader, e, empty)?);
        }
        b"arguments" => {
            body.arguments = parse_wrapped(reader, e, empty)?;
        }
        b"return_values" => {
            body.return_values = parse_wrapped(reader, e, empty)?;
        }
        b"Parameter" => {
            body.parameters
                .push(ParameterNode::Parameter(parse_leaf(reader, e, empty)?));
        }
        b"ParameterSet" => {
            body.parameters
                .push(ParameterNode::Set(parse_set(reader, e, empty)?));
        }
        _ => skip_element(reader, e, empty)?,
    }
    Ok(())
}

fn skip_element(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<(), ProtocolError> {
    if !empty {
        reader.read_to_end(e.name())?;
    }
    Ok(())
}

/// Collect the text content of the element opened by `e`.
fn read_text(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'_>,
    empty: bool,
) -> Result<String, ProtocolError> {
    if empty {
        return Ok(String::new());
    }

    let end = local(e).to_vec();
    let mut out = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => out.push_str(&t.unescape()?),
            Event::CData(t) => out.push_str(&String::from_utf8_lossy(&t.into_inner())),
            Event::End(closing) if closing.local_name().into_inner() == end.as_slice() => break,
            Event::Start(nested) => {
                let nested = nested.into_owned();
                reader.read_to_end(nested.name())?;
            }
            Event::Eof => return Err(ProtocolError::malformed("unexpected end of XML document")),
            _ => continue,
        }
    }
    Ok(out)
}

fn parse_wrapped(
    reader: &mut XmlReader<'_>,
    wrapper: &BytesStart<'_>,
    empty: bool,
) -> Result<Vec<ParameterNode>, ProtocolError> {
    let mut params = Vec::new();
    if empty {
        return Ok(params);
    }

    let end = local(wrapper).to_vec();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let e = e.into_owned();
                push_node(reader, &e, false, &mut params)?;
            }
            Event::Empty(e) => {
                let e = e.into_owned();
                push_node(reader, &e, true, &mut params)?;
            }
            Event::End(e) if e.local_name().into_inner() == end.as_slice() => break,
            Event::Eof => return Err(ProtocolError::malformed("unexpected end of XML document")),
            _ => continue,
        }
    }
    Ok(params)
}

fn push_node(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'static>,
    empty: bool,
    out: &mut Vec<ParameterNode>,
) -> Result<(), ProtocolError> {
    match local(e) {
        b"Parameter" => out.push(ParameterNode::Parameter(parse_leaf(reader, e, empty)?)),
        b"ParameterSet" => out.push(ParameterNode::Set(parse_set(reader, e, empty)?)),
        _ => skip_element(reader, e, empty)?,
    }
    Ok(())
}

/// The `name`/`multiplicity` attribute pair shared by `Parameter` and
/// `ParameterSet`. The `type` attribute is accepted and ignored.
fn parse_node_attrs(e: &BytesStart<'_>) -> Result<(String, Option<i32>), ProtocolError> {
    let mut name = String::new();
    let mut multiplicity = None;
    for attr in e.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?;
        match attr.key.local_name().into_inner() {
            b"name" => name = value.into_owned(),
            b"multiplicity" => multiplicity = value.parse().ok(),
            _ => {}
        }
    }
    Ok((name, multiplicity))
}

fn parse_leaf(
    reader: &mut XmlReader<'_>,
    start: &BytesStart<'static>,
    empty: bool,
) -> Result<Parameter, ProtocolError> {
    let (name, multiplicity) = parse_node_attrs(start)?;
    let mut p = Parameter {
        name,
        multiplicity,
        values: Vec::new(),
    };
    if empty {
        return Ok(p);
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let e = e.into_owned();
                if let Some(v) = parse_value(reader, &e, false)? {
                    p.values.push(v);
                }
            }
            Event::Empty(e) => {
                let e = e.into_owned();
                if let Some(v) = parse_value(reader, &e, true)? {
                    p.values.push(v);
                }
            }
            Event::End(e) if e.local_name().into_inner() == b"Parameter" => break,
            Event::Eof => return Err(ProtocolError::malformed("unexpected end of XML document")),
            _ => continue,
        }
    }
    Ok(p)
}

fn parse_set(
    reader: &mut XmlReader<'_>,
    start: &BytesStart<'static>,
    empty: bool,
) -> Result<ParameterSet, ProtocolError> {
    let (name, multiplicity) = parse_node_attrs(start)?;
    let mut set = ParameterSet {
        name,
        multiplicity,
        values: Vec::new(),
    };
    if empty {
        return Ok(set);
    }

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let e = e.into_owned();
                if let Some(v) = parse_value(reader, &e, false)? {
                    set.values.push(v);
                }
            }
            Event::Empty(e) => {
                let e = e.into_owned();
                if let Some(v) = parse_value(reader, &e, true)? {
                    set.values.push(v);
                }
            }
            Event::End(e) if e.local_name().into_inner() == b"ParameterSet" => break,
            Event::Eof => return Err(ProtocolError::malformed("unexpected end of XML document")),
            _ => continue,
        }
    }
    Ok(set)
}

/// Parse one value element inside a parameter or set. Unknown element names
/// are skipped and yield `None`.
fn parse_value(
    reader: &mut XmlReader<'_>,
    e: &BytesStart<'static>,
    empty: bool,
) -> Result<Option<Value>, ProtocolError> {
    match local(e) {
        b"Parameter" => {
            return Ok(Some(Value::Parameter(Box::new(parse_leaf(
                reader, e, empty,
            )?))))
        }
        b"ParameterSet" => {
            return Ok(Some(Value::Set(Box::new(parse_set(reader, e, empty)?))))
        }
        _ => {}
    }

    let datatype = Datatype::from_xml_name(&String::from_utf8_lossy(local(e)));
    if datatype == Datatype::Undefined {
        skip_element(reader, e, empty)?;
        return Ok(None);
    }

    if datatype == Datatype::HexValue {
        let mut bit_length: u32 = 0;
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.local_name().into_inner() == b"bit_length" {
                let value = attr.unescape_value()?;
                bit_length = value.parse().map_err(|_| {
                    ProtocolError::unmarshal(value.as_bytes(), "invalid bit_length value")
                })?;
            }
        }
        let text = read_text(reader, e, empty)?;
        if bit_length == 0 || text.is_empty() {
            return Ok(Some(Value::Empty(Datatype::HexValue)));
        }
        let data = hex::decode(text.trim())
            .map_err(|_| ProtocolError::unmarshal(text.as_bytes(), "invalid hexadecimal characters"))?;
        return Ok(Some(Value::Hex(HexValue { data, bit_length })));
    }

    let text = read_text(reader, e, empty)?;
    if text.is_empty() {
        return Ok(Some(Value::Empty(datatype)));
    }
    if datatype == Datatype::String {
        return Ok(Some(Value::String(text)));
    }
    Ok(Some(Value::from_text(datatype, &text)?))
}
