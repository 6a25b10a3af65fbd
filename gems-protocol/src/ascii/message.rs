//! GEMS-ASCII message framing and bodies.
//!
//! Frame layout:
//!
//! ```text
//! |GEMS|14|<length:10>|<transaction_id>|<token>|<timestamp>|<target>|<tag>|<body…>|END
//! ```
//!
//! The length field counts every byte of the frame including the leading `|`
//! and the trailing `END`, and is validated before any body parsing.

use super::parameter::{decode_parameter, write_parameter};
use super::{escape, unescape, AsciiWriter, FRAME_START};
use crate::error::ProtocolError;
use crate::message::*;
use crate::parameter::ParameterNode;
use crate::time::GemsTime;
use crate::types::{ConnectionType, DisconnectReason, GemsResult, MessageKind, ResultCode};
use crate::GEMS_ASCII_VERSION;

/// Byte count of `|GEMS|14|` plus the ten length digits and the delimiter
/// that follows them.
const FIXED_PREFIX_LEN: usize = 20;

/// Encode a message into one GEMS-ASCII frame.
pub fn encode_message(msg: &Message) -> Result<String, ProtocolError> {
    let mut content = AsciiWriter::new();
    write_body(&mut content, msg)?;

    let header = msg.header();
    let mut tail = String::new();
    if let Some(id) = header.transaction_id {
        tail.push_str(&id.to_string());
    }
    tail.push('|');
    tail.push_str(&header.token);
    tail.push('|');
    tail.push_str(&header.timestamp.format_time());
    tail.push('|');
    tail.push_str(&header.target);
    tail.push('|');
    tail.push_str(content.as_str());
    tail.push_str("END");

    let length = FIXED_PREFIX_LEN + tail.len();
    Ok(format!("{FRAME_START}|{GEMS_ASCII_VERSION}|{length:010}|{tail}"))
}

/// Write the type tag and variant body, each field followed by `|`.
fn write_body(w: &mut AsciiWriter, msg: &Message) -> Result<(), ProtocolError> {
    let tag = msg.kind().ascii_tag();
    match msg {
        Message::Connect(m) => {
            w.write_str(&format!("{tag}|{}|", m.connection_type));
        }
        Message::ConnectResponse(m) => write_result_body(w, tag, &m.result),
        Message::PingResponse(m) => write_result_body(w, tag, &m.result),
        Message::UnknownResponse(m) => write_result_body(w, tag, &m.result),
        Message::Disconnect(m) => {
            w.write_str(&format!("{tag}|{}|", m.reason));
        }
        Message::Ping(_) | Message::GetConfigList(_) => {
            w.write_str(&format!("{tag}|"));
        }
        Message::GetConfig(m) => {
            w.write_str(&format!("{tag}|"));
            if m.desired_parameters.is_empty() {
                // Canonical request-everything form: an empty count field.
                w.write_char('|');
                return Ok(());
            }
            w.write_str(&format!("{}|", m.desired_parameters.len()));
            for name in &m.desired_parameters {
                w.safe_write(&escape(name))?;
                w.write_char('|');
            }
        }
        Message::GetConfigResponse(m) => {
            write_result_body(w, tag, &m.result);
            write_parameter_list(w, &m.parameters)?;
        }
        Message::AsyncStatus(m) => {
            write_result_body(w, tag, &m.result);
            write_parameter_list(w, &m.parameters)?;
        }
        Message::SetConfig(m) => {
            w.write_str(&format!("{tag}|"));
            if m.parameters.is_empty() {
                return Err(ProtocolError::Marshal(
                    "cannot marshal empty SetConfigMessage".into(),
                ));
            }
            write_parameter_list(w, &m.parameters)?;
        }
        Message::SetConfigResponse(m) => {
            write_result_body(w, tag, &m.result);
            w.write_str(&format!("{}|", m.parameters_set));
        }
        Message::LoadConfigResponse(m) => {
            write_result_body(w, tag, &m.result);
            w.write_str(&format!("{}|", m.parameters_loaded));
        }
        Message::SaveConfigResponse(m) => {
            write_result_body(w, tag, &m.result);
            w.write_str(&format!("{}|", m.parameters_saved));
        }
        Message::GetConfigListResponse(m) => {
            write_result_body(w, tag, &m.result);
            w.write_str(&format!("{}|", m.configurations.len()));
            for config in &m.configurations {
                w.safe_write(&escape(config))?;
                w.write_char('|');
            }
        }
        Message::LoadConfig(m) => {
            w.write_str(&format!("{tag}|"));
            w.safe_write(&escape(&m.config_name))?;
            w.write_char('|');
        }
        Message::SaveConfig(m) => {
            w.write_str(&format!("{tag}|"));
            w.safe_write(&escape(&m.config_name))?;
            w.write_char('|');
        }
        Message::Directive(m) => {
            w.write_str(&format!("{tag}|"));
            w.safe_write(&escape(&m.directive_name))?;
            w.write_char('|');
            write_parameter_list(w, &m.arguments)?;
        }
        Message::DirectiveResponse(m) => {
            write_result_body(w, tag, &m.result);
            w.safe_write(&escape(&m.directive_name))?;
            w.write_char('|');
            write_parameter_list(w, &m.return_values)?;
        }
    }
    Ok(())
}

fn write_result_body(w: &mut AsciiWriter, tag: &str, result: &GemsResult) {
    w.write_str(&format!("{tag}|{}|{}|", result.code, result.description));
}

fn write_parameter_list(w: &mut AsciiWriter, params: &[ParameterNode]) -> Result<(), ProtocolError> {
    w.write_str(&format!("{}|", params.len()));
    for p in params {
        write_parameter(w, p)?;
        w.write_char('|');
    }
    Ok(())
}

/// Decode one GEMS-ASCII frame.
///
/// The frame structure (header, version, trailer, declared length) is
/// validated before the variant body is parsed; each variant then enforces
/// its minimum field count.
pub fn decode_message(data: &[u8]) -> Result<Message, ProtocolError> {
    let (header, kind, content) = parse_frame(data)?;

    let ensure = |min: usize| -> Result<(), ProtocolError> {
        if content.len() < min {
            Err(ProtocolError::malformed(format!(
                "incomplete {} message",
                kind.xml_name()
            )))
        } else {
            Ok(())
        }
    };
    let text = |field: &[u8]| String::from_utf8_lossy(field).into_owned();

    let msg = match kind {
        MessageKind::Connect => {
            ensure(1)?;
            let connection_type = ConnectionType::from_wire(&text(content[0])).ok_or_else(|| {
                ProtocolError::unmarshal(content[0], "invalid connection type")
            })?;
            Message::Connect(ConnectMessage {
                header,
                connection_type,
            })
        }
        MessageKind::ConnectResponse => {
            ensure(2)?;
            Message::ConnectResponse(ConnectResponse {
                header,
                result: parse_result(&content),
            })
        }
        MessageKind::PingResponse => {
            ensure(2)?;
            Message::PingResponse(PingResponse {
                header,
                result: parse_result(&content),
            })
        }
        MessageKind::UnknownResponse => {
            ensure(2)?;
            Message::UnknownResponse(UnknownResponse {
                header,
                result: parse_result(&content),
            })
        }
        MessageKind::Disconnect => {
            ensure(1)?;
            Message::Disconnect(DisconnectMessage {
                header,
                reason: DisconnectReason::from_wire(&text(content[0])),
            })
        }
        MessageKind::Ping => Message::Ping(PingMessage { header }),
        MessageKind::GetConfigList => Message::GetConfigList(GetConfigListMessage { header }),
        MessageKind::GetConfig => {
            ensure(1)?;
            let mut desired = Vec::new();
            if !content[0].is_empty() {
                let count: usize = text(content[0]).parse().map_err(|_| {
                    ProtocolError::unmarshal(content[0], "invalid number of parameters")
                })?;
                if count != content.len() - 1 {
                    return Err(ProtocolError::unmarshal(
                        content[0],
                        "invalid number of parameters",
                    ));
                }
                desired = content[1..].iter().map(|f| unescape(&text(f))).collect();
            }
            Message::GetConfig(GetConfigMessage {
                header,
                desired_parameters: desired,
            })
        }
        MessageKind::GetConfigResponse => {
            ensure(3)?;
            Message::GetConfigResponse(GetConfigResponse {
                header,
                result: parse_result(&content),
                parameters: parse_parameter_list(&content[2..])?,
            })
        }
        MessageKind::AsyncStatus => {
            ensure(3)?;
            Message::AsyncStatus(AsyncStatusMessage {
                header,
                result: parse_result(&content),
                parameters: parse_parameter_list(&content[2..])?,
            })
        }
        MessageKind::SetConfig => {
            ensure(1)?;
            Message::SetConfig(SetConfigMessage {
                header,
                parameters: parse_parameter_list(&content)?,
            })
        }
        MessageKind::SetConfigResponse => {
            ensure(3)?;
            Message::SetConfigResponse(SetConfigResponse {
                header,
                result: parse_result(&content),
                parameters_set: parse_count(content[2])?,
            })
        }
        MessageKind::LoadConfigResponse => {
            ensure(3)?;
            Message::LoadConfigResponse(LoadConfigResponse {
                header,
                result: parse_result(&content),
                parameters_loaded: parse_count(content[2])?,
            })
        }
        MessageKind::SaveConfigResponse => {
            ensure(3)?;
            Message::SaveConfigResponse(SaveConfigResponse {
                header,
                result: parse_result(&content),
                parameters_saved: parse_count(content[2])?,
            })
        }
        MessageKind::GetConfigListResponse => {
            ensure(3)?;
            let count: usize = text(content[2]).parse().map_err(|_| {
                ProtocolError::unmarshal(content[2], "invalid number of configurations")
            })?;
            if count != content.len() - 3 {
                return Err(ProtocolError::unmarshal(
                    content[2],
                    "invalid number of configurations",
                ));
            }
            Message::GetConfigListResponse(GetConfigListResponse {
                header,
                result: parse_result(&content),
                configurations: content[3..].iter().map(|f| unescape(&text(f))).collect(),
            })
        }
        MessageKind::LoadConfig => {
            ensure(1)?;
            Message::LoadConfig(LoadConfigMessage {
                header,
                config_name: unescape(&text(content[0])),
            })
        }
        MessageKind::SaveConfig => {
            ensure(1)?;
            Message::SaveConfig(SaveConfigMessage {
                header,
                config_name: unescape(&text(content[0])),
            })
        }
        MessageKind::Directive => {
            ensure(2)?;
            Message::Directive(DirectiveMessage {
                header,
                directive_name: unescape(&text(content[0])),
                arguments: parse_parameter_list(&content[1..])?,
            })
        }
        MessageKind::DirectiveResponse => {
            ensure(4)?;
            Message::DirectiveResponse(DirectiveResponse {
                header,
                result: parse_result(&content),
                directive_name: unescape(&text(content[2])),
                return_values: parse_parameter_list(&content[3..])?,
            })
        }
        MessageKind::Undefined => unreachable!("parse_frame rejects unknown tags"),
    };

    Ok(msg)
}

/// Validate the frame structure and split it into header, kind and body
/// fields.
fn parse_frame(data: &[u8]) -> Result<(MessageHeader, MessageKind, Vec<&[u8]>), ProtocolError> {
    if data.len() < 9 {
        return Err(ProtocolError::Framing(
            "incomplete GEMS-ASCII message".into(),
        ));
    }
    if &data[..5] != FRAME_START.as_bytes() {
        return Err(ProtocolError::Framing(format!(
            "unmarshal of '{}' failed, invalid start of message field",
            String::from_utf8_lossy(&data[..5])
        )));
    }
    let version = &data[6..8];
    if version != GEMS_ASCII_VERSION.as_bytes() {
        return Err(ProtocolError::Framing(format!(
            "incorrect gems version '{}'",
            String::from_utf8_lossy(version)
        )));
    }

    let fields: Vec<&[u8]> = data[9..].split(|b| *b == b'|').collect();
    if fields.len() < 7 {
        return Err(ProtocolError::Framing(
            "incomplete GEMS-ASCII message".into(),
        ));
    }
    if fields[fields.len() - 1] != b"END" {
        return Err(ProtocolError::Framing("missing message trailer".into()));
    }

    let declared: i64 = String::from_utf8_lossy(fields[0])
        .parse()
        .map_err(|_| ProtocolError::Framing("invalid message length".into()))?;
    if declared != data.len() as i64 {
        return Err(ProtocolError::Framing(
            "message length field does not match data length".into(),
        ));
    }

    let transaction_id = if fields[1].is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(fields[1]).parse::<i64>().map_err(|_| {
            ProtocolError::unmarshal(fields[1], "invalid Transaction ID number")
        })?)
    };
    let token = String::from_utf8_lossy(fields[2]).into_owned();
    let timestamp = GemsTime::from_time_str(&String::from_utf8_lossy(fields[3]))?;
    let target = String::from_utf8_lossy(fields[4]).into_owned();

    let tag = String::from_utf8_lossy(fields[5]);
    let kind = MessageKind::from_ascii_tag(&tag);
    if kind == MessageKind::Undefined {
        return Err(ProtocolError::unmarshal(
            fields[5],
            "invalid type tag for GEMS-ASCII message",
        ));
    }

    let header = MessageHeader {
        transaction_id,
        token,
        timestamp,
        target,
    };
    let content = fields[6..fields.len() - 1].to_vec();
    Ok((header, kind, content))
}

fn parse_result(content: &[&[u8]]) -> GemsResult {
    GemsResult {
        code: ResultCode::from_str_lossy(&String::from_utf8_lossy(content[0])),
        description: String::from_utf8_lossy(content[1]).into_owned(),
    }
}

fn parse_count(field: &[u8]) -> Result<i32, ProtocolError> {
    String::from_utf8_lossy(field)
        .parse()
        .map_err(|_| ProtocolError::unmarshal(field, "invalid parameter count"))
}

/// Parse a `count|param|param|…` run; the count must match exactly.
fn parse_parameter_list(fields: &[&[u8]]) -> Result<Vec<ParameterNode>, ProtocolError> {
    if fields.is_empty() {
        return Err(ProtocolError::malformed("invalid message content"));
    }

    let counted = String::from_utf8_lossy(fields[0]).parse::<usize>();
    match counted {
        Ok(count) if count == fields.len() - 1 => {}
        _ => {
            return Err(ProtocolError::unmarshal(
                fields[0],
                "invalid number of parameters",
            ))
        }
    }

    fields[1..].iter().map(|f| decode_parameter(f)).collect()
}
