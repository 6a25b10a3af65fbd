use super::NAMESPACE;
use crate::error::ProtocolError;
use crate::message::*;
use crate::parameter::{Parameter, ParameterNode, ParameterSet};
use crate::types::{Datatype, GemsResult, ResultCode};
use crate::value::Value;
use crate::GEMS_VERSION;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

type XmlWriter = Writer<Vec<u8>>;

/// Encode a message into its GEMS-XML document form.
pub fn encode_message(msg: &Message) -> Result<String, ProtocolError> {
    let mut w = Writer::new(Vec::new());
    let root = msg.kind().xml_name();

    let mut start = BytesStart::new(root);
    start.push_attribute(("xmlns", NAMESPACE));
    start.push_attribute(("gems_version", GEMS_VERSION));
    let header = msg.header();
    if !header.token.is_empty() {
        start.push_attribute(("token", header.token.as_str()));
    }
    if !header.target.is_empty() {
        start.push_attribute(("target", header.target.as_str()));
    }
    if let Some(id) = header.transaction_id {
        start.push_attribute(("transaction_id", id.to_string().as_str()));
    }
    if !header.timestamp.is_zero() {
        start.push_attribute(("timestamp", header.timestamp.format_attr().as_str()));
    }
    w.write_event(Event::Start(start))?;

    match msg {
        Message::Connect(m) => {
            write_text_element(&mut w, "type", m.connection_type.as_str())?;
        }
        Message::ConnectResponse(m) => write_result(&mut w, &m.result)?,
        Message::PingResponse(m) => write_result(&mut w, &m.result)?,
        Message::UnknownResponse(m) => write_result(&mut w, &m.result)?,
        Message::Disconnect(m) => {
            write_text_element(&mut w, "reason", m.reason.as_str())?;
        }
        Message::Ping(_) | Message::GetConfigList(_) => {}
        Message::GetConfig(m) => {
            for name in &m.desired_parameters {
                let mut p = ns_start("Parameter");
                p.push_attribute(("name", name.as_str()));
                w.write_event(Event::Start(p))?;
                w.write_event(Event::End(BytesEnd::new("Parameter")))?;
            }
        }
        Message::GetConfigResponse(m) => {
            write_result(&mut w, &m.result)?;
            for p in &m.parameters {
                write_node(&mut w, p, true)?;
            }
        }
        Message::AsyncStatus(m) => {
            write_result(&mut w, &m.result)?;
            for p in &m.parameters {
                write_node(&mut w, p, true)?;
            }
        }
        Message::SetConfig(m) => {
            for p in &m.parameters {
                write_node(&mut w, p, true)?;
            }
        }
        Message::SetConfigResponse(m) => {
            write_result(&mut w, &m.result)?;
            write_text_element(&mut w, "parameters_set", &m.parameters_set.to_string())?;
        }
        Message::GetConfigListResponse(m) => {
            write_result(&mut w, &m.result)?;
            for config in &m.configurations {
                write_text_element(&mut w, "ConfigurationName", config)?;
            }
        }
        Message::LoadConfig(m) => {
            write_text_element(&mut w, "name", &m.config_name)?;
        }
        Message::LoadConfigResponse(m) => {
            write_result(&mut w, &m.result)?;
            write_text_element(&mut w, "parameters_loaded", &m.parameters_loaded.to_string())?;
        }
        Message::SaveConfig(m) => {
            write_text_element(&mut w, "name", &m.config_name)?;
        }
        Message::SaveConfigResponse(m) => {
            write_result(&mut w, &m.result)?;
            write_text_element(&mut w, "parameters_saved", &m.parameters_saved.to_string())?;
        }
        Message::Directive(m) => {
            write_text_element(&mut w, "directive_name", &m.directive_name)?;
            write_wrapped_parameters(&mut w, "arguments", &m.arguments)?;
        }
        Message::DirectiveResponse(m) => {
            write_result(&mut w, &m.result)?;
            write_text_element(&mut w, "directive_name", &m.directive_name)?;
            write_wrapped_parameters(&mut w, "return_values", &m.return_values)?;
        }
    }

    w.write_event(Event::End(BytesEnd::new(root)))?;
    let bytes = w.into_inner();
    String::from_utf8(bytes)
        .map_err(|_| ProtocolError::Marshal("generated XML is not valid UTF-8".into()))
}

/// Encode a standalone parameter tree, outside a message.
pub fn encode_parameter(node: &ParameterNode) -> Result<String, ProtocolError> {
    let mut w = Writer::new(Vec::new());
    write_node(&mut w, node, true)?;
    let bytes = w.into_inner();
    String::from_utf8(bytes)
        .map_err(|_| ProtocolError::Marshal("generated XML is not valid UTF-8".into()))
}

fn ns_start(name: &str) -> BytesStart<'_> {
    let mut start = BytesStart::new(name);
    start.push_attribute(("xmlns", NAMESPACE));
    start
}

fn write_text_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<(), ProtocolError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    if !text.is_empty() {
        w.write_event(Event::Text(BytesText::new(text)))?;
    }
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `<Result>CODE</Result>` plus an optional `<description>`; an absent
/// description emits no element at all.
fn write_result(w: &mut XmlWriter, result: &GemsResult) -> Result<(), ProtocolError> {
    let code = if result.code == ResultCode::Undefined {
        ""
    } else {
        result.code.as_str()
    };
    write_text_element(w, "Result", code)?;
    if !result.description.is_empty() {
        write_text_element(w, "description", &result.description)?;
    }
    Ok(())
}

fn write_wrapped_parameters(
    w: &mut XmlWriter,
    wrapper: &str,
    params: &[ParameterNode],
) -> Result<(), ProtocolError> {
    if params.is_empty() {
        return Ok(());
    }
    w.write_event(Event::Start(BytesStart::new(wrapper)))?;
    for p in params {
        write_node(w, p, true)?;
    }
    w.write_event(Event::End(BytesEnd::new(wrapper)))?;
    Ok(())
}

/// Write one parameter or parameter set element.
///
/// `with_attrs` is cleared for parameter sets nested inside another set:
/// only the outermost set carries `name`, `type` and `multiplicity`.
fn write_node(w: &mut XmlWriter, node: &ParameterNode, with_attrs: bool) -> Result<(), ProtocolError> {
    match node {
        ParameterNode::Parameter(p) => write_leaf(w, p, with_attrs),
        ParameterNode::Set(s) => write_set(w, s, with_attrs),
    }
}

fn node_attrs(start: &mut BytesStart<'_>, name: &str, multiplicity: Option<i32>) {
    if !name.is_empty() {
        start.push_attribute(("name", name));
    }
    if let Some(m) = multiplicity {
        start.push_attribute(("multiplicity", m.to_string().as_str()));
    }
}

fn write_leaf(w: &mut XmlWriter, p: &Parameter, with_attrs: bool) -> Result<(), ProtocolError> {
    let mut start = ns_start("Parameter");
    if with_attrs {
        node_attrs(&mut start, p.name(), p.multiplicity);
    }
    w.write_event(Event::Start(start))?;
    for v in &p.values {
        write_value(w, v)?;
    }
    w.write_event(Event::End(BytesEnd::new("Parameter")))?;
    Ok(())
}

fn write_set(w: &mut XmlWriter, s: &ParameterSet, with_attrs: bool) -> Result<(), ProtocolError> {
    let mut start = ns_start("ParameterSet");
    if with_attrs {
        node_attrs(&mut start, s.name(), s.multiplicity);
    }
    w.write_event(Event::Start(start))?;
    for v in &s.values {
        match v {
            Value::Parameter(p) => write_leaf(w, p, true)?,
            Value::Set(child) => write_set(w, child, false)?,
            other => write_value(w, other)?,
        }
    }
    w.write_event(Event::End(BytesEnd::new("ParameterSet")))?;
    Ok(())
}

fn write_value(w: &mut XmlWriter, v: &Value) -> Result<(), ProtocolError> {
    let datatype = v.datatype();
    let element = datatype.xml_name();

    match v {
        Value::Parameter(p) => return write_leaf(w, p, true),
        Value::Set(s) => return write_set(w, s, false),
        Value::Empty(Datatype::HexValue) => {
            // The empty hex form keeps its zero bit length and `0/0` body.
            let mut start = ns_start(element);
            start.push_attribute(("bit_length", "0"));
            w.write_event(Event::Start(start))?;
            w.write_event(Event::Text(BytesText::new("0/0")))?;
            w.write_event(Event::End(BytesEnd::new(element)))?;
            return Ok(());
        }
        Value::Empty(Datatype::Parameter) => {
            w.write_event(Event::Start(ns_start("Parameter")))?;
            w.write_event(Event::End(BytesEnd::new("Parameter")))?;
            return Ok(());
        }
        Value::Empty(Datatype::ParameterSet) => {
            w.write_event(Event::Start(ns_start("ParameterSet")))?;
            w.write_event(Event::End(BytesEnd::new("ParameterSet")))?;
            return Ok(());
        }
        Value::Hex(h) => {
            let mut start = ns_start(element);
            start.push_attribute(("bit_length", h.bit_length.to_string().as_str()));
            w.write_event(Event::Start(start))?;
            let text = h.hex_stream();
            if !text.is_empty() {
                w.write_event(Event::Text(BytesText::new(text.as_str())))?;
            }
            w.write_event(Event::End(BytesEnd::new(element)))?;
            return Ok(());
        }
        _ => {}
    }

    let start = ns_start(element);
    w.write_event(Event::Start(start))?;
    let text = v.text();
    if !text.is_empty() {
        w.write_event(Event::Text(BytesText::new(text.as_str())))?;
    }
    w.write_event(Event::End(BytesEnd::new(element)))?;
    Ok(())
}
