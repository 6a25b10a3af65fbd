mod builder;

pub use builder::MessageBuilder;

use crate::parameter::ParameterNode;
use crate::time::GemsTime;
use crate::types::{ConnectionType, DisconnectReason, GemsResult, MessageKind};
use crate::GEMS_VERSION;
use serde_json::{json, Map, Value as JsonValue};

/// The header fields shared by every GEMS message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageHeader {
    /// Client-assigned correlation id, echoed by the server.
    pub transaction_id: Option<i64>,
    /// Opaque session credential.
    pub token: String,
    pub timestamp: GemsTime,
    /// Path of the addressed device, e.g. `System/Device1`.
    pub target: String,
}

impl MessageHeader {
    /// Protocol version of messages produced by this crate.
    pub fn version(&self) -> &'static str {
        GEMS_VERSION
    }

    /// Transaction correlation: a request without an id matches anything; a
    /// response without one matches nothing else.
    pub fn transaction_match(&self, request_id: Option<i64>) -> bool {
        match (request_id, self.transaction_id) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(req), Some(own)) => req == own,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectMessage {
    pub header: MessageHeader,
    pub connection_type: ConnectionType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisconnectMessage {
    pub header: MessageHeader,
    pub reason: DisconnectReason,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PingMessage {
    pub header: MessageHeader,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PingResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetConfigMessage {
    pub header: MessageHeader,
    /// Names of the desired parameters; empty requests the full
    /// configuration.
    pub desired_parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetConfigResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
    pub parameters: Vec<ParameterNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetConfigMessage {
    pub header: MessageHeader,
    pub parameters: Vec<ParameterNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetConfigResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
    pub parameters_set: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetConfigListMessage {
    pub header: MessageHeader,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GetConfigListResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
    pub configurations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadConfigMessage {
    pub header: MessageHeader,
    pub config_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadConfigResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
    pub parameters_loaded: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveConfigMessage {
    pub header: MessageHeader,
    pub config_name: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveConfigResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
    pub parameters_saved: i32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectiveMessage {
    pub header: MessageHeader,
    pub directive_name: String,
    pub arguments: Vec<ParameterNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectiveResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
    pub directive_name: String,
    pub return_values: Vec<ParameterNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AsyncStatusMessage {
    pub header: MessageHeader,
    pub result: GemsResult,
    pub parameters: Vec<ParameterNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnknownResponse {
    pub header: MessageHeader,
    pub result: GemsResult,
}

/// One GEMS message of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Connect(ConnectMessage),
    ConnectResponse(ConnectResponse),
    Disconnect(DisconnectMessage),
    Ping(PingMessage),
    PingResponse(PingResponse),
    GetConfig(GetConfigMessage),
    GetConfigResponse(GetConfigResponse),
    SetConfig(SetConfigMessage),
    SetConfigResponse(SetConfigResponse),
    GetConfigList(GetConfigListMessage),
    GetConfigListResponse(GetConfigListResponse),
    LoadConfig(LoadConfigMessage),
    LoadConfigResponse(LoadConfigResponse),
    SaveConfig(SaveConfigMessage),
    SaveConfigResponse(SaveConfigResponse),
    Directive(DirectiveMessage),
    DirectiveResponse(DirectiveResponse),
    AsyncStatus(AsyncStatusMessage),
    UnknownResponse(UnknownResponse),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Connect(_) => MessageKind::Connect,
            Message::ConnectResponse(_) => MessageKind::ConnectResponse,
            Message::Disconnect(_) => MessageKind::Disconnect,
            Message::Ping(_) => MessageKind::Ping,
            Message::PingResponse(_) => MessageKind::PingResponse,
            Message::GetConfig(_) => MessageKind::GetConfig,
            Message::GetConfigResponse(_) => MessageKind::GetConfigResponse,
            Message::SetConfig(_) => MessageKind::SetConfig,
            Message::SetConfigResponse(_) => MessageKind::SetConfigResponse,
            Message::GetConfigList(_) => MessageKind::GetConfigList,
            Message::GetConfigListResponse(_) => MessageKind::GetConfigListResponse,
            Message::LoadConfig(_) => MessageKind::LoadConfig,
            Message::LoadConfigResponse(_) => MessageKind::LoadConfigResponse,
            Message::SaveConfig(_) => MessageKind::SaveConfig,
            Message::SaveConfigResponse(_) => MessageKind::SaveConfigResponse,
            Message::Directive(_) => MessageKind::Directive,
            Message::DirectiveResponse(_) => MessageKind::DirectiveResponse,
            Message::AsyncStatus(_) => MessageKind::AsyncStatus,
            Message::UnknownResponse(_) => MessageKind::UnknownResponse,
        }
    }

    pub fn header(&self) -> &MessageHeader {
        match self {
            Message::Connect(m) => &m.header,
            Message::ConnectResponse(m) => &m.header,
            Message::Disconnect(m) => &m.header,
            Message::Ping(m) => &m.header,
            Message::PingResponse(m) => &m.header,
            Message::GetConfig(m) => &m.header,
            Message::GetConfigResponse(m) => &m.header,
            Message::SetConfig(m) => &m.header,
            Message::SetConfigResponse(m) => &m.header,
            Message::GetConfigList(m) => &m.header,
            Message::GetConfigListResponse(m) => &m.header,
            Message::LoadConfig(m) => &m.header,
            Message::LoadConfigResponse(m) => &m.header,
            Message::SaveConfig(m) => &m.header,
            Message::SaveConfigResponse(m) => &m.header,
            Message::Directive(m) => &m.header,
            Message::DirectiveResponse(m) => &m.header,
            Message::AsyncStatus(m) => &m.header,
            Message::UnknownResponse(m) => &m.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut MessageHeader {
        match self {
            Message::Connect(m) => &mut m.header,
            Message::ConnectResponse(m) => &mut m.header,
            Message::Disconnect(m) => &mut m.header,
            Message::Ping(m) => &mut m.header,
            Message::PingResponse(m) => &mut m.header,
            Message::GetConfig(m) => &mut m.header,
            Message::GetConfigResponse(m) => &mut m.header,
            Message::SetConfig(m) => &mut m.header,
            Message::SetConfigResponse(m) => &mut m.header,
            Message::GetConfigList(m) => &mut m.header,
            Message::GetConfigListResponse(m) => &mut m.header,
            Message::LoadConfig(m) => &mut m.header,
            Message::LoadConfigResponse(m) => &mut m.header,
            Message::SaveConfig(m) => &mut m.header,
            Message::SaveConfigResponse(m) => &mut m.header,
            Message::Directive(m) => &mut m.header,
            Message::DirectiveResponse(m) => &mut m.header,
            Message::AsyncStatus(m) => &mut m.header,
            Message::UnknownResponse(m) => &mut m.header,
        }
    }

    /// The response result, if this kind carries one.
    pub fn result(&self) -> Option<&GemsResult> {
        match self {
            Message::ConnectResponse(m) => Some(&m.result),
            Message::PingResponse(m) => Some(&m.result),
            Message::GetConfigResponse(m) => Some(&m.result),
            Message::SetConfigResponse(m) => Some(&m.result),
            Message::GetConfigListResponse(m) => Some(&m.result),
            Message::LoadConfigResponse(m) => Some(&m.result),
            Message::SaveConfigResponse(m) => Some(&m.result),
            Message::DirectiveResponse(m) => Some(&m.result),
            Message::AsyncStatus(m) => Some(&m.result),
            Message::UnknownResponse(m) => Some(&m.result),
            _ => None,
        }
    }

    pub fn is_response(&self) -> bool {
        self.kind().is_response()
    }

    pub fn transaction_id(&self) -> Option<i64> {
        self.header().transaction_id
    }

    /// See [`MessageHeader::transaction_match`].
    pub fn transaction_match(&self, request_id: Option<i64>) -> bool {
        self.header().transaction_match(request_id)
    }

    /// A JSON view of the variant-specific fields, used by formatters and
    /// request logging.
    pub fn body(&self) -> JsonValue {
        let mut body = Map::new();
        if let Some(result) = self.result() {
            body.insert("result_code".into(), json!(result.code.as_str()));
            if !result.description.is_empty() {
                body.insert("result_description".into(), json!(result.description));
            }
        }

        let params_json = |params: &[ParameterNode]| -> JsonValue {
            JsonValue::Array(params.iter().map(|p| json!(p.to_string())).collect())
        };

        match self {
            Message::Connect(m) => {
                body.insert("connection_type".into(), json!(m.connection_type.as_str()));
            }
            Message::Disconnect(m) => {
                body.insert("reason".into(), json!(m.reason.as_str()));
            }
            Message::GetConfig(m) => {
                body.insert("desired_parameters".into(), json!(m.desired_parameters));
            }
            Message::GetConfigResponse(m) => {
                body.insert("parameters".into(), params_json(&m.parameters));
            }
            Message::SetConfig(m) => {
                body.insert("parameters".into(), params_json(&m.parameters));
            }
            Message::SetConfigResponse(m) => {
                body.insert("parameters_set".into(), json!(m.parameters_set));
            }
            Message::GetConfigListResponse(m) => {
                body.insert("configurations".into(), json!(m.configurations));
            }
            Message::LoadConfig(m) => {
                body.insert("config_name".into(), json!(m.config_name));
            }
            Message::LoadConfigResponse(m) => {
                body.insert("parameters_loaded".into(), json!(m.parameters_loaded));
            }
            Message::SaveConfig(m) => {
                body.insert("config_name".into(), json!(m.config_name));
            }
            Message::SaveConfigResponse(m) => {
                body.insert("parameters_saved".into(), json!(m.parameters_saved));
            }
            Message::Directive(m) => {
                body.insert("directive_name".into(), json!(m.directive_name));
                body.insert("arguments".into(), params_json(&m.arguments));
            }
            Message::DirectiveResponse(m) => {
                body.insert("directive_name".into(), json!(m.directive_name));
                body.insert("return_values".into(), params_json(&m.return_values));
            }
            Message::AsyncStatus(m) => {
                body.insert("parameters".into(), params_json(&m.parameters));
            }
            Message::Ping(_)
            | Message::PingResponse(_)
            | Message::GetConfigList(_)
            | Message::ConnectResponse(_)
            | Message::UnknownResponse(_) => {}
        }

        JsonValue::Object(body)
    }
}
