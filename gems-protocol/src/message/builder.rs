use super::*;
use crate::error::ProtocolError;
use crate::parameter::ParameterNode;
use crate::time::GemsTime;
use crate::types::{ConnectionType, DisconnectReason, GemsResult, MessageKind, ResultCode};

/// Single-use builder for GEMS messages.
///
/// Setters accumulate optional fields; `build` validates and produces the
/// typed message. An unset timestamp defaults to the current wall clock.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    kind: MessageKind,
    header: MessageHeader,
    result: GemsResult,
    connection_type: ConnectionType,
    reason: DisconnectReason,
    config_name: String,
    config_list: Vec<String>,
    parameter_count: i32,
    directive_name: String,
    parameters: Vec<ParameterNode>,
    desired_parameters: Vec<String>,
    error: Option<ProtocolError>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        MessageBuilder::default()
    }

    pub fn kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.header.target = target.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.header.token = token.into();
        self
    }

    pub fn transaction_id(mut self, id: i64) -> Self {
        self.header.transaction_id = Some(id);
        self
    }

    pub fn timestamp(mut self, ts: GemsTime) -> Self {
        self.header.timestamp = ts;
        self
    }

    /// Timestamp from its `sec.nanos` wire form.
    pub fn timestamp_str(mut self, ts: &str) -> Self {
        match GemsTime::from_time_str(ts) {
            Ok(t) => self.header.timestamp = t,
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    /// Connection type for a `ConnectionRequestMessage`.
    pub fn connection_type(mut self, t: ConnectionType) -> Self {
        self.connection_type = t;
        self
    }

    /// Reason for a `DisconnectMessage`.
    pub fn disconnect_reason(mut self, r: DisconnectReason) -> Self {
        self.reason = r;
        self
    }

    /// Configuration name for `SaveConfigMessage` and `LoadConfigMessage`.
    pub fn configuration_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = name.into();
        self
    }

    /// Configuration names for a `GetConfigListResponse`.
    pub fn configuration_list<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_list = names.into_iter().map(Into::into).collect();
        self
    }

    /// Parameter count for `SetConfigResponse`, `SaveConfigResponse` and
    /// `LoadConfigResponse`.
    pub fn parameter_count(mut self, count: i32) -> Self {
        self.parameter_count = count;
        self
    }

    /// Directive name for `DirectiveMessage` and `DirectiveResponse`.
    pub fn directive(mut self, name: impl Into<String>) -> Self {
        self.directive_name = name.into();
        self
    }

    /// Parameters for `SetConfigMessage`, `GetConfigResponse`,
    /// `DirectiveMessage`, `DirectiveResponse` and `AsyncStatusMessage`.
    pub fn parameters<I: IntoIterator<Item = ParameterNode>>(mut self, params: I) -> Self {
        self.parameters.extend(params);
        self
    }

    /// Parameters given in their GEMS-ASCII wire form.
    pub fn ascii_parameters<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for p in params {
            match crate::ascii::decode_parameter(p.as_ref().as_bytes()) {
                Ok(node) => self.parameters.push(node),
                Err(e) => {
                    self.error.get_or_insert(e);
                }
            }
        }
        self
    }

    /// Desired parameter names for a `GetConfigMessage`.
    pub fn desired_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.desired_parameters = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn result(mut self, result: GemsResult) -> Self {
        self.result = result;
        self
    }

    /// Result code, required in all responses.
    pub fn result_code(mut self, code: ResultCode) -> Self {
        self.result.code = code;
        self
    }

    /// Optional free-text result description.
    pub fn response_description(mut self, description: impl Into<String>) -> Self {
        self.result.description = description.into();
        self
    }

    pub fn build(mut self) -> Result<Message, ProtocolError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.header.timestamp.is_zero() {
            self.header.timestamp = GemsTime::now();
        }

        let header = self.header;
        let msg = match self.kind {
            MessageKind::UnknownResponse => Message::UnknownResponse(UnknownResponse {
                header,
                result: self.result,
            }),
            MessageKind::Connect => Message::Connect(ConnectMessage {
                header,
                connection_type: self.connection_type,
            }),
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
                desired_parameters: self.desired_parameters,
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
                parameters_set: self.parameter_count,
            }),
            MessageKind::GetConfigList => Message::GetConfigList(GetConfigListMessage { header }),
            MessageKind::GetConfigListResponse => {
                Message::GetConfigListResponse(GetConfigListResponse {
                    header,
                    result: self.result,
                    configurations: self.config_list,
                })
            }
            MessageKind::LoadConfig => Message::LoadConfig(LoadConfigMessage {
                header,
                config_name: self.config_name,
            }),
            MessageKind::LoadConfigResponse => Message::LoadConfigResponse(LoadConfigResponse {
                header,
                result: self.result,
                parameters_loaded: self.parameter_count,
            }),
            MessageKind::SaveConfig => Message::SaveConfig(SaveConfigMessage {
                header,
                config_name: self.config_name,
            }),
            MessageKind::SaveConfigResponse => Message::SaveConfigResponse(SaveConfigResponse {
                header,
                result: self.result,
                parameters_saved: self.parameter_count,
            }),
            MessageKind::Directive => Message::Directive(DirectiveMessage {
                header,
                directive_name: self.directive_name,
                arguments: self.parameters,
            }),
            MessageKind::DirectiveResponse => Message::DirectiveResponse(DirectiveResponse {
                header,
                result: self.result,
                directive_name: self.directive_name,
                return_values: self.parameters,
            }),
            MessageKind::AsyncStatus => Message::AsyncStatus(AsyncStatusMessage {
                header,
                result: self.result,
                parameters: self.parameters,
            }),
            MessageKind::Undefined => {
                return Err(ProtocolError::Validation(format!(
                    "build not implemented for '{}'",
                    self.kind
                )))
            }
        };

        Ok(msg)
    }
}
