use std::fmt;

/// The message kinds defined by GEMS 1.4.
///
/// Each kind has two wire names: the XML element name and the ASCII type tag.
/// `Undefined` is the decode fallback for unrecognized tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageKind {
    #[default]
    Undefined,
    SetConfig,
    SetConfigResponse,
    GetConfig,
    GetConfigResponse,
    GetConfigList,
    GetConfigListResponse,
    LoadConfig,
    LoadConfigResponse,
    SaveConfig,
    SaveConfigResponse,
    Directive,
    DirectiveResponse,
    Ping,
    PingResponse,
    Connect,
    ConnectResponse,
    Disconnect,
    AsyncStatus,
    UnknownResponse,
}

impl MessageKind {
    /// The XML element name for this kind.
    pub fn xml_name(self) -> &'static str {
        match self {
            MessageKind::SetConfig => "SetConfigMessage",
            MessageKind::SetConfigResponse => "SetConfigResponse",
            MessageKind::GetConfig => "GetConfigMessage",
            MessageKind::GetConfigResponse => "GetConfigResponse",
            MessageKind::GetConfigList => "GetConfigListMessage",
            MessageKind::GetConfigListResponse => "GetConfigListResponse",
            MessageKind::LoadConfig => "LoadConfigMessage",
            MessageKind::LoadConfigResponse => "LoadConfigResponse",
            MessageKind::SaveConfig => "SaveConfigMessage",
            MessageKind::SaveConfigResponse => "SaveConfigResponse",
            MessageKind::Directive => "DirectiveMessage",
            MessageKind::DirectiveResponse => "DirectiveResponse",
            MessageKind::Ping => "PingMessage",
            MessageKind::PingResponse => "PingResponse",
            MessageKind::Connect => "ConnectionRequestMessage",
            MessageKind::ConnectResponse => "ConnectionRequestResponse",
            MessageKind::Disconnect => "DisconnectMessage",
            MessageKind::AsyncStatus => "AsyncStatusMessage",
            MessageKind::UnknownResponse => "UnknownResponse",
            MessageKind::Undefined => "undefined",
        }
    }

    /// The ASCII type tag for this kind.
    pub fn ascii_tag(self) -> &'static str {
        match self {
            MessageKind::SetConfig => "SET",
            MessageKind::SetConfigResponse => "SET-R",
            MessageKind::GetConfig => "GET",
            MessageKind::GetConfigResponse => "GET-R",
            MessageKind::GetConfigList => "GETL",
            MessageKind::GetConfigListResponse => "GETL-R",
            MessageKind::LoadConfig => "LOAD",
            MessageKind::LoadConfigResponse => "LOAD-R",
            MessageKind::SaveConfig => "SAVE",
            MessageKind::SaveConfigResponse => "SAVE-R",
            MessageKind::Directive => "DIR",
            MessageKind::DirectiveResponse => "DIR-R",
            MessageKind::Ping => "PING",
            MessageKind::PingResponse => "PING-R",
            MessageKind::Connect => "CON",
            MessageKind::ConnectResponse => "CON-R",
            MessageKind::Disconnect => "DISC",
            MessageKind::AsyncStatus => "ASYNC",
            MessageKind::UnknownResponse => "UKN-R",
            MessageKind::Undefined => "",
        }
    }

    /// Resolve an ASCII type tag.
    ///
    /// `DIS` is accepted as an alias of `DISC`, and `DIS-R`/`ERR-R` as
    /// aliases of `UKN-R`, matching frames seen from fielded devices.
    pub fn from_ascii_tag(tag: &str) -> Self {
        match tag {
            "SET" => MessageKind::SetConfig,
            "SET-R" => MessageKind::SetConfigResponse,
            "GET" => MessageKind::GetConfig,
            "GET-R" => MessageKind::GetConfigResponse,
            "GETL" => MessageKind::GetConfigList,
            "GETL-R" => MessageKind::GetConfigListResponse,
            "LOAD" => MessageKind::LoadConfig,
            "LOAD-R" => MessageKind::LoadConfigResponse,
            "SAVE" => MessageKind::SaveConfig,
            "SAVE-R" => MessageKind::SaveConfigResponse,
            "DIR" => MessageKind::Directive,
            "DIR-R" => MessageKind::DirectiveResponse,
            "PING" => MessageKind::Ping,
            "PING-R" => MessageKind::PingResponse,
            "CON" => MessageKind::Connect,
            "CON-R" => MessageKind::ConnectResponse,
            "DISC" | "DIS" => MessageKind::Disconnect,
            "ASYNC" => MessageKind::AsyncStatus,
            "UKN-R" | "ERR-R" | "DIS-R" => MessageKind::UnknownResponse,
            _ => MessageKind::Undefined,
        }
    }

    /// Resolve an XML element local name.
    pub fn from_xml_name(name: &str) -> Self {
        match name {
            "SetConfigMessage" => MessageKind::SetConfig,
            "SetConfigResponse" => MessageKind::SetConfigResponse,
            "GetConfigMessage" => MessageKind::GetConfig,
            "GetConfigResponse" => MessageKind::GetConfigResponse,
            "GetConfigListMessage" => MessageKind::GetConfigList,
            "GetConfigListResponse" => MessageKind::GetConfigListResponse,
            "LoadConfigMessage" => MessageKind::LoadConfig,
            "LoadConfigResponse" => MessageKind::LoadConfigResponse,
            "SaveConfigMessage" => MessageKind::SaveConfig,
            "SaveConfigResponse" => MessageKind::SaveConfigResponse,
            "DirectiveMessage" => MessageKind::Directive,
            "DirectiveResponse" => MessageKind::DirectiveResponse,
            "PingMessage" => MessageKind::Ping,
            "PingResponse" => MessageKind::PingResponse,
            "ConnectionRequestMessage" => MessageKind::Connect,
            "ConnectionRequestResponse" => MessageKind::ConnectResponse,
            "DisconnectMessage" => MessageKind::Disconnect,
            "AsyncStatusMessage" => MessageKind::AsyncStatus,
            "UnknownResponse" => MessageKind::UnknownResponse,
            _ => MessageKind::Undefined,
        }
    }

    /// True for the response-side kinds (those carrying a `Result`).
    pub fn is_response(self) -> bool {
        matches!(
            self,
            MessageKind::SetConfigResponse
                | MessageKind::GetConfigResponse
                | MessageKind::GetConfigListResponse
                | MessageKind::LoadConfigResponse
                | MessageKind::SaveConfigResponse
                | MessageKind::DirectiveResponse
                | MessageKind::PingResponse
                | MessageKind::ConnectResponse
                | MessageKind::AsyncStatus
                | MessageKind::UnknownResponse
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xml_name())
    }
}

/// Result codes carried by every GEMS response.
///
/// `Undefined` models the absent code: a response built without an explicit
/// code serializes an empty `<Result>` element / empty ASCII field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultCode {
    #[default]
    Undefined,
    Success,
    InvalidRange,
    InvalidParameter,
    InvalidState,
    InvalidVersion,
    InvalidTarget,
    ConflictingParameter,
    ConflictingValues,
    UnsupportedMessage,
    MalformedMessage,
    CommunicationError,
    InternalError,
    AccessDenied,
    Other,
}

impl ResultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Success => "SUCCESS",
            ResultCode::InvalidRange => "INVALID_RANGE",
            ResultCode::InvalidParameter => "INVALID_PARAMETER",
            ResultCode::InvalidState => "INVALID_STATE",
            ResultCode::InvalidVersion => "INVALID_VERSION",
            ResultCode::InvalidTarget => "INVALID_TARGET",
            ResultCode::ConflictingParameter => "CONFLICTING_PARAMETER",
            ResultCode::ConflictingValues => "CONFLICTING_VALUES",
            ResultCode::UnsupportedMessage => "UNSUPPORTED_MESSAGE",
            ResultCode::MalformedMessage => "MALFORMED_MESSAGE",
            ResultCode::CommunicationError => "COMMUNICATION_ERROR",
            ResultCode::InternalError => "INTERNAL_ERROR",
            ResultCode::AccessDenied => "ACCESS_DENIED",
            ResultCode::Other => "OTHER",
            ResultCode::Undefined => "",
        }
    }

    /// Resolve a wire-form code. Unknown codes map to `Undefined`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "SUCCESS" => ResultCode::Success,
            "INVALID_RANGE" => ResultCode::InvalidRange,
            "INVALID_PARAMETER" => ResultCode::InvalidParameter,
            "INVALID_STATE" => ResultCode::InvalidState,
            "INVALID_VERSION" => ResultCode::InvalidVersion,
            "INVALID_TARGET" => ResultCode::InvalidTarget,
            "CONFLICTING_PARAMETER" => ResultCode::ConflictingParameter,
            "CONFLICTING_VALUES" => ResultCode::ConflictingValues,
            "UNSUPPORTED_MESSAGE" => ResultCode::UnsupportedMessage,
            "MALFORMED_MESSAGE" => ResultCode::MalformedMessage,
            "COMMUNICATION_ERROR" => ResultCode::CommunicationError,
            "INTERNAL_ERROR" => ResultCode::InternalError,
            "ACCESS_DENIED" => ResultCode::AccessDenied,
            "OTHER" => ResultCode::Other,
            _ => ResultCode::Undefined,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result record carried by every response: a code plus an optional
/// free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GemsResult {
    pub code: ResultCode,
    pub description: String,
}

impl GemsResult {
    pub fn new(code: ResultCode, description: impl Into<String>) -> Self {
        GemsResult {
            code,
            description: description.into(),
        }
    }

    pub fn success() -> Self {
        GemsResult {
            code: ResultCode::Success,
            description: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == ResultCode::Success
    }
}

impl fmt::Display for GemsResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            f.write_str(self.code.as_str())
        } else {
            write!(f, "{}, {}", self.code, self.description)
        }
    }
}

/// Connection mode requested in a `ConnectionRequestMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionType {
    ControlOnly,
    StatusOnly,
    #[default]
    ControlAndStatus,
}

impl ConnectionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionType::ControlOnly => "CONTROL_ONLY",
            ConnectionType::StatusOnly => "STATUS_ONLY",
            ConnectionType::ControlAndStatus => "CONTROL_AND_STATUS",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "CONTROL_ONLY" => Some(ConnectionType::ControlOnly),
            "STATUS_ONLY" => Some(ConnectionType::StatusOnly),
            "CONTROL_AND_STATUS" => Some(ConnectionType::ControlAndStatus),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason carried by a `DisconnectMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectReason {
    #[default]
    NormalTermination,
    ControlLost,
    ServiceTerminated,
    Other,
}

impl DisconnectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DisconnectReason::NormalTermination => "NORMAL_TERMINATION",
            DisconnectReason::ControlLost => "CONTROL_LOST",
            DisconnectReason::ServiceTerminated => "SERVICE_TERMINATED",
            DisconnectReason::Other => "OTHER",
        }
    }

    /// Resolve a wire-form reason. Unrecognized values map to `Other`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "NORMAL_TERMINATION" => DisconnectReason::NormalTermination,
            "CONTROL_LOST" => DisconnectReason::ControlLost,
            "SERVICE_TERMINATED" => DisconnectReason::ServiceTerminated,
            _ => DisconnectReason::Other,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value kinds a GEMS parameter can hold.
///
/// Each datatype has an XML name and an ASCII name; for most kinds the two
/// coincide (`boolean` vs `bool` and `ParameterSet` vs `set_type` are the
/// exceptions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Undefined,
    String,
    Boolean,
    Byte,
    Ubyte,
    HexValue,
    Double,
    Long,
    Ulong,
    Int,
    Uint,
    Short,
    Ushort,
    Time,
    Utime,
    Parameter,
    ParameterSet,
}

impl Datatype {
    /// The XML element name of this datatype.
    pub fn xml_name(self) -> &'static str {
        match self {
            Datatype::String => "string",
            Datatype::Boolean => "boolean",
            Datatype::Byte => "byte",
            Datatype::Ubyte => "ubyte",
            Datatype::HexValue => "hex_value",
            Datatype::Double => "double",
            Datatype::Long => "long",
            Datatype::Ulong => "ulong",
            Datatype::Int => "int",
            Datatype::Uint => "uint",
            Datatype::Short => "short",
            Datatype::Ushort => "ushort",
            Datatype::Time => "time",
            Datatype::Utime => "utime",
            Datatype::Parameter => "Parameter",
            Datatype::ParameterSet => "ParameterSet",
            Datatype::Undefined => "undefined",
        }
    }

    /// The ASCII type name of this datatype.
    pub fn ascii_name(self) -> &'static str {
        match self {
            Datatype::Boolean => "bool",
            Datatype::ParameterSet => "set_type",
            other => other.xml_name(),
        }
    }

    /// Resolve an ASCII type name. `boolean` and `int64` are accepted as
    /// aliases for `bool` and `long`.
    pub fn from_ascii_name(s: &str) -> Self {
        match s {
            "string" => Datatype::String,
            "bool" | "boolean" => Datatype::Boolean,
            "byte" => Datatype::Byte,
            "ubyte" => Datatype::Ubyte,
            "hex_value" => Datatype::HexValue,
            "double" => Datatype::Double,
            "long" | "int64" => Datatype::Long,
            "ulong" => Datatype::Ulong,
            "int" => Datatype::Int,
            "uint" => Datatype::Uint,
            "short" => Datatype::Short,
            "ushort" => Datatype::Ushort,
            "time" => Datatype::Time,
            "utime" => Datatype::Utime,
            "set_type" => Datatype::ParameterSet,
            _ => Datatype::Undefined,
        }
    }

    /// Resolve an XML element local name.
    pub fn from_xml_name(s: &str) -> Self {
        match s {
            "string" => Datatype::String,
            "boolean" => Datatype::Boolean,
            "byte" => Datatype::Byte,
            "ubyte" => Datatype::Ubyte,
            "hex_value" => Datatype::HexValue,
            "double" => Datatype::Double,
            "long" => Datatype::Long,
            "ulong" => Datatype::Ulong,
            "int" => Datatype::Int,
            "uint" => Datatype::Uint,
            "short" => Datatype::Short,
            "ushort" => Datatype::Ushort,
            "time" => Datatype::Time,
            "utime" => Datatype::Utime,
            "Parameter" => Datatype::Parameter,
            "ParameterSet" => Datatype::ParameterSet,
            _ => Datatype::Undefined,
        }
    }

    /// True for `Parameter` and `ParameterSet`, the tree-node datatypes.
    pub fn is_node(self) -> bool {
        matches!(self, Datatype::Parameter | Datatype::ParameterSet)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xml_name())
    }
}
