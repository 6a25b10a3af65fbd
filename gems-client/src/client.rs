use crate::ascii::AsciiModule;
use crate::error::ClientError;
use crate::xml::XmlModule;
use async_trait::async_trait;
use gems_protocol::{
    ConnectionType, DisconnectReason, Message, MessageBuilder, MessageKind, ParameterNode,
};
use std::fmt;
use tracing::debug;

/// The two Platform Specific Modules a client can speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Psm {
    Ascii,
    Xml,
}

impl Psm {
    /// Case-insensitive parse of the `psm` configuration knob.
    pub fn parse(s: &str) -> Result<Self, ClientError> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(Psm::Ascii),
            "xml" => Ok(Psm::Xml),
            other => Err(ClientError::UnknownPsm(other.to_string())),
        }
    }
}

impl fmt::Display for Psm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Psm::Ascii => f.write_str("ascii"),
            Psm::Xml => f.write_str("xml"),
        }
    }
}

/// Transport options for the connection handshake.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ConnectOptions {
    pub tls: bool,
    pub insecure: bool,
}

/// The seam between the session logic and a PSM transport.
#[async_trait]
pub(crate) trait PlatformModule: Send {
    /// Establish the transport and deliver the connection request.
    async fn connect(
        &mut self,
        addr: &str,
        req: &Message,
        opts: &ConnectOptions,
    ) -> Result<Message, ClientError>;
    /// Deliver a request and wait for its matching response.
    async fn send(&mut self, msg: &Message) -> Result<Message, ClientError>;
    /// Deliver a message without waiting for a response.
    async fn post(&mut self, msg: &Message) -> Result<(), ClientError>;
    fn server_addr(&self) -> &str;
}

/// A GEMS client session.
///
/// Holds the connection state mandated by the protocol: the session token
/// (adopted from the server's connect response), the target path, and the
/// transaction-id counter. The counter starts at zero and increases after
/// every connect attempt and every send, so each outbound message carries a
/// fresh id.
pub struct GemsClient {
    psm: Psm,
    module: Box<dyn PlatformModule>,
    token: String,
    target: String,
    transaction_id: i64,
}

impl GemsClient {
    pub fn new(psm: Psm) -> Self {
        let module: Box<dyn PlatformModule> = match psm {
            Psm::Ascii => Box::new(AsciiModule::new()),
            Psm::Xml => Box::new(XmlModule::new()),
        };
        GemsClient {
            psm,
            module,
            token: String::new(),
            target: String::new(),
            transaction_id: 0,
        }
    }

    pub fn psm(&self) -> Psm {
        self.psm
    }

    /// Address of the connected server.
    pub fn server_addr(&self) -> &str {
        self.module.server_addr()
    }

    /// The current session token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The transaction id the next outbound message will carry.
    pub fn transaction_id(&self) -> i64 {
        self.transaction_id
    }

    /// Connect to `addr` over plain TCP/HTTP.
    ///
    /// `token` and `target` are optional; empty strings are passed through
    /// to the server as absent. On success the client adopts the token the
    /// server handed back.
    pub async fn connect(
        &mut self,
        addr: &str,
        connection_type: ConnectionType,
        token: &str,
        target: &str,
    ) -> Result<Message, ClientError> {
        self.connect_inner(addr, connection_type, token, target, ConnectOptions::default())
            .await
    }

    /// Connect over TLS. `insecure` accepts self-signed certificates.
    pub async fn connect_tls(
        &mut self,
        addr: &str,
        connection_type: ConnectionType,
        token: &str,
        target: &str,
        insecure: bool,
    ) -> Result<Message, ClientError> {
        let opts = ConnectOptions {
            tls: true,
            insecure,
        };
        self.connect_inner(addr, connection_type, token, target, opts)
            .await
    }

    async fn connect_inner(
        &mut self,
        addr: &str,
        connection_type: ConnectionType,
        token: &str,
        target: &str,
        opts: ConnectOptions,
    ) -> Result<Message, ClientError> {
        self.token = token.to_string();
        self.target = target.to_string();

        let req = MessageBuilder::new()
            .kind(MessageKind::Connect)
            .transaction_id(self.transaction_id)
            .token(self.token.as_str())
            .target(self.target.as_str())
            .connection_type(connection_type)
            .build()?;

        let outcome = self.module.connect(addr, &req, &opts).await;
        // The id advances whether or not the handshake succeeded.
        self.transaction_id += 1;

        let resp = outcome?;
        self.token = resp.header().token.clone();
        debug!(addr, token = %self.token, "session established");
        Ok(resp)
    }

    /// Send a gracious disconnect. No response is expected.
    pub async fn disconnect(&mut self, reason: DisconnectReason) -> Result<(), ClientError> {
        let msg = self
            .builder(MessageKind::Disconnect)
            .disconnect_reason(reason)
            .build()?;
        self.transaction_id += 1;
        self.module.post(&msg).await
    }

    /// Send a pre-built message and wait for its response.
    ///
    /// Prefer the per-request methods, which stamp the session state into
    /// the message for you.
    pub async fn send(&mut self, msg: Message) -> Result<Message, ClientError> {
        self.transaction_id += 1;
        self.module.send(&msg).await
    }

    /// Probe the device for liveness.
    pub async fn ping(&mut self) -> Result<Message, ClientError> {
        let msg = self.builder(MessageKind::Ping).build()?;
        self.send(msg).await
    }

    /// Read parameters. An empty name list requests the full configuration.
    pub async fn get_config<I, S>(&mut self, names: I) -> Result<Message, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let msg = self
            .builder(MessageKind::GetConfig)
            .desired_parameters(names)
            .build()?;
        self.send(msg).await
    }

    /// Write parameters, given in their GEMS-ASCII textual form.
    pub async fn set_config<I, S>(&mut self, parameters: I) -> Result<Message, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let msg = self
            .builder(MessageKind::SetConfig)
            .ascii_parameters(parameters)
            .build()?;
        self.send(msg).await
    }

    /// Write pre-built parameters.
    pub async fn set_config_parameters<I>(&mut self, parameters: I) -> Result<Message, ClientError>
    where
        I: IntoIterator<Item = ParameterNode>,
    {
        let msg = self
            .builder(MessageKind::SetConfig)
            .parameters(parameters)
            .build()?;
        self.send(msg).await
    }

    /// List the named configurations stored on the device.
    pub async fn get_config_list(&mut self) -> Result<Message, ClientError> {
        let msg = self.builder(MessageKind::GetConfigList).build()?;
        self.send(msg).await
    }

    /// Replace the live configuration with a stored one.
    pub async fn load_config(&mut self, name: &str) -> Result<Message, ClientError> {
        let msg = self
            .builder(MessageKind::LoadConfig)
            .configuration_name(name)
            .build()?;
        self.send(msg).await
    }

    /// Store the live configuration under a name.
    pub async fn save_config(&mut self, name: &str) -> Result<Message, ClientError> {
        let msg = self
            .builder(MessageKind::SaveConfig)
            .configuration_name(name)
            .build()?;
        self.send(msg).await
    }

    /// Invoke a named directive with arguments in GEMS-ASCII textual form.
    pub async fn directive<I, S>(&mut self, name: &str, args: I) -> Result<Message, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let msg = self
            .builder(MessageKind::Directive)
            .directive(name)
            .ascii_parameters(args)
            .build()?;
        self.send(msg).await
    }

    fn builder(&self, kind: MessageKind) -> MessageBuilder {
        MessageBuilder::new()
            .kind(kind)
            .transaction_id(self.transaction_id)
            .token(self.token.as_str())
            .target(self.target.as_str())
    }
}
