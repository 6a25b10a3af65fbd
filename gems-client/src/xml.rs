//! XML PSM client transport: one HTTP POST per request/response cycle.

use crate::client::{ConnectOptions, PlatformModule};
use crate::error::ClientError;
use crate::CLIENT_TIMEOUT;
use async_trait::async_trait;
use gems_protocol::Message;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;

pub(crate) struct XmlModule {
    server_addr: String,
    client: Option<Client>,
}

impl XmlModule {
    pub(crate) fn new() -> Self {
        XmlModule {
            server_addr: String::new(),
            client: None,
        }
    }

    async fn roundtrip(&self, msg: &Message) -> Result<Message, ClientError> {
        let client = self.client.as_ref().ok_or(ClientError::NotConnected)?;
        let payload = gems_protocol::xml::encode_message(msg)?;
        let endpoint = format!("{}/{}", self.server_addr, msg.header().target);

        let response = client
            .post(endpoint)
            .header(USER_AGENT, "OMG-GEMS")
            .header(CONTENT_TYPE, "text/xml")
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::HttpStatus(response.status()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            // Disconnect is answered with an empty body; nothing to decode.
            return Err(ClientError::NotAResponse);
        }

        let msg = gems_protocol::xml::decode_message(&body)?;
        if !msg.is_response() {
            return Err(ClientError::NotAResponse);
        }
        if let Some(result) = msg.result() {
            if !result.is_success() {
                return Err(ClientError::ErrorResponse(Box::new(msg)));
            }
        }
        Ok(msg)
    }
}

#[async_trait]
impl PlatformModule for XmlModule {
    async fn connect(
        &mut self,
        addr: &str,
        req: &Message,
        opts: &ConnectOptions,
    ) -> Result<Message, ClientError> {
        let addr = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else if opts.tls {
            format!("https://{addr}")
        } else {
            format!("http://{addr}")
        };

        self.server_addr = addr;
        self.client = Some(
            Client::builder()
                .timeout(CLIENT_TIMEOUT)
                .danger_accept_invalid_certs(opts.insecure)
                .build()?,
        );
        self.send(req).await
    }

    async fn send(&mut self, msg: &Message) -> Result<Message, ClientError> {
        self.roundtrip(msg).await
    }

    async fn post(&mut self, msg: &Message) -> Result<(), ClientError> {
        let client = self.client.as_ref().ok_or(ClientError::NotConnected)?;
        let payload = gems_protocol::xml::encode_message(msg)?;
        let endpoint = format!("{}/{}", self.server_addr, msg.header().target);
        client
            .post(endpoint)
            .header(USER_AGENT, "OMG-GEMS")
            .header(CONTENT_TYPE, "text/xml")
            .body(payload)
            .send()
            .await?;
        Ok(())
    }

    fn server_addr(&self) -> &str {
        &self.server_addr
    }
}
