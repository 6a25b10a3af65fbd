//! ASCII PSM client transport.
//!
//! One framed TCP (or TLS) stream per session. A background task reads
//! frames and fans them into a data channel, with read failures going to a
//! separate error channel; closing the connection drops both senders, which
//! receivers observe as EOF. Responses are correlated to the in-flight
//! request by transaction id, and anything else arriving on the stream is
//! skipped.

use crate::client::{ConnectOptions, PlatformModule};
use crate::error::ClientError;
use crate::CLIENT_TIMEOUT;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use gems_protocol::ascii::GemsFrameCodec;
use gems_protocol::Message;
use std::io;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_util::codec::Framed;
use tracing::debug;

/// Object-safe alias for the plain and TLS stream types.
trait AsciiStream: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send {}
impl<T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send> AsciiStream for T {}

type FramedStream = Framed<Box<dyn AsciiStream>, GemsFrameCodec>;

pub(crate) struct AsciiModule {
    server_addr: String,
    sink: Option<SplitSink<FramedStream, Bytes>>,
    data_rx: Option<mpsc::Receiver<BytesMut>>,
    err_rx: Option<mpsc::Receiver<io::Error>>,
}

impl AsciiModule {
    pub(crate) fn new() -> Self {
        AsciiModule {
            server_addr: String::new(),
            sink: None,
            data_rx: None,
            err_rx: None,
        }
    }

    async fn dial(&mut self, addr: &str, opts: &ConnectOptions) -> Result<(), ClientError> {
        let tcp = timeout(CLIENT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::Timeout)??;

        let stream: Box<dyn AsciiStream> = if opts.tls {
            let host = addr.split(':').next().unwrap_or(addr);
            Box::new(crate::tls::wrap(tcp, host, opts.insecure).await?)
        } else {
            Box::new(tcp)
        };

        let framed = Framed::new(stream, GemsFrameCodec::new());
        let (sink, stream) = framed.split();

        let (data_tx, data_rx) = mpsc::channel(64);
        let (err_tx, err_rx) = mpsc::channel(1);
        tokio::spawn(listen(stream, data_tx, err_tx));

        self.server_addr = addr.to_string();
        self.sink = Some(sink);
        self.data_rx = Some(data_rx);
        self.err_rx = Some(err_rx);
        Ok(())
    }

    async fn write_frame(&mut self, msg: &Message) -> Result<(), ClientError> {
        let frame = gems_protocol::ascii::encode_message(msg)?;
        let sink = self.sink.as_mut().ok_or(ClientError::NotConnected)?;
        sink.send(Bytes::from(frame)).await?;
        Ok(())
    }

    /// Wait for the response matching `request_id`; everything else on the
    /// stream is discarded. The deadline covers the whole wait.
    async fn receive(&mut self, request_id: Option<i64>) -> Result<Message, ClientError> {
        let data_rx = self.data_rx.as_mut().ok_or(ClientError::NotConnected)?;
        let err_rx = self.err_rx.as_mut().ok_or(ClientError::NotConnected)?;
        let deadline = Instant::now() + CLIENT_TIMEOUT;
        // A closed error channel is EOF, not failure; queued frames still
        // drain from the data channel afterwards.
        let mut err_closed = false;

        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return Err(ClientError::Timeout),
                read_err = err_rx.recv(), if !err_closed => {
                    match read_err {
                        Some(e) => return Err(ClientError::Io(e)),
                        None => {
                            err_closed = true;
                            continue;
                        }
                    }
                }
                frame = data_rx.recv() => {
                    let Some(frame) = frame else {
                        return Err(ClientError::Closed);
                    };
                    let msg = match gems_protocol::ascii::decode_message(&frame) {
                        Ok(msg) => msg,
                        Err(e) => {
                            debug!(error = %e, "skipping undecodable frame");
                            continue;
                        }
                    };
                    if !msg.is_response() || !msg.transaction_match(request_id) {
                        continue;
                    }
                    if let Some(result) = msg.result() {
                        if !result.is_success() {
                            return Err(ClientError::ErrorResponse(Box::new(msg)));
                        }
                    }
                    return Ok(msg);
                }
            }
        }
    }
}

async fn listen(
    mut stream: SplitStream<FramedStream>,
    data_tx: mpsc::Sender<BytesMut>,
    err_tx: mpsc::Sender<io::Error>,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(frame) => {
                if data_tx.send(frame).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                let _ = err_tx.send(e).await;
                break;
            }
        }
    }
    // Dropping the senders here closes both channels, which the session
    // observes as EOF.
}

#[async_trait]
impl PlatformModule for AsciiModule {
    async fn connect(
        &mut self,
        addr: &str,
        req: &Message,
        opts: &ConnectOptions,
    ) -> Result<Message, ClientError> {
        self.dial(addr, opts).await?;
        self.send(req).await
    }

    async fn send(&mut self, msg: &Message) -> Result<Message, ClientError> {
        self.write_frame(msg).await?;
        self.receive(msg.transaction_id()).await
    }

    async fn post(&mut self, msg: &Message) -> Result<(), ClientError> {
        self.write_frame(msg).await
    }

    fn server_addr(&self) -> &str {
        &self.server_addr
    }
}
