//! ASCII PSM server: a TCP accept loop with one task per connection.

use crate::handler::{connection_gate, error_response, MessageHandler};
use bytes::Bytes;
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use gems_protocol::ascii::{self, GemsFrameCodec};
use gems_protocol::MessageKind;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A bound GEMS-ASCII server.
///
/// `bind` reserves the listening socket (an empty address binds an ephemeral
/// local port); `run` consumes the server and serves until the cancellation
/// token fires. Frame boundaries are self-synchronising, so a malformed
/// message is logged and the connection keeps reading; transport errors end
/// that connection only.
pub struct AsciiServer {
    listener: TcpListener,
    handler: MessageHandler,
    auth_token: Option<String>,
    peers: Arc<DashMap<SocketAddr, ()>>,
    shutdown: CancellationToken,
}

impl AsciiServer {
    pub async fn bind(
        addr: &str,
        handler: MessageHandler,
        auth_token: Option<String>,
    ) -> io::Result<Self> {
        let addr = if addr.is_empty() { "127.0.0.1:0" } else { addr };
        let listener = TcpListener::bind(addr).await?;
        Ok(AsciiServer {
            listener,
            handler,
            auth_token,
            peers: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Token that stops the accept loop and all connection tasks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until cancelled.
    pub async fn run(self) -> io::Result<()> {
        let AsciiServer {
            listener,
            handler,
            auth_token,
            peers,
            shutdown,
        } = self;

        info!(addr = %listener.local_addr()?, "gems-ascii server listening");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            tokio::spawn(handle_connection(
                                stream,
                                peer,
                                handler.clone(),
                                auth_token.clone(),
                                peers.clone(),
                                shutdown.child_token(),
                            ));
                        }
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: MessageHandler,
    auth_token: Option<String>,
    peers: Arc<DashMap<SocketAddr, ()>>,
    shutdown: CancellationToken,
) {
    let mut framed = Framed::new(stream, GemsFrameCodec::new());

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = framed.next() => frame,
        };
        let Some(frame) = frame else {
            break;
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(%peer, error = %e, "frame error");
                break;
            }
        };

        let req = match ascii::decode_message(&frame) {
            Ok(req) => req,
            Err(e) => {
                warn!(%peer, error = %e, "undecodable frame");
                continue;
            }
        };

        if req.kind() == MessageKind::Disconnect {
            info!(%peer, "peer disconnected");
            break;
        }

        let resp = if peers.contains_key(&peer) {
            match (handler)(&req) {
                Ok(resp) => resp,
                Err(he) => {
                    warn!(%peer, error = %he, "handler failed");
                    match error_response(&req, &he) {
                        Ok(resp) => resp,
                        Err(e) => {
                            warn!(%peer, error = %e, "could not build error response");
                            continue;
                        }
                    }
                }
            }
        } else {
            match connection_gate(&req, auth_token.as_deref()) {
                Ok(outcome) => {
                    if outcome.accepted {
                        peers.insert(peer, ());
                    } else {
                        info!(%peer, "connection attempt refused");
                    }
                    outcome.response
                }
                Err(e) => {
                    warn!(%peer, error = %e, "connection gate failed");
                    continue;
                }
            }
        };

        let out = match ascii::encode_message(&resp) {
            Ok(out) => out,
            Err(e) => {
                warn!(%peer, error = %e, "response encoding failed");
                continue;
            }
        };
        if let Err(e) = framed.send(Bytes::from(out)).await {
            warn!(%peer, error = %e, "write failed");
            break;
        }

        info!(
            %peer,
            request = %req.kind(),
            response = %resp.kind(),
            result = %resp.result().map(|r| r.code).unwrap_or_default(),
            "handled request"
        );
    }

    // Transport close or disconnect both purge the peer's connected state.
    peers.remove(&peer);
}
