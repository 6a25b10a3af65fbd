//! XML PSM server: one HTTP POST per request/response cycle.
//!
//! Connected-peer state is keyed by remote address. A guard inserted into
//! each connection's extensions removes the peer when the underlying TCP
//! connection goes away, mirroring the transport's connection-state
//! callbacks.

use crate::handler::{connection_gate, error_response, MessageHandler};
use actix_web::dev::ServerHandle;
use actix_web::rt::net::TcpStream;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use dashmap::DashMap;
use gems_protocol::{xml, MessageKind};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

struct XmlState {
    handler: MessageHandler,
    auth_token: Option<String>,
    peers: Arc<DashMap<SocketAddr, ()>>,
}

/// Removes its peer from the connected set when the HTTP connection is
/// dropped.
struct PeerGuard {
    peer: SocketAddr,
    peers: Arc<DashMap<SocketAddr, ()>>,
}

impl Drop for PeerGuard {
    fn drop(&mut self) {
        self.peers.remove(&self.peer);
    }
}

/// A bound GEMS-XML server.
pub struct XmlServer {
    server: actix_web::dev::Server,
    addr: SocketAddr,
}

impl XmlServer {
    /// Bind the HTTP listener. An empty address binds an ephemeral local
    /// port.
    pub fn bind(
        addr: &str,
        handler: MessageHandler,
        auth_token: Option<String>,
    ) -> io::Result<Self> {
        let peers: Arc<DashMap<SocketAddr, ()>> = Arc::new(DashMap::new());
        let state = web::Data::new(XmlState {
            handler,
            auth_token,
            peers: peers.clone(),
        });

        let bind_addr = if addr.is_empty() { "127.0.0.1:0" } else { addr };
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .default_service(web::post().to(handle_request))
        })
        .on_connect(move |conn, ext| {
            if let Some(stream) = conn.downcast_ref::<TcpStream>() {
                if let Ok(peer) = stream.peer_addr() {
                    ext.insert(PeerGuard {
                        peer,
                        peers: peers.clone(),
                    });
                }
            }
        })
        .workers(1)
        .bind(bind_addr)?;

        let addr = server
            .addrs()
            .first()
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no bound address"))?;

        Ok(XmlServer {
            server: server.run(),
            addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle for graceful shutdown.
    pub fn handle(&self) -> ServerHandle {
        self.server.handle()
    }

    /// Serve until stopped through the handle.
    pub async fn run(self) -> io::Result<()> {
        info!(addr = %self.addr, "gems-xml server listening");
        self.server.await
    }
}

async fn handle_request(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<XmlState>,
) -> HttpResponse {
    let Some(peer) = req.peer_addr() else {
        return HttpResponse::InternalServerError().finish();
    };

    let msg = match xml::decode_message(&body) {
        Ok(msg) => msg,
        Err(e) => {
            error!(%peer, error = %e, "undecodable request");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if msg.kind() == MessageKind::Disconnect {
        info!(%peer, "peer disconnected");
        state.peers.remove(&peer);
        return HttpResponse::Ok().finish();
    }

    let resp = if state.peers.contains_key(&peer) {
        match (state.handler)(&msg) {
            Ok(resp) => resp,
            Err(he) => {
                warn!(%peer, error = %he, "handler failed");
                match error_response(&msg, &he) {
                    Ok(resp) => resp,
                    Err(e) => {
                        error!(%peer, error = %e, "could not build error response");
                        return HttpResponse::InternalServerError().finish();
                    }
                }
            }
        }
    } else {
        match connection_gate(&msg, state.auth_token.as_deref()) {
            Ok(outcome) => {
                if outcome.accepted {
                    state.peers.insert(peer, ());
                } else {
                    info!(%peer, "connection attempt refused");
                }
                outcome.response
            }
            Err(e) => {
                error!(%peer, error = %e, "connection gate failed");
                return HttpResponse::InternalServerError().finish();
            }
        }
    };

    let out = match xml::encode_message(&resp) {
        Ok(out) => out,
        Err(e) => {
            error!(%peer, error = %e, "response encoding failed");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!(
        %peer,
        request = %msg.kind(),
        response = %resp.kind(),
        result = %resp.result().map(|r| r.code).unwrap_or_default(),
        "handled request"
    );
    HttpResponse::Ok().content_type("text/xml").body(out)
}
