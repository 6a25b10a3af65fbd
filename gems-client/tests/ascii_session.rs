//! Loopback sessions against the ASCII server.

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use gems_client::{ClientError, GemsClient, Psm};
use gems_protocol::ascii::{self, GemsFrameCodec};
use gems_protocol::{
    ConnectionType, DisconnectReason, Message, MessageBuilder, MessageKind, ResultCode,
};
use gems_server::{AsciiServer, HandlerError, MessageHandler};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

/// Handler answering pings and echoing the transaction id.
fn ping_handler() -> MessageHandler {
    Arc::new(|req| {
        let mut builder = MessageBuilder::new().result_code(ResultCode::Success);
        if let Some(id) = req.transaction_id() {
            builder = builder.transaction_id(id);
        }
        builder = match req.kind() {
            MessageKind::Ping => builder.kind(MessageKind::PingResponse),
            _ => builder
                .kind(MessageKind::UnknownResponse)
                .result_code(ResultCode::UnsupportedMessage),
        };
        builder.build().map_err(HandlerError::from)
    })
}

async fn start_server(auth_token: Option<&str>) -> SocketAddr {
    let server = AsciiServer::bind("", ping_handler(), auth_token.map(String::from))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

#[tokio::test]
async fn connect_and_ping() {
    let addr = start_server(None).await;

    let mut client = GemsClient::new(Psm::Ascii);
    let resp = client
        .connect(&addr.to_string(), ConnectionType::ControlAndStatus, "", "")
        .await
        .unwrap();
    assert_eq!(resp.kind(), MessageKind::ConnectResponse);
    assert!(resp.result().unwrap().is_success());
    // The client adopts the server-issued session token.
    assert_eq!(client.token(), gems_server::DEFAULT_SESSION_TOKEN);
    assert_eq!(client.transaction_id(), 1);

    let resp = client.ping().await.unwrap();
    assert_eq!(resp.kind(), MessageKind::PingResponse);
    assert_eq!(resp.transaction_id(), Some(1));
    assert_eq!(client.transaction_id(), 2);
}

#[tokio::test]
async fn request_before_connect_is_refused() {
    let addr = start_server(None).await;

    // Speak raw frames so the connect handshake can be skipped.
    let stream = TcpStream::connect(addr).await.unwrap();
    let mut framed = Framed::new(stream, GemsFrameCodec::new());

    let ping = MessageBuilder::new()
        .kind(MessageKind::Ping)
        .transaction_id(7)
        .build()
        .unwrap();
    let frame = ascii::encode_message(&ping).unwrap();
    framed.send(Bytes::from(frame)).await.unwrap();

    let reply = framed.next().await.unwrap().unwrap();
    let msg = ascii::decode_message(&reply).unwrap();
    assert_eq!(msg.kind(), MessageKind::UnknownResponse);
    let result = msg.result().unwrap();
    assert_eq!(result.code, ResultCode::InvalidState);
    assert_eq!(result.description, "Not connected");

    // The refusal does not connect the peer; a second try is refused too.
    let frame = ascii::encode_message(&ping).unwrap();
    framed.send(Bytes::from(frame)).await.unwrap();
    let reply = framed.next().await.unwrap().unwrap();
    let msg = ascii::decode_message(&reply).unwrap();
    assert_eq!(msg.result().unwrap().code, ResultCode::InvalidState);
}

#[tokio::test]
async fn mismatched_auth_token_is_denied() {
    let addr = start_server(Some("letmein")).await;

    let mut client = GemsClient::new(Psm::Ascii);
    let err = client
        .connect(
            &addr.to_string(),
            ConnectionType::ControlAndStatus,
            "wrong",
            "",
        )
        .await
        .unwrap_err();
    let resp = err.response().expect("denial carries the response");
    assert_eq!(resp.result().unwrap().code, ResultCode::AccessDenied);

    // The failed handshake still advanced the transaction id.
    assert_eq!(client.transaction_id(), 1);

    // And the peer was not added to the connected set.
    let err = client.ping().await.unwrap_err();
    let resp = err.response().expect("refusal carries the response");
    assert_eq!(resp.result().unwrap().code, ResultCode::InvalidState);
}

#[tokio::test]
async fn matching_auth_token_is_accepted() {
    let addr = start_server(Some("letmein")).await;

    let mut client = GemsClient::new(Psm::Ascii);
    client
        .connect(
            &addr.to_string(),
            ConnectionType::ControlAndStatus,
            "letmein",
            "",
        )
        .await
        .unwrap();
    client.ping().await.unwrap();
}

#[tokio::test]
async fn disconnect_drops_connection_state() {
    let addr = start_server(None).await;

    let mut client = GemsClient::new(Psm::Ascii);
    client
        .connect(&addr.to_string(), ConnectionType::ControlAndStatus, "", "")
        .await
        .unwrap();
    client
        .disconnect(DisconnectReason::NormalTermination)
        .await
        .unwrap();

    // The server closes the transport on disconnect, so the next request
    // fails at the session level rather than with a response.
    let err = client.ping().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Closed | ClientError::Io(_) | ClientError::Timeout
    ));
}

/// Peer that answers a GetConfig with a stale-id response first, then the
/// matching one.
async fn stale_then_matching_server(listener: TcpListener) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut framed = Framed::new(stream, GemsFrameCodec::new());

    while let Some(Ok(frame)) = framed.next().await {
        let req = ascii::decode_message(&frame).unwrap();
        match req.kind() {
            MessageKind::Connect => {
                let resp = MessageBuilder::new()
                    .kind(MessageKind::ConnectResponse)
                    .transaction_id(req.transaction_id().unwrap())
                    .result_code(ResultCode::Success)
                    .build()
                    .unwrap();
                let frame = ascii::encode_message(&resp).unwrap();
                framed.send(Bytes::from(frame)).await.unwrap();
            }
            MessageKind::GetConfig => {
                let stale = MessageBuilder::new()
                    .kind(MessageKind::DirectiveResponse)
                    .transaction_id(4)
                    .directive("StartProcessing")
                    .result_code(ResultCode::Success)
                    .build()
                    .unwrap();
                let matching = MessageBuilder::new()
                    .kind(MessageKind::GetConfigResponse)
                    .transaction_id(5)
                    .result_code(ResultCode::Success)
                    .build()
                    .unwrap();
                for msg in [stale, matching] {
                    let frame = ascii::encode_message(&msg).unwrap();
                    framed.send(Bytes::from(frame)).await.unwrap();
                }
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn responses_are_correlated_by_transaction_id() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(stale_then_matching_server(listener));

    let mut client = GemsClient::new(Psm::Ascii);
    client
        .connect(&addr.to_string(), ConnectionType::ControlAndStatus, "", "")
        .await
        .unwrap();

    let req = MessageBuilder::new()
        .kind(MessageKind::GetConfig)
        .transaction_id(5)
        .build()
        .unwrap();
    let resp = client.send(req).await.unwrap();

    // The DirectiveResponse with id 4 was skipped; only id 5 reaches us.
    assert_eq!(resp.kind(), MessageKind::GetConfigResponse);
    assert_eq!(resp.transaction_id(), Some(5));
}

#[tokio::test]
async fn error_responses_carry_the_message() {
    let addr = start_server(None).await;

    let mut client = GemsClient::new(Psm::Ascii);
    client
        .connect(&addr.to_string(), ConnectionType::ControlAndStatus, "", "")
        .await
        .unwrap();

    // The ping handler refuses everything that is not a ping.
    let err = client.get_config_list().await.unwrap_err();
    match &err {
        ClientError::ErrorResponse(resp) => {
            assert_eq!(
                resp.result().unwrap().code,
                ResultCode::UnsupportedMessage
            );
        }
        other => panic!("unexpected error {other:?}"),
    }

    // The session stays usable after a failed request.
    let resp = client.ping().await.unwrap();
    assert!(resp.result().unwrap().is_success());
}

#[tokio::test]
async fn send_to_message_round_trip_through_real_device() {
    // A fuller handler: the gems-bin demo device lives outside this crate,
    // so emulate a config store inline.
    let store: MessageHandler = Arc::new(|req| {
        let mut builder = MessageBuilder::new().result_code(ResultCode::Success);
        if let Some(id) = req.transaction_id() {
            builder = builder.transaction_id(id);
        }
        builder = match req {
            Message::GetConfigList(_) => builder
                .kind(MessageKind::GetConfigListResponse)
                .configuration_list(["ConfigA", "ConfigB", "ConfigC"]),
            _ => builder
                .kind(MessageKind::UnknownResponse)
                .result_code(ResultCode::UnsupportedMessage),
        };
        builder.build().map_err(HandlerError::from)
    });

    let server = AsciiServer::bind("", store, None).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let mut client = GemsClient::new(Psm::Ascii);
    client
        .connect(&addr.to_string(), ConnectionType::ControlAndStatus, "", "")
        .await
        .unwrap();
    let resp = client.get_config_list().await.unwrap();
    match resp {
        Message::GetConfigListResponse(m) => {
            assert_eq!(m.configurations, vec!["ConfigA", "ConfigB", "ConfigC"]);
        }
        other => panic!("unexpected response {:?}", other.kind()),
    }
}
