//! End-to-end tests for the client contract over TCP
//!
//! A small in-process server answers the sign-in handshake and then echoes
//! packets, so the framed client and the TCP dialer run against real sockets.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use courier_protocol::config::ClientConfig;
use courier_protocol::transport::tcp::{HANDSHAKE_COMMAND, META_ID, META_NAME};
use courier_protocol::{
    Client, DialerContext, FramedClient, LogicPacket, PacketCodec, ProtocolError, Service, Status,
    TcpDialer,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;

/// Accepts one client, checks its sign-in, then echoes until it hangs up.
/// Sends the identity it saw on `seen`.
async fn spawn_echo_server(accept: bool) -> (String, mpsc::UnboundedReceiver<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, PacketCodec::default());

        let signin = framed.next().await.unwrap().unwrap();
        assert_eq!(signin.header.command, HANDSHAKE_COMMAND);
        let id = signin.header.meta.raw(META_ID).unwrap_or_default().to_string();
        let name = signin.header.meta.raw(META_NAME).unwrap_or_default().to_string();
        let _ = seen_tx.send((id, name));

        let mut reply = LogicPacket::reply_to(&signin.header);
        if !accept {
            reply.header.status = Status::Unauthorized;
            reply.body = b"denied".to_vec();
        }
        framed.send(reply).await.unwrap();
        if !accept {
            return;
        }

        while let Some(Ok(request)) = framed.next().await {
            let mut reply = LogicPacket::reply_to(&request.header);
            reply.body = request.body;
            if framed.send(reply).await.is_err() {
                break;
            }
        }
    });

    (addr, seen_rx)
}

#[tokio::test]
async fn test_connect_handshake_and_echo() {
    let (addr, mut seen) = spawn_echo_server(true).await;

    let mut client = FramedClient::new("user-7", "Dana")
        .with_dial_timeout(Duration::from_secs(5))
        .with_dialer(Arc::new(TcpDialer::new()));
    client.connect(&addr).await.unwrap();
    assert!(client.is_connected());
    assert_eq!(client.service_id(), "user-7");
    assert_eq!(client.service_name(), "Dana");

    let (id, name) = seen.recv().await.unwrap();
    assert_eq!(id, "user-7");
    assert_eq!(name, "Dana");

    for i in 0..5 {
        let mut request = LogicPacket::new("chat.user.talk");
        request.write_body(Some(&format!("message {i}"))).unwrap();
        let reply = client.request(&request).await.unwrap();
        assert_eq!(reply.header.sequence, request.header.sequence);
        assert_eq!(reply.read_body::<String>().unwrap(), format!("message {i}"));
    }

    // Raw bytes go through untouched
    let raw = LogicPacket::new("chat.ping");
    client.send(&raw.to_bytes().unwrap()).await.unwrap();
    assert_eq!(client.read().await.unwrap().header.sequence, raw.header.sequence);

    client.close().await;
    assert!(!client.is_connected());
    assert!(matches!(
        client.send(b"late").await,
        Err(ProtocolError::NotConnected)
    ));
}

#[tokio::test]
async fn test_rejected_handshake_leaves_client_disconnected() {
    let (addr, _seen) = spawn_echo_server(false).await;

    let mut client = FramedClient::new("intruder", "Eve");
    client.set_dialer(Arc::new(TcpDialer::new()));
    let err = client.connect(&addr).await.unwrap_err();
    assert!(matches!(err, ProtocolError::HandshakeError(_)));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_client_from_config() {
    let (addr, mut seen) = spawn_echo_server(true).await;
    let config = ClientConfig {
        address: addr.clone(),
        client_id: "cfg-1".into(),
        client_name: "Configured".into(),
        dial_timeout: Duration::from_secs(3),
    };

    let ctx = DialerContext::from_config(&config);
    assert_eq!(ctx.address, addr);
    assert_eq!(ctx.timeout, Duration::from_secs(3));

    let mut client = FramedClient::from_config(&config).with_dialer(Arc::new(TcpDialer::new()));
    client.connect(&config.address).await.unwrap();
    assert_eq!(seen.recv().await.unwrap().0, "cfg-1");
    client.close().await;
}

#[tokio::test]
async fn test_server_hangup_is_connection_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, PacketCodec::default());
        let signin = framed.next().await.unwrap().unwrap();
        framed.send(LogicPacket::reply_to(&signin.header)).await.unwrap();
    });

    let mut client = FramedClient::new("c", "c").with_dialer(Arc::new(TcpDialer::new()));
    client.connect(&addr).await.unwrap();
    assert!(matches!(
        client.read().await,
        Err(ProtocolError::ConnectionClosed)
    ));
}

#[tokio::test]
async fn test_push_sent_with_signin_reply_reaches_client() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, PacketCodec::default());
        let signin = framed.next().await.unwrap().unwrap();

        let mut push = LogicPacket::new("chat.offline.push");
        push.body = b"3 unread".to_vec();
        let mut bytes = LogicPacket::reply_to(&signin.header).to_bytes().unwrap();
        bytes.extend_from_slice(&push.to_bytes().unwrap());

        let mut stream = framed.into_inner();
        stream.write_all(&bytes).await.unwrap();
        // Hold the socket open until the client hangs up
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
    });

    let mut client = FramedClient::new("c", "c").with_dialer(Arc::new(TcpDialer::new()));
    client.connect(&addr).await.unwrap();

    let push = client.read().await.unwrap();
    assert_eq!(push.header.command, "chat.offline.push");
    assert_eq!(push.string_body(), "3 unread");
    client.close().await;
}
