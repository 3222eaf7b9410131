//! TCP dialer with a packet-level sign-in handshake.
//!
//! After the socket connects, the dialer sends one [`LogicPacket`] carrying the
//! caller's identity as string metadata and waits for the peer's reply. The
//! reply must echo the request sequence and carry [`Status::Success`]. Connect
//! and handshake together are bounded by [`DialerContext::timeout`].
//!
//! Bytes the peer sends right behind the reply are kept and handed out first
//! by the returned connection.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::{Buf, Bytes};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, instrument, warn};

use crate::core::codec::PacketCodec;
use crate::core::header::{Header, Status};
use crate::core::packet::LogicPacket;
use crate::error::constants::{ERR_HANDSHAKE_NO_REPLY, ERR_HANDSHAKE_SEQUENCE};
use crate::error::{ProtocolError, Result};
use crate::service::client::{BoxedConnection, Dialer, DialerContext};

/// Command of the sign-in packet.
pub const HANDSHAKE_COMMAND: &str = "login.signin";

/// Metadata key carrying the dialer's identity.
pub const META_ID: &str = "id";

/// Metadata key carrying the dialer's display name.
pub const META_NAME: &str = "name";

#[derive(Debug, Clone)]
pub struct TcpDialer {
    command: String,
    codec: PacketCodec,
}

impl TcpDialer {
    pub fn new() -> Self {
        Self {
            command: HANDSHAKE_COMMAND.to_string(),
            codec: PacketCodec::default(),
        }
    }

    /// Use `command` for the sign-in packet instead of [`HANDSHAKE_COMMAND`].
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_codec(mut self, codec: PacketCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Sign-in packet for `ctx`.
    pub fn handshake_packet(&self, ctx: &DialerContext) -> LogicPacket {
        let mut packet = LogicPacket::from(Header::builder(self.command.as_str()).build());
        packet.add_string_meta(META_ID, ctx.id.as_str());
        packet.add_string_meta(META_NAME, ctx.name.as_str());
        packet
    }

    async fn dial(&self, ctx: &DialerContext) -> Result<BoxedConnection> {
        let stream = TcpStream::connect(ctx.address.as_str())
            .await
            .map_err(|e| ProtocolError::DialError(format!("{}: {e}", ctx.address)))?;
        stream.set_nodelay(true)?;

        let mut framed = Framed::new(stream, self.codec);
        let request = self.handshake_packet(ctx);
        framed.send(&request).await?;

        let reply = match framed.next().await {
            Some(reply) => reply?,
            None => {
                return Err(ProtocolError::HandshakeError(
                    ERR_HANDSHAKE_NO_REPLY.to_string(),
                ))
            }
        };

        if reply.header.sequence != request.header.sequence {
            return Err(ProtocolError::HandshakeError(
                ERR_HANDSHAKE_SEQUENCE.to_string(),
            ));
        }
        if reply.header.status != Status::Success {
            warn!(status = reply.header.status.code(), body = %reply.string_body(), "Handshake rejected");
            return Err(ProtocolError::HandshakeError(format!(
                "peer answered with status {}",
                reply.header.status.code()
            )));
        }

        let parts = framed.into_parts();
        if parts.read_buf.is_empty() {
            return Ok(Box::new(parts.io));
        }
        debug!(buffered = parts.read_buf.len(), "Replaying bytes received with the handshake reply");
        Ok(Box::new(Replay {
            buffered: parts.read_buf.freeze(),
            stream: parts.io,
        }))
    }
}

/// Socket whose first reads return bytes already pulled off the wire.
struct Replay {
    buffered: Bytes,
    stream: TcpStream,
}

impl AsyncRead for Replay {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.buffered.is_empty() {
            return Pin::new(&mut self.stream).poll_read(cx, buf);
        }
        let n = self.buffered.len().min(buf.remaining());
        buf.put_slice(&self.buffered[..n]);
        self.buffered.advance(n);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for Replay {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

impl Default for TcpDialer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    #[instrument(skip(self, ctx), fields(id = %ctx.id, address = %ctx.address))]
    async fn dial_and_handshake(&self, ctx: &DialerContext) -> Result<BoxedConnection> {
        let conn = timeout(ctx.timeout, self.dial(ctx))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        debug!("Handshake complete");
        Ok(conn)
    }
}
