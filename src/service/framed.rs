use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_DIAL_TIMEOUT};
use crate::core::codec::PacketCodec;
use crate::core::packet::LogicPacket;
use crate::error::constants::ERR_NO_DIALER;
use crate::error::{ProtocolError, Result};
use crate::service::client::{BoxedConnection, Client, Dialer, DialerContext, Service};
use crate::utils::metrics::global_metrics;

struct Link {
    reader: FramedRead<ReadHalf<BoxedConnection>, PacketCodec>,
    writer: WriteHalf<BoxedConnection>,
}

/// [`Client`] that reads packets through [`PacketCodec`] from whatever
/// connection its [`Dialer`] produces.
pub struct FramedClient {
    id: String,
    name: String,
    dial_timeout: Duration,
    codec: PacketCodec,
    dialer: Option<Arc<dyn Dialer>>,
    link: Option<Link>,
}

impl FramedClient {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            codec: PacketCodec::default(),
            dialer: None,
            link: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.client_id.clone(), config.client_name.clone())
            .with_dial_timeout(config.dial_timeout)
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn with_codec(mut self, codec: PacketCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Encode and send one packet, applying the codec's frame limit.
    pub async fn send_packet(&mut self, packet: &LogicPacket) -> Result<()> {
        let mut bytes = BytesMut::new();
        packet.encode_into_with_limit(&mut bytes, self.codec.max_frame_size())?;
        self.send(&bytes).await
    }

    /// Send `packet` and wait for the next packet from the peer.
    pub async fn request(&mut self, packet: &LogicPacket) -> Result<LogicPacket> {
        self.send_packet(packet).await?;
        self.read().await
    }
}

impl Service for FramedClient {
    fn service_id(&self) -> &str {
        &self.id
    }

    fn service_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Client for FramedClient {
    async fn connect(&mut self, address: &str) -> Result<()> {
        let dialer = self
            .dialer
            .clone()
            .ok_or_else(|| ProtocolError::DialError(ERR_NO_DIALER.to_string()))?;

        let ctx = DialerContext {
            id: self.id.clone(),
            name: self.name.clone(),
            address: address.to_string(),
            timeout: self.dial_timeout,
        };

        if self.link.is_some() {
            warn!(id = %self.id, "Reconnecting, dropping previous connection");
            self.close().await;
        }

        let conn = dialer.dial_and_handshake(&ctx).await?;
        let (read_half, write_half) = tokio::io::split(conn);
        self.link = Some(Link {
            reader: FramedRead::new(read_half, self.codec),
            writer: write_half,
        });
        info!(id = %self.id, address, "Client connected");
        Ok(())
    }

    fn set_dialer(&mut self, dialer: Arc<dyn Dialer>) {
        self.dialer = Some(dialer);
    }

    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        let link = self.link.as_mut().ok_or(ProtocolError::NotConnected)?;
        link.writer.write_all(payload).await?;
        link.writer.flush().await?;
        Ok(())
    }

    async fn read(&mut self) -> Result<LogicPacket> {
        let link = self.link.as_mut().ok_or(ProtocolError::NotConnected)?;
        let next = link.reader.next().await;
        match next {
            Some(Err(err)) if err.is_wire_error() => {
                // The framed reader stops after a decode error, so the link is unusable.
                warn!(id = %self.id, error = %err, "Dropping connection after unreadable frame");
                self.link = None;
                Err(err)
            }
            Some(result) => result,
            None => Err(ProtocolError::ConnectionClosed),
        }
    }

    async fn close(&mut self) {
        if let Some(mut link) = self.link.take() {
            if let Err(e) = link.writer.shutdown().await {
                debug!(id = %self.id, error = %e, "Shutdown after close failed");
            }
            info!(id = %self.id, "Client closed");
            global_metrics().log_metrics();
        }
    }
}
