//! # Client Contract
//!
//! The connection interface that higher layers program against. A [`Client`]
//! owns one connection produced by a [`Dialer`], writes already-encoded packets
//! and reads decoded [`LogicPacket`]s.
//!
//! Dialing covers both the transport connect and the application handshake,
//! bounded by [`DialerContext::timeout`]. Retries are the caller's decision.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ClientConfig;
use crate::core::packet::LogicPacket;
use crate::error::Result;

/// Byte stream a dialer hands back after a successful handshake.
pub trait Connection: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

pub type BoxedConnection = Box<dyn Connection>;

/// Everything a dialer needs to connect and identify itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialerContext {
    /// Identity presented in the handshake
    pub id: String,
    /// Display name presented in the handshake
    pub name: String,
    /// Target address
    pub address: String,
    /// Upper bound for connect + handshake
    pub timeout: Duration,
}

impl DialerContext {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            id: config.client_id.clone(),
            name: config.client_name.clone(),
            address: config.address.clone(),
            timeout: config.dial_timeout,
        }
    }
}

/// Transport connect plus application handshake.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn dial_and_handshake(&self, ctx: &DialerContext) -> Result<BoxedConnection>;
}

/// Identity of a participant in the network.
pub trait Service {
    fn service_id(&self) -> &str;
    fn service_name(&self) -> &str;
}

#[async_trait]
pub trait Client: Service + Send {
    /// Dial `address` with the configured dialer.
    async fn connect(&mut self, address: &str) -> Result<()>;

    fn set_dialer(&mut self, dialer: Arc<dyn Dialer>);

    /// Write an already-encoded packet.
    async fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Next packet from the peer.
    async fn read(&mut self) -> Result<LogicPacket>;

    async fn close(&mut self);
}
