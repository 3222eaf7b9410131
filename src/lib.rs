//! # Courier Protocol
//!
//! Wire protocol for a message-routing network. Every unit of communication is
//! a [`LogicPacket`]: a [`Header`] (command, sequence, channel, status,
//! destination and typed metadata) followed by an opaque body.
//!
//! ## Wire Format
//! ```text
//! [HeaderLen: u32 BE] [Header: bincode] [BodyLen: u32 BE] [Body: bytes]
//! ```
//!
//! Structured bodies are JSON. Commands are dot-separated; the segment before
//! the first dot names the destination service.
//!
//! ## Quick Start
//! ```
//! use courier_protocol::{LogicPacket, Status};
//!
//! let mut request = LogicPacket::new("chat.user.talk");
//! request.add_string_meta("room", "lobby");
//! request.write_body(Some(&"hello")).unwrap();
//!
//! let bytes = request.to_bytes().unwrap();
//! let decoded = LogicPacket::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded, request);
//! assert_eq!(decoded.service_name(), "chat");
//!
//! let reply = LogicPacket::reply_to(&decoded.header);
//! assert_eq!(reply.header.sequence, request.header.sequence);
//! assert_eq!(reply.header.status, Status::Success);
//! ```
//!
//! ## Modules
//! - [`core`]: packet model, wire encoding and the async codec
//! - [`service`]: client contract and a framed client
//! - [`transport`]: TCP dialer with sign-in handshake
//! - [`config`]: TOML and environment configuration
//! - [`utils`]: logging setup and codec metrics

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod config;
pub mod core;
pub mod error;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::config::{ProtocolConfig, MAX_FRAME_SIZE};
pub use crate::core::codec::PacketCodec;
pub use crate::core::header::{service_name, Header, HeaderBuilder, Status, DEFAULT_SERVICE};
pub use crate::core::meta::{MetaEntry, MetaType, MetaValue, Metadata};
pub use crate::core::packet::LogicPacket;
pub use crate::core::sequence::{global_sequence, AtomicSequence, Sequencer};
pub use crate::error::{ProtocolError, Result};
pub use crate::service::client::{Client, Dialer, DialerContext, Service};
pub use crate::service::framed::FramedClient;
pub use crate::transport::tcp::TcpDialer;
