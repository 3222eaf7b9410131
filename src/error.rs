//! # Error Types
//!
//! Error handling for the packet layer.
//!
//! This module defines every error variant surfaced by packet framing, header and
//! body serialization, strict metadata access, configuration loading and the
//! client/dialer contract.
//!
//! ## Error Categories
//! - **Framing Errors**: Truncated streams, unreadable or oversized length prefixes
//! - **Serialization Errors**: Header (bincode) and body (JSON) encode/decode failures
//! - **Metadata Errors**: Type coercion failures from the strict accessor
//! - **Transport Errors**: I/O, dial, handshake and timeout failures
//! - **Configuration Errors**: Invalid or unreadable configuration
//!
//! A metadata lookup miss is not an error: lookups return `Option`.
//!
//! ## Example Usage
//! ```rust
//! use courier_protocol::core::packet::LogicPacket;
//! use courier_protocol::error::ProtocolError;
//!
//! // Header block claims 16 bytes, stream ends after 2.
//! let truncated = [0u8, 0, 0, 16, 1, 2];
//! match LogicPacket::from_bytes(&truncated) {
//!     Err(ProtocolError::MalformedFrame(reason)) => println!("rejected: {reason}"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Framing errors
    pub const ERR_TRUNCATED_PREFIX: &str = "stream ended inside a length prefix";
    pub const ERR_TRUNCATED_BLOCK: &str = "stream ended before the declared block length";
    pub const ERR_TRAILING_BYTES: &str = "bytes remaining on stream after the last complete packet";

    /// Connection errors
    pub const ERR_CONNECTION_CLOSED: &str = "Connection closed";
    pub const ERR_NOT_CONNECTED: &str = "Client is not connected";
    pub const ERR_NO_DIALER: &str = "No dialer configured";

    /// Handshake errors
    pub const ERR_HANDSHAKE_NO_REPLY: &str = "peer closed the connection before answering the handshake";
    pub const ERR_HANDSHAKE_SEQUENCE: &str = "handshake reply does not correlate with the request";

    /// Logging errors
    pub const ERR_LOGGING_ALREADY_INIT: &str = "A global tracing subscriber is already installed";
}

/// Failure raised by one of the structured serialization formats.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

// ProtocolError is the primary error type for all packet-layer operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed frame: {0}")]
    MalformedFrame(&'static str),

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Header encode error: {0}")]
    HeaderEncode(#[source] FormatError),

    #[error("Header decode error: {0}")]
    HeaderDecode(#[source] FormatError),

    #[error("Body encode error: {0}")]
    BodyEncode(#[source] FormatError),

    #[error("Body decode error: {0}")]
    BodyDecode(#[source] FormatError),

    #[error("Metadata '{key}' value {value:?} is not a valid {expected}")]
    MetadataCoercion {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("{}", constants::ERR_CONNECTION_CLOSED)]
    ConnectionClosed,

    #[error("{}", constants::ERR_NOT_CONNECTED)]
    NotConnected,

    #[error("Dial error: {0}")]
    DialError(String),

    #[error("Handshake failed: {0}")]
    HandshakeError(String),

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Whether the error was caused by bytes on the wire rather than by the local side.
    pub fn is_wire_error(&self) -> bool {
        matches!(
            self,
            ProtocolError::MalformedFrame(_)
                | ProtocolError::OversizedFrame(_)
                | ProtocolError::HeaderDecode(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
