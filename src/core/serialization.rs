//! # Serialization Formats
//!
//! The two structured encodings a packet carries:
//!
//! - **Bincode** encodes the header block. It is compact, schema-fixed and
//!   deterministic, so routing layers can read headers cheaply.
//! - **JSON** encodes application payloads written into the body. It is
//!   self-describing, which lets payload shapes evolve independently of the header.
//!
//! ## Bincode Layout
//! Headers use bincode 1.x with fixed-width little-endian integers. Strings and
//! sequences are prefixed with a `u64` little-endian length. Deserialization
//! rejects trailing bytes and is capped at the block's own length, so a hostile
//! string length cannot force a huge allocation and any block the framing layer
//! accepted can be decoded.
//!
//! This is not the protobuf header encoding used by other implementations of
//! the routing network. Peers must both speak this layout; a protobuf peer
//! cannot read these headers.
//!
//! ## Usage
//! ```rust
//! use courier_protocol::core::serialization::SerializationFormat;
//!
//! let bytes = SerializationFormat::Json.encode(&vec![1, 2, 3]).unwrap();
//! assert_eq!(bytes, b"[1,2,3]");
//! let back: Vec<u8> = SerializationFormat::Json.decode(&bytes).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FormatError;

/// Format used for the header block.
pub const HEADER_FORMAT: SerializationFormat = SerializationFormat::Bincode;

/// Format used by `write_body` / `read_body`.
pub const BODY_FORMAT: SerializationFormat = SerializationFormat::Json;

/// Supported serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationFormat {
    /// Binary compact format (headers)
    Bincode,
    /// Human-readable JSON format (bodies)
    Json,
}

impl SerializationFormat {
    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            SerializationFormat::Bincode => "Bincode",
            SerializationFormat::Json => "JSON",
        }
    }

    /// Serialize `value` to bytes
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>, FormatError> {
        match self {
            SerializationFormat::Bincode => Ok(bincode_options().serialize(value)?),
            SerializationFormat::Json => Ok(serde_json::to_vec(value)?),
        }
    }

    /// Deserialize a value from bytes
    pub fn decode<T: DeserializeOwned>(self, data: &[u8]) -> Result<T, FormatError> {
        match self {
            SerializationFormat::Bincode => Ok(bincode_options()
                .with_limit(data.len() as u64)
                .reject_trailing_bytes()
                .deserialize(data)?),
            SerializationFormat::Json => Ok(serde_json::from_slice(data)?),
        }
    }
}

#[inline]
fn bincode_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}
