//! # Core Protocol Components
//!
//! Packet model, wire codec and the pieces they are built from.
//!
//! ## Components
//! - **Header**: command, sequence, channel, status, destination and metadata
//! - **Meta**: typed key/value entries carried in the header
//! - **Sequence**: process-wide request numbering
//! - **Packet**: header plus opaque body, blocking encode/decode
//! - **Codec**: Tokio codec for framing over async byte streams
//!
//! ## Wire Format
//! ```text
//! [HeaderLen(4, BE)] [Header(N)] [BodyLen(4, BE)] [Body(M)]
//! ```
//!
//! Each length prefix is checked against the frame limit before allocating.

pub mod codec;
pub mod endian;
pub mod header;
pub mod meta;
pub mod packet;
pub mod sequence;
pub mod serialization;
