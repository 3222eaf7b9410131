//! # Packet Header
//!
//! The routing/control envelope of a packet, its status codes, the builder
//! that assigns sequence numbers, and the command-to-service mapping.
//!
//! ## Commands
//! A command is either `"<service>.<action>"` or a bare action. The service
//! part is what a dispatcher uses to pick a handler:
//!
//! ```rust
//! use courier_protocol::core::header::Header;
//!
//! let header = Header::builder("chat.user.talk").channel("ch-1").build();
//! assert_eq!(header.service_name(), "chat");
//! assert_ne!(header.sequence, 0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::meta::Metadata;
use crate::core::sequence::{global_sequence, Sequencer};
use crate::core::serialization::HEADER_FORMAT;
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;

/// Service name for commands without a `.` separator.
pub const DEFAULT_SERVICE: &str = "default";

/// Request/response status carried in every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Status {
    #[default]
    Success,
    NoDestination,
    InvalidPacketBody,
    InvalidCommand,
    Unauthorized,
    SystemException,
    NotImplemented,
    SessionNotFound,
    /// Code not known to this build, preserved verbatim.
    Unknown(i32),
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        match code {
            0 => Status::Success,
            100 => Status::NoDestination,
            101 => Status::InvalidPacketBody,
            103 => Status::InvalidCommand,
            105 => Status::Unauthorized,
            300 => Status::SystemException,
            301 => Status::NotImplemented,
            404 => Status::SessionNotFound,
            other => Status::Unknown(other),
        }
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl Status {
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::NoDestination => 100,
            Status::InvalidPacketBody => 101,
            Status::InvalidCommand => 103,
            Status::Unauthorized => 105,
            Status::SystemException => 300,
            Status::NotImplemented => 301,
            Status::SessionNotFound => 404,
            Status::Unknown(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// Codes 100..300 are raised by the requesting side.
    pub fn is_client_error(self) -> bool {
        (100..300).contains(&self.code())
    }

    /// Codes 300..400 are raised by the serving side.
    pub fn is_server_error(self) -> bool {
        (300..400).contains(&self.code())
    }
}

/// Structured envelope of a packet.
///
/// Field order is the wire order of the bincode header block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    pub command: String,
    /// Correlation id; `0` means unassigned.
    pub sequence: u32,
    pub channel_id: String,
    pub status: Status,
    pub dest: String,
    pub meta: Metadata,
}

impl Header {
    /// Start building a header for `command`.
    pub fn builder(command: impl Into<String>) -> HeaderBuilder {
        HeaderBuilder::new(command)
    }

    /// Correlated reply header: copies the routing fields, drops the metadata.
    pub fn reply_to(request: &Header) -> Self {
        Self {
            command: request.command.clone(),
            sequence: request.sequence,
            channel_id: request.channel_id.clone(),
            status: request.status,
            dest: request.dest.clone(),
            meta: Metadata::new(),
        }
    }

    /// Service part of the command, or [`DEFAULT_SERVICE`] when there is no `.`.
    #[inline]
    pub fn service_name(&self) -> &str {
        service_name(&self.command)
    }

    /// Encode into the header block format.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        HEADER_FORMAT.encode(self).map_err(ProtocolError::HeaderEncode)
    }

    /// Decode from a complete header block.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        HEADER_FORMAT.decode(data).map_err(ProtocolError::HeaderDecode)
    }
}

/// Service part of `command`: everything before the first `.`, or [`DEFAULT_SERVICE`].
#[inline]
pub fn service_name(command: &str) -> &str {
    match command.split_once('.') {
        Some((service, _)) => service,
        None => DEFAULT_SERVICE,
    }
}

/// Chainable header construction.
///
/// Setters apply in call order, so a later call for the same field wins.
/// `build` assigns a sequence from the generator if none was set.
#[derive(Debug, Clone)]
#[must_use]
pub struct HeaderBuilder {
    header: Header,
}

impl HeaderBuilder {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            header: Header {
                command: command.into(),
                ..Header::default()
            },
        }
    }

    pub fn status(mut self, status: Status) -> Self {
        self.header.status = status;
        self
    }

    /// Explicit sequence. Zero is the unassigned sentinel and is ignored.
    pub fn sequence(mut self, sequence: u32) -> Self {
        if sequence != 0 {
            self.header.sequence = sequence;
        }
        self
    }

    pub fn channel(mut self, channel_id: impl Into<String>) -> Self {
        self.header.channel_id = channel_id.into();
        self
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.header.dest = dest.into();
        self
    }

    /// Finish using the process-wide sequence generator.
    pub fn build(self) -> Header {
        self.build_with(global_sequence())
    }

    /// Finish using `sequencer` for an unassigned sequence.
    pub fn build_with<S: Sequencer + ?Sized>(mut self, sequencer: &S) -> Header {
        if self.header.sequence == 0 {
            self.header.sequence = sequencer.next();
            global_metrics().sequence_assigned();
            trace!(command = %self.header.command, sequence = self.header.sequence, "Assigned sequence");
        }
        self.header
    }
}
