//! # Logic Packet
//!
//! A packet is a [`Header`] plus an opaque body, framed as two length-prefixed
//! blocks.
//!
//! ## Wire Format
//! ```text
//! [HeaderLen(4, BE u32)] [Header(bincode)] [BodyLen(4, BE u32)] [Body(N)]
//! ```
//!
//! The body is never interpreted by the codec. [`LogicPacket::write_body`] and
//! [`LogicPacket::read_body`] marshal application payloads into it as JSON.
//!
//! Encoding is deterministic: the same packet always yields the same bytes.
//! Decoding yields a packet only when both blocks were read in full.

use std::borrow::Cow;
use std::fmt;
use std::io::{Cursor, Read, Write};

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::MAX_FRAME_SIZE;
use crate::core::endian::{self, LENGTH_PREFIX_SIZE};
use crate::core::header::Header;
use crate::core::meta::{MetaEntry, MetaValue};
use crate::core::serialization::BODY_FORMAT;
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;

/// Header plus opaque body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogicPacket {
    pub header: Header,
    pub body: Vec<u8>,
}

impl LogicPacket {
    /// Empty-body packet for `command` with a freshly assigned sequence.
    pub fn new(command: impl Into<String>) -> Self {
        Self::from(Header::builder(command).build())
    }

    /// Reply packet correlated with `request`; metadata and body are not inherited.
    pub fn reply_to(request: &Header) -> Self {
        Self::from(Header::reply_to(request))
    }

    /// Decode one packet from a blocking stream.
    pub fn decode<R: Read + ?Sized>(r: &mut R) -> Result<Self> {
        Self::decode_with_limit(r, MAX_FRAME_SIZE)
    }

    /// Decode one packet, rejecting blocks longer than `max_frame_size`.
    pub fn decode_with_limit<R: Read + ?Sized>(r: &mut R, max_frame_size: usize) -> Result<Self> {
        match read_frame(r, max_frame_size) {
            Ok((packet, consumed)) => {
                global_metrics().packet_decoded(consumed as u64);
                Ok(packet)
            }
            Err(err) => {
                global_metrics().codec_error(&err);
                debug!(error = %err, "Packet decode failed");
                Err(err)
            }
        }
    }

    /// Encode this packet onto a blocking stream.
    ///
    /// The frame is fully serialized before the first write, so a header
    /// encoding failure leaves the stream untouched.
    pub fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        let bytes = self.to_bytes()?;
        w.write_all(&bytes)?;
        Ok(())
    }

    /// Encoded frame as a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::new();
        self.encode_into(&mut buf)?;
        Ok(buf.to_vec())
    }

    /// Decode the first packet in `data`; bytes after it are ignored.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::decode(&mut Cursor::new(data))
    }

    /// Append the encoded frame to `dst`, returning the number of bytes written.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<usize> {
        self.encode_into_with_limit(dst, MAX_FRAME_SIZE)
    }

    /// Like [`encode_into`](Self::encode_into), but rejects any block longer
    /// than `max_frame_size`. Nothing is written to `dst` on error.
    pub fn encode_into_with_limit(&self, dst: &mut BytesMut, max_frame_size: usize) -> Result<usize> {
        let framed = self
            .header
            .to_bytes()
            .and_then(|header_bytes| {
                let header_len = block_len(header_bytes.len(), max_frame_size)?;
                let body_len = block_len(self.body.len(), max_frame_size)?;
                Ok((header_bytes, header_len, body_len))
            })
            .inspect_err(|err| {
                global_metrics().codec_error(err);
                debug!(error = %err, command = %self.header.command, "Packet encode failed");
            });
        let (header_bytes, header_len, body_len) = framed?;
        let total = 2 * LENGTH_PREFIX_SIZE + header_bytes.len() + self.body.len();

        dst.reserve(total);
        dst.put_u32(header_len);
        dst.put_slice(&header_bytes);
        dst.put_u32(body_len);
        dst.put_slice(&self.body);

        global_metrics().packet_encoded(total as u64);
        Ok(total)
    }

    /// Marshal `val` into the body as JSON. `None` leaves the body untouched.
    pub fn write_body<T: Serialize + ?Sized>(&mut self, val: Option<&T>) -> Result<&mut Self> {
        if let Some(val) = val {
            self.body = BODY_FORMAT.encode(val).map_err(|e| {
                global_metrics().body_error();
                debug!(format = BODY_FORMAT.name(), error = %e, "Body encode failed");
                ProtocolError::BodyEncode(e)
            })?;
        }
        Ok(self)
    }

    /// Unmarshal the JSON body into a new `T`.
    pub fn read_body<T: DeserializeOwned>(&self) -> Result<T> {
        BODY_FORMAT.decode(&self.body).map_err(|e| {
            global_metrics().body_error();
            debug!(format = BODY_FORMAT.name(), error = %e, "Body decode failed");
            ProtocolError::BodyDecode(e)
        })
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn string_body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn service_name(&self) -> &str {
        self.header.service_name()
    }

    pub fn add_meta<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = MetaEntry>,
    {
        self.header.meta.add(entries);
    }

    pub fn add_string_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.header.meta.add_string(key, value);
    }

    pub fn get_meta(&self, key: &str) -> Option<MetaValue> {
        self.header.meta.get(key)
    }

    pub fn del_meta(&mut self, key: &str) {
        self.header.meta.delete(key);
    }
}

impl From<Header> for LogicPacket {
    fn from(header: Header) -> Self {
        Self {
            header,
            body: Vec::new(),
        }
    }
}

impl fmt::Display for LogicPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "header:{{command:{} sequence:{} channel:{} dest:{} status:{} meta:{}}} body:{}B",
            self.header.command,
            self.header.sequence,
            self.header.channel_id,
            self.header.dest,
            self.header.status.code(),
            self.header.meta.len(),
            self.body.len()
        )
    }
}

fn read_frame<R: Read + ?Sized>(r: &mut R, max_frame_size: usize) -> Result<(LogicPacket, usize)> {
    let header_bytes = endian::read_bytes(r, max_frame_size)?;
    let header = Header::from_bytes(&header_bytes)?;
    let body = endian::read_bytes(r, max_frame_size)?;
    let consumed = 2 * LENGTH_PREFIX_SIZE + header_bytes.len() + body.len();
    Ok((LogicPacket { header, body }, consumed))
}

fn block_len(len: usize, max_frame_size: usize) -> Result<u32> {
    if len > max_frame_size {
        return Err(ProtocolError::OversizedFrame(len));
    }
    u32::try_from(len).map_err(|_| ProtocolError::OversizedFrame(len))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::core::header::Status;
    use crate::core::meta::MetaType;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TalkReq {
        text: String,
        mentions: Vec<String>,
    }

    fn sample() -> LogicPacket {
        let mut pkt = LogicPacket::from(
            Header::builder("chat.user.talk")
                .channel("ch-1")
                .dest("u2")
                .sequence(12)
                .build(),
        );
        pkt.add_string_meta("trace", "t-1");
        pkt.add_meta([MetaEntry::new("hops", "3", MetaType::Int)]);
        pkt.body = b"hello".to_vec();
        pkt
    }

    #[test]
    fn test_roundtrip() {
        let pkt = sample();
        let bytes = pkt.to_bytes().expect("encode");
        let decoded = LogicPacket::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded, pkt);
        assert_eq!(decoded.get_meta("hops"), Some(MetaValue::Int(3)));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let pkt = sample();
        assert_eq!(pkt.to_bytes().unwrap(), pkt.to_bytes().unwrap());
    }

    #[test]
    fn test_frame_layout() {
        let pkt = sample();
        let header_bytes = pkt.header.to_bytes().unwrap();
        let bytes = pkt.to_bytes().unwrap();

        let hlen = u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
        assert_eq!(hlen, header_bytes.len());
        assert_eq!(&bytes[4..4 + hlen], header_bytes.as_slice());
        let blen = u32::from_be_bytes(bytes[4 + hlen..8 + hlen].try_into().unwrap()) as usize;
        assert_eq!(blen, 5);
        assert_eq!(&bytes[8 + hlen..], b"hello");
    }

    #[test]
    fn test_empty_body_is_zero_length_block() {
        let pkt = LogicPacket::new("ping");
        let bytes = pkt.to_bytes().unwrap();
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
        let decoded = LogicPacket::from_bytes(&bytes).unwrap();
        assert!(decoded.body.is_empty());
        assert_eq!(decoded.service_name(), "default");
    }

    #[test]
    fn test_truncated_mid_body() {
        let bytes = sample().to_bytes().unwrap();
        let err = LogicPacket::from_bytes(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame(_)));
    }

    #[test]
    fn test_truncated_mid_header() {
        let bytes = sample().to_bytes().unwrap();
        let err = LogicPacket::from_bytes(&bytes[..10]).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedFrame(_)));
    }

    #[test]
    fn test_bad_header_block() {
        let mut bytes = Vec::new();
        endian::write_bytes(&mut bytes, &[9, 9, 9]).unwrap();
        endian::write_bytes(&mut bytes, b"").unwrap();
        let err = LogicPacket::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ProtocolError::HeaderDecode(_)));
    }

    #[test]
    fn test_decode_with_limit() {
        let mut pkt = sample();
        pkt.body = vec![0u8; 2048];
        let bytes = pkt.to_bytes().unwrap();
        let err = LogicPacket::decode_with_limit(&mut Cursor::new(&bytes), 1024).unwrap_err();
        assert!(matches!(err, ProtocolError::OversizedFrame(2048)));
    }

    #[test]
    fn test_encode_rejects_block_over_limit() {
        let mut pkt = sample();
        pkt.body = vec![0u8; 2048];
        let mut dst = BytesMut::new();
        let err = pkt.encode_into_with_limit(&mut dst, 1024).unwrap_err();
        assert!(matches!(err, ProtocolError::OversizedFrame(2048)));
        assert!(dst.is_empty());

        pkt.header.dest = "x".repeat(2048);
        pkt.body.clear();
        let err = pkt.encode_into_with_limit(&mut dst, 1024).unwrap_err();
        assert!(matches!(err, ProtocolError::OversizedFrame(n) if n > 2048));
        assert!(dst.is_empty());
    }

    #[test]
    fn test_to_bytes_output_always_decodes() {
        let mut pkt = LogicPacket::new("bulk.upload");
        pkt.body = vec![7u8; MAX_FRAME_SIZE + 1];
        let err = pkt.to_bytes().unwrap_err();
        assert!(matches!(err, ProtocolError::OversizedFrame(n) if n == MAX_FRAME_SIZE + 1));

        let mut sink = Vec::new();
        assert!(pkt.encode(&mut sink).is_err());
        assert!(sink.is_empty());

        pkt.body.truncate(MAX_FRAME_SIZE);
        let bytes = pkt.to_bytes().unwrap();
        assert_eq!(LogicPacket::from_bytes(&bytes).unwrap().body.len(), MAX_FRAME_SIZE);
    }

    #[test]
    fn test_write_and_read_body() {
        let req = TalkReq {
            text: "hi".to_string(),
            mentions: vec!["u3".to_string()],
        };
        let mut pkt = LogicPacket::new("chat.user.talk");
        pkt.write_body(Some(&req)).unwrap();
        assert_eq!(pkt.string_body(), r#"{"text":"hi","mentions":["u3"]}"#);

        let back: TalkReq = pkt.read_body().unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_write_body_none_keeps_body() {
        let mut pkt = LogicPacket::new("chat.user.talk");
        pkt.body = b"keep".to_vec();
        pkt.write_body::<TalkReq>(None).unwrap();
        assert_eq!(pkt.body, b"keep");
    }

    #[test]
    fn test_read_body_mismatch() {
        let mut pkt = LogicPacket::new("chat.user.talk");
        pkt.write_body(Some(&vec![1, 2, 3])).unwrap();
        let err = pkt.read_body::<TalkReq>().unwrap_err();
        assert!(matches!(err, ProtocolError::BodyDecode(_)));
        assert_eq!(pkt.body, b"[1,2,3]");
    }

    #[test]
    fn test_reply_packet() {
        let req = sample();
        let reply = LogicPacket::reply_to(&req.header);
        assert_eq!(reply.header.sequence, 12);
        assert!(reply.header.meta.is_empty());
        assert!(reply.body.is_empty());
        assert_eq!(reply.header.status, Status::Success);
    }

    #[test]
    fn test_meta_delegates() {
        let mut pkt = sample();
        pkt.add_string_meta("trace", "t-2");
        pkt.del_meta("trace");
        assert_eq!(pkt.get_meta("trace"), None);
        assert_eq!(pkt.header.meta.len(), 1);
    }

    #[test]
    fn test_display() {
        let text = sample().to_string();
        assert!(text.contains("command:chat.user.talk"));
        assert!(text.ends_with("body:5B"));
    }
}
