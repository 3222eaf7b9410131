//! # Packet Codec
//!
//! `tokio_util` framing for [`LogicPacket`] over async byte streams, using the
//! same wire format as the blocking encoder/decoder.
//!
//! The decoder peeks both length prefixes before consuming anything, so an
//! incomplete frame leaves the buffer untouched and yields `Ok(None)`. Bytes
//! still buffered when the stream ends are reported as a malformed frame.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::config::{CodecConfig, MAX_FRAME_SIZE};
use crate::core::endian::LENGTH_PREFIX_SIZE;
use crate::core::header::Header;
use crate::core::packet::LogicPacket;
use crate::error::constants::ERR_TRAILING_BYTES;
use crate::error::{ProtocolError, Result};
use crate::utils::metrics::global_metrics;

#[derive(Debug, Clone, Copy)]
pub struct PacketCodec {
    max_frame_size: usize,
}

impl PacketCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.max_frame_size)
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    fn peek_len(&self, src: &BytesMut, at: usize) -> Result<Option<usize>> {
        if src.len() < at + LENGTH_PREFIX_SIZE {
            return Ok(None);
        }
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&src[at..at + LENGTH_PREFIX_SIZE]);
        let len = u32::from_be_bytes(prefix) as usize;
        if len > self.max_frame_size {
            return Err(ProtocolError::OversizedFrame(len));
        }
        Ok(Some(len))
    }

    fn decode_frame(&mut self, src: &mut BytesMut) -> Result<Option<LogicPacket>> {
        let Some(header_len) = self.peek_len(src, 0)? else {
            return Ok(None);
        };
        let body_at = LENGTH_PREFIX_SIZE + header_len;
        let Some(body_len) = self.peek_len(src, body_at)? else {
            src.reserve(body_at + LENGTH_PREFIX_SIZE - src.len());
            return Ok(None);
        };
        let total = body_at + LENGTH_PREFIX_SIZE + body_len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut frame = src.split_to(total);
        frame.advance(LENGTH_PREFIX_SIZE);
        let header_bytes = frame.split_to(header_len);
        frame.advance(LENGTH_PREFIX_SIZE);

        let header = Header::from_bytes(&header_bytes)?;
        global_metrics().packet_decoded(total as u64);
        Ok(Some(LogicPacket {
            header,
            body: frame.to_vec(),
        }))
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_SIZE)
    }
}

impl Decoder for PacketCodec {
    type Item = LogicPacket;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.decode_frame(src).inspect_err(|err| {
            global_metrics().codec_error(err);
            debug!(error = %err, buffered = src.len(), "Frame decode failed");
        })
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(buf)? {
            Some(packet) => Ok(Some(packet)),
            None if buf.is_empty() => Ok(None),
            None => {
                let err = ProtocolError::MalformedFrame(ERR_TRAILING_BYTES);
                global_metrics().codec_error(&err);
                debug!(buffered = buf.len(), "Stream ended inside a frame");
                Err(err)
            }
        }
    }
}

impl Encoder<LogicPacket> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: LogicPacket, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&LogicPacket>>::encode(self, &item, dst)
    }
}

impl<'a> Encoder<&'a LogicPacket> for PacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: &'a LogicPacket, dst: &mut BytesMut) -> Result<()> {
        item.encode_into_with_limit(dst, self.max_frame_size)?;
        Ok(())
    }
}
