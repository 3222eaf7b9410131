//! # Length-Prefixed Stream Primitives
//!
//! Blocking helpers that read and write one length-prefixed block on a
//! `std::io` stream.
//!
//! ## Wire Format
//! ```text
//! [Length(4, big-endian u32)] [Bytes(N)]
//! ```
//!
//! A declared length above the caller's cap is rejected before any buffer is
//! allocated, and a stream that ends early never yields a partial block.

use std::io::{self, Read, Write};

use crate::error::constants::{ERR_TRUNCATED_BLOCK, ERR_TRUNCATED_PREFIX};
use crate::error::{ProtocolError, Result};

/// Width of every length prefix on the wire.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Read a big-endian `u32` length prefix.
pub fn read_u32<R: Read + ?Sized>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; LENGTH_PREFIX_SIZE];
    r.read_exact(&mut buf).map_err(|e| truncated(e, ERR_TRUNCATED_PREFIX))?;
    Ok(u32::from_be_bytes(buf))
}

/// Write a big-endian `u32` length prefix.
pub fn write_u32<W: Write + ?Sized>(w: &mut W, value: u32) -> Result<()> {
    w.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Read one length-prefixed block, refusing blocks longer than `max_len`.
pub fn read_bytes<R: Read + ?Sized>(r: &mut R, max_len: usize) -> Result<Vec<u8>> {
    let len = read_u32(r)? as usize;
    if len > max_len {
        return Err(ProtocolError::OversizedFrame(len));
    }

    let mut buf = Vec::with_capacity(len);
    Read::take(&mut *r, len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(ProtocolError::MalformedFrame(ERR_TRUNCATED_BLOCK));
    }
    Ok(buf)
}

/// Write `bytes` as one length-prefixed block.
pub fn write_bytes<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| ProtocolError::OversizedFrame(bytes.len()))?;
    write_u32(w, len)?;
    w.write_all(bytes)?;
    Ok(())
}

fn truncated(err: io::Error, reason: &'static str) -> ProtocolError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ProtocolError::MalformedFrame(reason)
    } else {
        ProtocolError::Io(err)
    }
}
