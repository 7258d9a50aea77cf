//! Buffered payload copying with an incremental CRC-32.
//!
//! Payloads move between streams in fixed-size chunks and are never held in
//! memory as a whole.  The checksum is the IEEE CRC-32 computed by
//! `crc32fast`, the same value `zlib.crc32` produces.

use crc32fast::Hasher;
use std::io::{self, Read, Write};

/// Chunk size used when moving payload bytes.
pub const BUFFER_SIZE: usize = 200_000;

/// One-shot CRC-32 of a byte slice.
pub fn crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Outcome of [`copy_payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Copied {
    pub bytes: u64,
    pub crc:   u32,
}

/// Copy up to `limit` bytes (or until EOF when `None`) from `src` to `dest`,
/// checksumming every chunk on the way through.
pub fn copy_payload<R: Read, W: Write>(mut src: R, mut dest: W, limit: Option<u64>) -> io::Result<Copied> {
    let mut buf       = vec![0u8; BUFFER_SIZE];
    let mut hasher    = Hasher::new();
    let mut bytes     = 0u64;
    let mut remaining = limit;

    loop {
        let want = match remaining {
            Some(0) => break,
            Some(r) => r.min(BUFFER_SIZE as u64) as usize,
            None    => BUFFER_SIZE,
        };
        let n = match src.read(&mut buf[..want]) {
            Ok(0)  => break,
            Ok(n)  => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        dest.write_all(&buf[..n])?;
        bytes += n as u64;
        if let Some(r) = remaining.as_mut() {
            *r -= n as u64;
        }
    }

    Ok(Copied { bytes, crc: hasher.finalize() })
}
