//! Per-entry header codec.
//!
//! Layout: `[name_len u8][name][crc u32 LE][data_size 2/4/8 LE]`, followed
//! directly by `data_size` payload bytes.  The CRC field is always present;
//! it holds zero when the archive does not record checksums.  Names are
//! opaque bytes on disk; nothing here requires them to be UTF-8.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Write};

use crate::error::{ArchiveError, Result};
use crate::size_mode::SizeMode;

/// Longest name the one-byte length prefix can describe.
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub name:      Vec<u8>,
    pub crc:       u32,
    pub data_size: u64,
}

impl EntryHeader {
    /// Encoded length of this header on disk.
    pub fn encoded_len(&self, size_mode: SizeMode) -> u64 {
        header_len(self.name.len(), size_mode)
    }
}

#[inline]
pub fn header_len(name_len: usize, size_mode: SizeMode) -> u64 {
    (1 + name_len + 4 + size_mode.width()) as u64
}

pub fn check_name(name: &str) -> Result<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(ArchiveError::NameTooLong(name.len()));
    }
    Ok(())
}

/// Encode a header into memory.  All validation happens here, so a failed
/// call never leaves a partial header in the archive.
pub fn encode_header(name: &str, crc: u32, data_size: u64, size_mode: SizeMode) -> Result<Vec<u8>> {
    check_name(name)?;
    let mut out = Vec::with_capacity(header_len(name.len(), size_mode) as usize);
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(&crc.to_le_bytes());
    size_mode.write(&mut out, data_size)?;
    Ok(out)
}

pub fn write_header<W: Write>(
    mut writer: W,
    name:       &str,
    crc:        u32,
    data_size:  u64,
    size_mode:  SizeMode,
) -> Result<u64> {
    let encoded = encode_header(name, crc, data_size, size_mode)?;
    writer.write_all(&encoded)?;
    Ok(encoded.len() as u64)
}

/// Read one header.  The reader is left at the first payload byte.
pub fn read_header<R: Read>(mut reader: R, size_mode: SizeMode) -> Result<EntryHeader> {
    let name_len = reader.read_u8()? as usize;
    let mut name = vec![0u8; name_len];
    reader.read_exact(&mut name)?;
    let crc       = reader.read_u32::<LittleEndian>()?;
    let data_size = size_mode.read(&mut reader)?;
    Ok(EntryHeader { name, crc, data_size })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Seek, SeekFrom};

    #[test]
    fn layout_is_byte_exact() {
        let bytes = encode_header("ab", 0x0403_0201, 5, SizeMode::M16).unwrap();
        assert_eq!(bytes, vec![2, b'a', b'b', 1, 2, 3, 4, 5, 0]);
        assert_eq!(bytes.len() as u64, header_len(2, SizeMode::M16));
    }

    #[test]
    fn read_stops_at_payload() {
        let mut buf = Cursor::new(Vec::new());
        write_header(&mut buf, "file.txt", 7, 3, SizeMode::M32).unwrap();
        buf.write_all(b"xyz").unwrap();
        buf.seek(SeekFrom::Start(0)).unwrap();

        let hdr = read_header(&mut buf, SizeMode::M32).unwrap();
        assert_eq!(hdr, EntryHeader { name: b"file.txt".to_vec(), crc: 7, data_size: 3 });
        assert_eq!(buf.position(), hdr.encoded_len(SizeMode::M32));
    }

    #[test]
    fn name_bound_is_255() {
        assert!(encode_header(&"n".repeat(255), 0, 0, SizeMode::M64).is_ok());
        let err = encode_header(&"n".repeat(256), 0, 0, SizeMode::M64).unwrap_err();
        assert!(matches!(err, ArchiveError::NameTooLong(256)));
    }

    #[test]
    fn failed_write_emits_nothing() {
        let mut out = Vec::new();
        let err = write_header(&mut out, "big", 0, 0x1_0000, SizeMode::M16).unwrap_err();
        assert!(matches!(err, ArchiveError::ValueTooLarge { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn non_utf8_name_is_kept_verbatim() {
        let bytes = vec![4, b'c', b'a', b'f', 0xE9, 0, 0, 0, 0, 3, 0];
        let hdr = read_header(Cursor::new(bytes), SizeMode::M16).unwrap();
        assert_eq!(hdr.name, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(hdr.data_size, 3);
        assert_eq!(hdr.encoded_len(SizeMode::M16), 11);
    }

    #[test]
    fn empty_name_is_allowed() {
        let mut buf = Cursor::new(encode_header("", 0, 0, SizeMode::M16).unwrap());
        let hdr = read_header(&mut buf, SizeMode::M16).unwrap();
        assert!(hdr.name.is_empty());
        assert_eq!(hdr.data_size, 0);
    }
}
