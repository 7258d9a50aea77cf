//! Archive signature block — the fixed 22-byte header at offset 0.
//!
//! | Offset | Field                 | Width |
//! |--------|-----------------------|-------|
//! | 0      | magic                 | 8     |
//! | 8      | general purpose field | 4     |
//! | 12     | file count            | 8     |
//! | 20     | size mode             | 1     |
//! | 21     | write CRC             | 1     |
//!
//! All integers are little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{ArchiveError, Result};
use crate::size_mode::SizeMode;

pub const MAGIC: [u8; 8] = [0x91, 0xDE, 0xEE, 0x9C, 0x80, 0x5C, 0x23, 0xE6];
/// Byte offset of the first entry header.
pub const SIGNATURE_SIZE: u64 = 8 + 4 + 8 + 1 + 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlock {
    pub general_purpose: u32,
    pub file_count:      u64,
    pub size_mode:       SizeMode,
    pub write_crc:       bool,
}

impl SignatureBlock {
    pub fn new(size_mode: SizeMode, write_crc: bool) -> Self {
        Self {
            general_purpose: 0,
            file_count:      0,
            size_mode,
            write_crc,
        }
    }

    pub fn write<W: Write + Seek>(&self, mut writer: W) -> Result<()> {
        writer.seek(SeekFrom::Start(0))?;
        writer.write_all(&MAGIC)?;
        writer.write_u32::<LittleEndian>(self.general_purpose)?;
        writer.write_u64::<LittleEndian>(self.file_count)?;
        writer.write_u8(self.size_mode.as_u8())?;
        writer.write_u8(self.write_crc as u8)?;
        Ok(())
    }

    pub fn load<R: Read + Seek>(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(|_| ArchiveError::InvalidSignature)?;
        if magic != MAGIC {
            return Err(ArchiveError::InvalidSignature);
        }
        // a block cut short after the magic is no signature at all
        let mut rest = [0u8; SIGNATURE_SIZE as usize - 8];
        reader.read_exact(&mut rest).map_err(|_| ArchiveError::InvalidSignature)?;
        let mut fields = &rest[..];
        let general_purpose = fields.read_u32::<LittleEndian>()?;
        let file_count      = fields.read_u64::<LittleEndian>()?;
        let size_mode       = SizeMode::from_u8(fields.read_u8()?)?;
        let write_crc       = fields.read_u8()? != 0;
        Ok(Self { general_purpose, file_count, size_mode, write_crc })
    }
}

/// Checks only the magic; the reader is left just past it.
pub fn has_magic<R: Read>(mut reader: R) -> bool {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic).is_ok() && magic == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn write_then_load() {
        let sb = SignatureBlock {
            general_purpose: 0xDEAD_BEEF,
            file_count:      42,
            size_mode:       SizeMode::M32,
            write_crc:       true,
        };
        let mut buf = Cursor::new(Vec::new());
        sb.write(&mut buf).unwrap();
        assert_eq!(buf.get_ref().len() as u64, SIGNATURE_SIZE);
        assert_eq!(&buf.get_ref()[..8], &MAGIC);
        assert_eq!(buf.get_ref()[20], 1);
        assert_eq!(buf.get_ref()[21], 1);

        let loaded = SignatureBlock::load(&mut buf).unwrap();
        assert_eq!(loaded, sb);
    }

    #[test]
    fn bad_magic() {
        let mut bytes = vec![0u8; SIGNATURE_SIZE as usize];
        bytes[..8].copy_from_slice(b"NOTMAGIC");
        let err = SignatureBlock::load(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidSignature));
    }

    #[test]
    fn empty_stream_is_invalid() {
        let err = SignatureBlock::load(Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidSignature));
    }

    #[test]
    fn magic_with_short_block_is_invalid() {
        let mut buf = Cursor::new(Vec::new());
        SignatureBlock::new(SizeMode::M32, true).write(&mut buf).unwrap();
        for len in [8, 12, 20, 21] {
            let err = SignatureBlock::load(Cursor::new(buf.get_ref()[..len].to_vec())).unwrap_err();
            assert!(matches!(err, ArchiveError::InvalidSignature), "len {len}: {err:?}");
        }
    }

    #[test]
    fn unknown_size_mode() {
        let mut buf = Cursor::new(Vec::new());
        SignatureBlock::new(SizeMode::M16, false).write(&mut buf).unwrap();
        buf.get_mut()[20] = 7;
        let err = SignatureBlock::load(&mut buf).unwrap_err();
        assert!(matches!(err, ArchiveError::UnsupportedSizeMode(7)));
    }

    #[test]
    fn rewrite_keeps_following_bytes() {
        let mut buf = Cursor::new(Vec::new());
        let mut sb = SignatureBlock::new(SizeMode::M64, true);
        sb.write(&mut buf).unwrap();
        buf.get_mut().extend_from_slice(b"payload");
        sb.file_count = 3;
        sb.write(&mut buf).unwrap();
        assert_eq!(&buf.get_ref()[SIGNATURE_SIZE as usize..], b"payload");
        assert_eq!(SignatureBlock::load(&mut buf).unwrap().file_count, 3);
    }
}
