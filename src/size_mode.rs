//! Size modes: the archive-wide width of every entry's data-size field.
//!
//! # Endianness
//! Size fields are strictly little-endian regardless of the host.  The
//! field width is fixed per archive at creation time and never changes.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::error::{ArchiveError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeMode {
    M16,
    M32,
    #[default]
    M64,
}

impl SizeMode {
    /// On-disk discriminant stored in the signature block.
    #[inline]
    pub fn as_u8(self) -> u8 {
        match self {
            SizeMode::M16 => 0,
            SizeMode::M32 => 1,
            SizeMode::M64 => 2,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SizeMode::M16),
            1 => Ok(SizeMode::M32),
            2 => Ok(SizeMode::M64),
            v => Err(ArchiveError::UnsupportedSizeMode(v)),
        }
    }

    /// Accepts the bit widths `16`, `32` and `64`.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(SizeMode::M16),
            32 => Some(SizeMode::M32),
            64 => Some(SizeMode::M64),
            _  => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SizeMode::M16 => "m16",
            SizeMode::M32 => "m32",
            SizeMode::M64 => "m64",
        }
    }

    /// Width of the data-size field in bytes.
    #[inline]
    pub fn width(self) -> usize {
        match self {
            SizeMode::M16 => 2,
            SizeMode::M32 => 4,
            SizeMode::M64 => 8,
        }
    }

    /// Largest value the field can hold, which is also the largest payload
    /// a single entry may carry.
    #[inline]
    pub fn max_value(self) -> u64 {
        match self {
            SizeMode::M16 => u16::MAX as u64,
            SizeMode::M32 => u32::MAX as u64,
            SizeMode::M64 => u64::MAX,
        }
    }

    pub fn check(self, value: u64) -> Result<()> {
        let max = self.max_value();
        if value > max {
            return Err(ArchiveError::ValueTooLarge { value, max });
        }
        Ok(())
    }

    pub fn encode(self, value: u64) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.width());
        self.write(&mut out, value)?;
        Ok(out)
    }

    pub fn decode(self, bytes: &[u8]) -> Result<u64> {
        self.read(bytes)
    }

    pub fn write<W: Write>(self, mut writer: W, value: u64) -> Result<()> {
        self.check(value)?;
        match self {
            SizeMode::M16 => writer.write_u16::<LittleEndian>(value as u16)?,
            SizeMode::M32 => writer.write_u32::<LittleEndian>(value as u32)?,
            SizeMode::M64 => writer.write_u64::<LittleEndian>(value)?,
        }
        Ok(())
    }

    pub fn read<R: Read>(self, mut reader: R) -> Result<u64> {
        Ok(match self {
            SizeMode::M16 => reader.read_u16::<LittleEndian>()? as u64,
            SizeMode::M32 => reader.read_u32::<LittleEndian>()? as u64,
            SizeMode::M64 => reader.read_u64::<LittleEndian>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn max_values() {
        assert_eq!(SizeMode::M16.max_value(), 0xFFFF);
        assert_eq!(SizeMode::M32.max_value(), 0xFFFF_FFFF);
        assert_eq!(SizeMode::M64.max_value(), 0xFFFF_FFFF_FFFF_FFFF);
    }

    #[test]
    fn little_endian_layout() {
        assert_eq!(SizeMode::M16.encode(0x0102).unwrap(), vec![0x02, 0x01]);
        assert_eq!(SizeMode::M32.encode(0x0102_0304).unwrap(), vec![0x04, 0x03, 0x02, 0x01]);
        assert_eq!(SizeMode::M64.encode(1).unwrap(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn rejects_oversized_values() {
        match SizeMode::M16.encode(0x1_0000) {
            Err(ArchiveError::ValueTooLarge { value, max }) => {
                assert_eq!(value, 0x1_0000);
                assert_eq!(max, 0xFFFF);
            }
            other => panic!("expected ValueTooLarge, got {other:?}"),
        }
        assert!(SizeMode::M32.encode(u32::MAX as u64 + 1).is_err());
    }

    #[test]
    fn discriminants() {
        for mode in [SizeMode::M16, SizeMode::M32, SizeMode::M64] {
            assert_eq!(SizeMode::from_u8(mode.as_u8()).unwrap(), mode);
        }
        assert!(matches!(SizeMode::from_u8(3), Err(ArchiveError::UnsupportedSizeMode(3))));
        assert_eq!(SizeMode::from_bits(32), Some(SizeMode::M32));
        assert_eq!(SizeMode::from_bits(8), None);
    }

    #[test]
    fn short_input_is_io_error() {
        assert!(matches!(SizeMode::M32.decode(&[1, 2]), Err(ArchiveError::Io(_))));
    }

    proptest! {
        #[test]
        fn field_width_holds_any_valid_value(v in any::<u64>()) {
            for mode in [SizeMode::M16, SizeMode::M32, SizeMode::M64] {
                let clamped = v & mode.max_value();
                let bytes = mode.encode(clamped).unwrap();
                prop_assert_eq!(bytes.len(), mode.width());
                prop_assert_eq!(mode.decode(&bytes).unwrap(), clamped);
            }
        }
    }
}
