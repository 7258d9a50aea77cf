//! In-memory entry table, rebuilt by scanning the archive on open.
//!
//! The table is a cache over the on-disk layout and is never persisted.
//! Entries keep on-disk order; name lookup resolves to the first entry
//! carrying that name, so duplicates never shadow earlier appends.  Lookup
//! compares the raw name bytes, which need not be UTF-8.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom};

use crate::entry::{header_len, read_header};
use crate::error::{ArchiveError, Result};
use crate::signature::{SignatureBlock, SIGNATURE_SIZE};
use crate::size_mode::SizeMode;

/// Location and metadata of one stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Display form of `raw_name`; invalid UTF-8 is replaced.
    pub name:          String,
    /// Name bytes exactly as stored.
    pub raw_name:      Vec<u8>,
    pub size:          u64,
    pub crc:           u32,
    /// Offset of the entry header.
    pub header_offset: u64,
    /// Offset of the first payload byte.
    pub data_offset:   u64,
}

impl FileInfo {
    pub(crate) fn new(raw_name: Vec<u8>, crc: u32, size: u64, header_offset: u64, size_mode: SizeMode) -> Self {
        let data_offset = header_offset + header_len(raw_name.len(), size_mode);
        let name        = String::from_utf8_lossy(&raw_name).into_owned();
        Self { name, raw_name, size, crc, header_offset, data_offset }
    }

    /// The stored name, if it is valid UTF-8.
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.raw_name).ok()
    }

    /// Offset one past the last payload byte.
    #[inline]
    pub fn end_offset(&self) -> u64 {
        self.data_offset + self.size
    }
}

#[derive(Debug, Clone)]
pub struct EntryTable {
    entries:       Vec<FileInfo>,
    first_by_name: HashMap<Vec<u8>, usize>,
    end_offset:    u64,
}

impl Default for EntryTable {
    fn default() -> Self {
        Self {
            entries:       Vec::new(),
            first_by_name: HashMap::new(),
            end_offset:    SIGNATURE_SIZE,
        }
    }
}

impl EntryTable {
    /// Walk the entry chain that follows the signature block.
    ///
    /// Headers are read one after another; payloads are skipped by seeking.
    /// Running out of bytes before `file_count` complete entries have been
    /// seen is reported as [`ArchiveError::TruncatedArchive`].
    pub fn scan<R: Read + Seek>(mut reader: R, signature: &SignatureBlock) -> Result<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        let expected   = signature.file_count;
        let truncated  = |found: usize| ArchiveError::TruncatedArchive { expected, found: found as u64 };

        let mut table = EntryTable::default();
        reader.seek(SeekFrom::Start(SIGNATURE_SIZE))?;

        while (table.len() as u64) < expected {
            let header_offset = reader.stream_position()?;
            let header = match read_header(&mut reader, signature.size_mode) {
                Ok(h) => h,
                Err(ArchiveError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Err(truncated(table.len()));
                }
                Err(e) => return Err(e),
            };

            let info = FileInfo::new(header.name, header.crc, header.data_size, header_offset, signature.size_mode);
            let end = info.data_offset.checked_add(info.size).ok_or_else(|| truncated(table.len()))?;
            if end > stream_len {
                return Err(truncated(table.len()));
            }
            reader.seek(SeekFrom::Start(end))?;
            table.push(info);
        }

        log::debug!("scanned {} entries, chain ends at {}", table.len(), table.end_offset);
        Ok(table)
    }

    pub(crate) fn push(&mut self, info: FileInfo) {
        let idx = self.entries.len();
        self.end_offset = info.end_offset();
        self.first_by_name.entry(info.raw_name.clone()).or_insert(idx);
        self.entries.push(info);
    }

    pub fn find(&self, name: &str) -> Result<&FileInfo> {
        self.find_raw(name.as_bytes())
    }

    pub fn find_raw(&self, name: &[u8]) -> Result<&FileInfo> {
        self.first_by_name
            .get(name)
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| ArchiveError::EntryNotFound(String::from_utf8_lossy(name).into_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.first_by_name.contains_key(name.as_bytes())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> std::slice::Iter<'_, FileInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset where the next entry header belongs.
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }
}
