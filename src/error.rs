//! Error type shared by every archive operation.
//!
//! Structural and codec failures surface as typed variants; storage failures
//! are wrapped in [`ArchiveError::Io`].  Nothing is repaired automatically:
//! a corrupt archive always produces one of these kinds.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid archive signature")]
    InvalidSignature,
    #[error("Truncated archive: signature declares {expected} entries, found {found}")]
    TruncatedArchive { expected: u64, found: u64 },
    #[error("Unsupported size mode: {0}")]
    UnsupportedSizeMode(u8),
    #[error("Value {value} exceeds the size field maximum {max}")]
    ValueTooLarge { value: u64, max: u64 },
    #[error("Entry name is {0} bytes long (maximum 255)")]
    NameTooLong(usize),
    #[error("Entry name at offset {offset} is not valid UTF-8")]
    InvalidName { offset: u64 },
    #[error("CRC mismatch for '{name}': stored {stored:08x}, computed {computed:08x}")]
    CrcMismatch { name: String, stored: u32, computed: u32 },
    #[error("Entry not found: {0}")]
    EntryNotFound(String),
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),
    #[error("Entry name would escape the extraction directory: {0}")]
    UnsafeEntryPath(String),
    #[error("Archive is closed")]
    ArchiveClosed,
    #[error("Archive is read-only")]
    ReadOnlyViolation,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
