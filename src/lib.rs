pub mod error;
pub mod size_mode;
pub mod signature;
pub mod entry;
pub mod index;
pub mod io_stream;
pub mod options;
pub mod fs;
pub mod archive;

pub use archive::{Archive, BatchReport, SkippedEntry};
pub use error::{ArchiveError, Result};
pub use index::{EntryTable, FileInfo};
pub use options::{ArchiveMode, ArchiveOptions};
pub use signature::{SignatureBlock, MAGIC};
pub use size_mode::SizeMode;

use std::io::{self, Read};
use std::path::Path;

/// Whether `reader` starts with the archive magic.
pub fn is_archive<R: Read>(reader: R) -> bool {
    signature::has_magic(reader)
}

pub fn is_archive_path<P: AsRef<Path>>(path: P) -> io::Result<bool> {
    Ok(is_archive(std::fs::File::open(path)?))
}
