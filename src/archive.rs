//! High-level [`Archive`] handle — the primary embedding surface.
//!
//! ```no_run
//! use static_archive::{Archive, ArchiveMode, ArchiveOptions, SizeMode};
//!
//! // Write
//! let mut ar = Archive::open_path("out.sa", ArchiveMode::Create, SizeMode::M32, ArchiveOptions::default())?;
//! ar.append_bytes("readme.txt", b"Hello, world!")?;
//! ar.close()?;
//!
//! // Read
//! let mut ar = Archive::open_path("out.sa", ArchiveMode::Read, SizeMode::M32, ArchiveOptions::default())?;
//! let info = ar.file_info("readme.txt")?.clone();
//! assert_eq!(ar.read_to_vec(&info)?, b"Hello, world!");
//! # Ok::<(), static_archive::ArchiveError>(())
//! ```
//!
//! A handle owns its stream exclusively.  It is single-threaded and not
//! reentrant; callers sharing one across threads must serialise access.

use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::entry::{check_name, write_header};
use crate::error::{ArchiveError, Result};
use crate::fs::{collect_sources, extract_path};
use crate::index::{EntryTable, FileInfo};
use crate::io_stream::{copy_payload, BUFFER_SIZE};
use crate::options::{ArchiveMode, ArchiveOptions};
use crate::signature::SignatureBlock;
use crate::size_mode::SizeMode;

// ── BatchReport ───────────────────────────────────────────────────────────────

/// An entry a batch operation gave up on while `ignore_errors` was set.
#[derive(Debug)]
pub struct SkippedEntry {
    pub name:  String,
    pub error: ArchiveError,
}

/// Result of [`Archive::add`] and [`Archive::extract`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<FileInfo>,
    pub skipped: Vec<SkippedEntry>,
}

// ── Archive ───────────────────────────────────────────────────────────────────

pub struct Archive<S: Read + Write + Seek = File> {
    /// `None` once the handle is closed.
    stream:    Option<S>,
    signature: SignatureBlock,
    table:     EntryTable,
    mode:      ArchiveMode,
    options:   ArchiveOptions,
}

impl Archive<File> {
    /// Open or create an archive file.
    ///
    /// `Read` opens read-only, `Append` read-write, `Create` creates or
    /// truncates.
    pub fn open_path<P: AsRef<Path>>(
        path:      P,
        mode:      ArchiveMode,
        size_mode: SizeMode,
        options:   ArchiveOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = match mode {
            ArchiveMode::Read   => File::open(path)?,
            ArchiveMode::Append => OpenOptions::new().read(true).write(true).open(path)?,
            ArchiveMode::Create => OpenOptions::new().read(true).write(true).create(true).truncate(true).open(path)?,
        };
        log::debug!("opened {} in {} mode", path.display(), mode);
        Self::open(file, mode, size_mode, options)
    }
}

impl<S: Read + Write + Seek> Archive<S> {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Wrap an already-open stream.
    ///
    /// `Read` and `Append` load the signature and scan every entry; the
    /// on-disk size mode and CRC setting take precedence over `size_mode`
    /// and `options.write_crc`.  `Create` writes a fresh signature with a
    /// file count of zero.  On failure the stream is dropped.
    pub fn open(mut stream: S, mode: ArchiveMode, size_mode: SizeMode, options: ArchiveOptions) -> Result<Self> {
        let (signature, table) = match mode {
            ArchiveMode::Read | ArchiveMode::Append => {
                let signature = SignatureBlock::load(&mut stream)?;
                let table     = EntryTable::scan(&mut stream, &signature)?;
                log::debug!(
                    "loaded archive: {} entries, size mode {}, crc {}",
                    signature.file_count, signature.size_mode.name(), signature.write_crc
                );
                (signature, table)
            }
            ArchiveMode::Create => {
                let signature = SignatureBlock::new(size_mode, options.write_crc);
                signature.write(&mut stream)?;
                log::debug!("created archive: size mode {}, crc {}", size_mode.name(), options.write_crc);
                (signature, EntryTable::default())
            }
        };

        Ok(Self { stream: Some(stream), signature, table, mode, options })
    }

    // ── Write ─────────────────────────────────────────────────────────────────

    /// Append one entry whose payload is everything from `source`'s current
    /// position to its end.
    ///
    /// Validation (name length, duplicates, payload size) happens before any
    /// byte is written.  The header goes at the end of the entry chain, the
    /// payload follows, the CRC is patched in, and the signature is rewritten
    /// so the new file count is durable.
    pub fn append<R: Read + Seek>(&mut self, name: &str, source: &mut R) -> Result<FileInfo> {
        self.ensure_writable()?;
        check_name(name)?;
        if self.table.contains(name) && !self.options.ignore_errors {
            return Err(ArchiveError::DuplicateEntry(name.to_owned()));
        }

        let start = source.stream_position()?;
        let end   = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(start))?;
        let size = end.saturating_sub(start);

        let size_mode     = self.signature.size_mode;
        let write_crc     = self.signature.write_crc;
        let header_offset = self.table.end_offset();
        let stream        = self.stream.as_mut().ok_or(ArchiveError::ArchiveClosed)?;

        stream.seek(SeekFrom::Start(header_offset))?;
        write_header(&mut *stream, name, 0, size, size_mode)?;
        let copied = copy_payload(&mut *source, &mut *stream, Some(size))?;
        if copied.bytes != size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("source for '{name}' ended after {} of {size} bytes", copied.bytes),
            ).into());
        }

        let crc = if write_crc { copied.crc } else { 0 };
        let info = FileInfo::new(name.as_bytes().to_vec(), crc, size, header_offset, size_mode);
        if write_crc {
            // crc sits between the name and the size field
            stream.seek(SeekFrom::Start(header_offset + 1 + name.len() as u64))?;
            stream.write_all(&crc.to_le_bytes())?;
        }

        self.signature.file_count += 1;
        self.signature.write(&mut *stream)?;
        self.table.push(info.clone());

        log::debug!("appended '{}' ({} bytes) at {}", info.name, info.size, info.header_offset);
        Ok(info)
    }

    pub fn append_bytes(&mut self, name: &str, data: &[u8]) -> Result<FileInfo> {
        self.append(name, &mut Cursor::new(data))
    }

    /// Append a file or, recursively, every file below a directory.
    ///
    /// Entries are appended in sorted path order.  With
    /// `options.ignore_errors` a failing file, or a directory entry the walk
    /// cannot read, is recorded in the report and skipped; otherwise the
    /// first failure aborts, keeping earlier entries.
    pub fn add<P: AsRef<Path>>(&mut self, source: P, options: &ArchiveOptions) -> Result<BatchReport> {
        self.ensure_writable()?;
        let sources = collect_sources(source.as_ref(), options.only_names)?;
        let bar     = progress_bar(sources.len() as u64, options.verbose);
        let mut report = BatchReport::default();

        for slot in sources {
            let src = match slot {
                Ok(src) => src,
                Err(skipped) if options.ignore_errors => {
                    log::warn!("skipping {}: {}", skipped.name, skipped.error);
                    report.skipped.push(skipped);
                    bar.inc(1);
                    continue;
                }
                Err(skipped) => {
                    bar.abandon();
                    return Err(skipped.error);
                }
            };
            bar.set_message(src.name.clone());
            let result = File::open(&src.path)
                .map_err(ArchiveError::from)
                .and_then(|mut f| self.append(&src.name, &mut f));
            match result {
                Ok(info) => {
                    if options.verbose {
                        log::info!("added {} ({} bytes)", info.name, info.size);
                    }
                    report.entries.push(info);
                }
                Err(error) if options.ignore_errors => {
                    log::warn!("skipping {}: {}", src.path.display(), error);
                    report.skipped.push(SkippedEntry { name: src.name, error });
                }
                Err(error) => {
                    bar.abandon();
                    return Err(error);
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        Ok(report)
    }

    /// Overwrite the reserved general purpose field.  Persisted on the next
    /// flush, append or close.
    pub fn set_general_purpose(&mut self, value: u32) -> Result<()> {
        self.ensure_writable()?;
        self.signature.general_purpose = value;
        Ok(())
    }

    // ── Read ──────────────────────────────────────────────────────────────────

    /// Copy the payload of `info` into `sink`, returning the byte count.
    ///
    /// With checks enabled on a CRC-carrying archive, a checksum mismatch
    /// fails with [`ArchiveError::CrcMismatch`] after `sink` has already
    /// received the bytes; the caller must discard them.
    pub fn read<W: Write>(&mut self, info: &FileInfo, sink: W) -> Result<u64> {
        let verify = self.options.checks_enabled;
        self.read_checked(info, sink, verify)
    }

    pub fn read_to_vec(&mut self, info: &FileInfo) -> Result<Vec<u8>> {
        // size comes from disk; grow as bytes actually arrive
        let mut out = Vec::with_capacity(info.size.min(BUFFER_SIZE as u64) as usize);
        self.read(info, &mut out)?;
        Ok(out)
    }

    pub fn read_by_name<W: Write>(&mut self, name: &str, sink: W) -> Result<u64> {
        let info = self.file_info(name)?.clone();
        self.read(&info, sink)
    }

    fn read_checked<W: Write>(&mut self, info: &FileInfo, sink: W, verify: bool) -> Result<u64> {
        let write_crc = self.signature.write_crc;
        let stream    = self.stream.as_mut().ok_or(ArchiveError::ArchiveClosed)?;

        stream.seek(SeekFrom::Start(info.data_offset))?;
        let copied = copy_payload(&mut *stream, sink, Some(info.size))?;
        if copied.bytes != info.size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("payload of '{}' ended after {} of {} bytes", info.name, copied.bytes, info.size),
            ).into());
        }
        if verify && write_crc && copied.crc != info.crc {
            return Err(ArchiveError::CrcMismatch {
                name:     info.name.clone(),
                stored:   info.crc,
                computed: copied.crc,
            });
        }
        Ok(copied.bytes)
    }

    /// Read every entry through the checksum path, whatever the handle's
    /// check setting.  Returns the number of entries verified.
    pub fn validate(&mut self) -> Result<u64> {
        self.ensure_open()?;
        let infos: Vec<FileInfo> = self.table.entries().cloned().collect();
        for info in &infos {
            self.read_checked(info, io::sink(), true)?;
        }
        Ok(infos.len() as u64)
    }

    /// Extract entries below `dest`, creating it if necessary.
    ///
    /// `subset` selects entries by name (default: all, in archive order).
    /// Each entry is written completely or removed again; entries extracted
    /// before a failure stay on disk.  `options.only_names` reports the
    /// selection without writing anything.
    pub fn extract<P: AsRef<Path>>(
        &mut self,
        dest:    P,
        subset:  Option<&[&str]>,
        options: &ArchiveOptions,
    ) -> Result<BatchReport> {
        self.ensure_open()?;
        let dest = dest.as_ref();
        if !options.only_names && !dest.exists() {
            fs::create_dir_all(dest)?;
        }

        let selection: Vec<(String, Result<FileInfo>)> = match subset {
            Some(names) => names.iter()
                .map(|n| (n.to_string(), self.table.find(n).cloned()))
                .collect(),
            None => self.table.entries()
                .map(|i| (i.name.clone(), Ok(i.clone())))
                .collect(),
        };

        let bar = progress_bar(selection.len() as u64, options.verbose);
        let mut report = BatchReport::default();

        for (name, info) in selection {
            bar.set_message(name.clone());
            let result = info.and_then(|info| {
                if !options.only_names {
                    self.extract_one(dest, &info)?;
                }
                Ok(info)
            });
            match result {
                Ok(info) => {
                    if options.verbose || options.only_names {
                        log::info!("{} ({} bytes)", info.name, info.size);
                    }
                    report.entries.push(info);
                }
                Err(error) if options.ignore_errors => {
                    log::warn!("skipping {}: {}", name, error);
                    report.skipped.push(SkippedEntry { name, error });
                }
                Err(error) => {
                    bar.abandon();
                    return Err(error);
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
        Ok(report)
    }

    fn extract_one(&mut self, dest: &Path, info: &FileInfo) -> Result<()> {
        let name   = info.name_str().ok_or(ArchiveError::InvalidName { offset: info.header_offset })?;
        let target = extract_path(dest, name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let result = File::create(&target)
            .map_err(ArchiveError::from)
            .and_then(|file| {
                let mut out = BufWriter::new(file);
                self.read(info, &mut out)?;
                out.flush()?;
                Ok(())
            });
        if result.is_err() {
            let _ = fs::remove_file(&target);
        }
        result
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    pub fn file_info(&self, name: &str) -> Result<&FileInfo> {
        self.ensure_open()?;
        self.table.find(name)
    }

    pub fn list_names(&self) -> Result<impl Iterator<Item = &str> + '_> {
        self.ensure_open()?;
        Ok(self.table.names())
    }

    pub fn list_file_infos(&self) -> Result<impl Iterator<Item = &FileInfo> + '_> {
        self.ensure_open()?;
        Ok(self.table.entries())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Persist the signature block (writable modes) and flush the stream.
    pub fn flush(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(ArchiveError::ArchiveClosed)?;
        if self.mode.is_writable() {
            self.signature.write(&mut *stream)?;
            stream.flush()?;
        }
        Ok(())
    }

    /// Flush and release the stream.  A second call fails with
    /// [`ArchiveError::ArchiveClosed`].
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.stream = None;
        log::debug!("archive closed with {} entries", self.signature.file_count);
        Ok(())
    }

    /// Flush, close the handle and hand the stream back.
    pub fn into_inner(mut self) -> Result<S> {
        self.flush()?;
        self.stream.take().ok_or(ArchiveError::ArchiveClosed)
    }

    // ── Metadata ─────────────────────────────────────────────────────────────

    pub fn size_mode(&self) -> SizeMode { self.signature.size_mode }

    pub fn file_count(&self) -> u64 { self.signature.file_count }

    pub fn max_filesize(&self) -> u64 { self.signature.size_mode.max_value() }

    pub fn write_crc_enabled(&self) -> bool { self.signature.write_crc }

    pub fn general_purpose(&self) -> u32 { self.signature.general_purpose }

    pub fn closed(&self) -> bool { self.stream.is_none() }

    pub fn mode(&self) -> ArchiveMode { self.mode }

    pub fn options(&self) -> &ArchiveOptions { &self.options }

    pub fn set_checks_enabled(&mut self, enabled: bool) {
        self.options.checks_enabled = enabled;
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn ensure_open(&self) -> Result<()> {
        if self.stream.is_none() {
            return Err(ArchiveError::ArchiveClosed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.mode.is_writable() {
            return Err(ArchiveError::ReadOnlyViolation);
        }
        Ok(())
    }
}

impl<S: Read + Write + Seek> Drop for Archive<S> {
    fn drop(&mut self) {
        if self.stream.is_some() && self.mode.is_writable() {
            if let Err(e) = self.flush() {
                log::warn!("failed to flush archive on drop: {}", e);
            }
        }
    }
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("#."));
    }
    bar
}
