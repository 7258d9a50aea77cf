//! Filesystem side of `add` and `extract`.
//!
//! Source enumeration walks directories with `walkdir`; extraction paths are
//! checked so an entry name can never land outside the destination.

use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::SkippedEntry;
use crate::error::{ArchiveError, Result};

/// One slot of a source walk: a file to append, or the entry the walk
/// failed on.
pub type WalkResult = std::result::Result<SourceFile, SkippedEntry>;

/// A file on disk paired with the entry name it will be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub name: String,
}

/// Enumerate the files under `root` in a stable (sorted) order.
///
/// A single file keeps the path it was given as its name.  Files found in a
/// directory are named relative to that directory with `/` separators.
/// `only_names` replaces either form with the bare file name.
///
/// Only a missing root fails the whole call.  A directory entry the walk
/// cannot read (a dangling symlink, a permission error) comes back as an
/// `Err` in its own slot, so the caller decides whether to skip it.
pub fn collect_sources(root: &Path, only_names: bool) -> Result<Vec<WalkResult>> {
    if root.is_file() {
        let name = if only_names { base_name(root) } else { root.to_string_lossy().into_owned() };
        return Ok(vec![Ok(SourceFile { path: root.to_path_buf(), name })]);
    }
    if !root.is_dir() {
        return Err(io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", root.display())).into());
    }

    let name_of = |path: &Path| if only_names { base_name(path) } else { relative_name(root, path) };

    let mut sources = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let name = err.path().map(name_of).unwrap_or_else(|| root.to_string_lossy().into_owned());
                let error = ArchiveError::Io(io::Error::from(err));
                sources.push(Err(SkippedEntry { name, error }));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        sources.push(Ok(SourceFile { path: path.to_path_buf(), name: name_of(path) }));
    }
    Ok(sources)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Resolve an entry name below `dest`, rejecting absolute names and any
/// `..` component.
pub fn extract_path(dest: &Path, name: &str) -> Result<PathBuf> {
    let rel = Path::new(name);
    let mut out = dest.to_path_buf();
    let mut pushed = false;
    for component in rel.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArchiveError::UnsafeEntryPath(name.to_owned()));
            }
        }
    }
    if !pushed {
        return Err(ArchiveError::UnsafeEntryPath(name.to_owned()));
    }
    Ok(out)
}
