//! Open modes and the option record built from the construction flag byte.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    /// Load and scan; writes are rejected.
    Read,
    /// Load and scan, then accept appends.
    Append,
    /// Write a fresh signature, then behave like `Append`.
    Create,
}

impl ArchiveMode {
    #[inline]
    pub fn is_writable(self) -> bool {
        !matches!(self, ArchiveMode::Read)
    }
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArchiveMode::Read   => "read",
            ArchiveMode::Append => "append",
            ArchiveMode::Create => "create",
        };
        f.write_str(s)
    }
}

/// Behaviour switches for one archive handle.
///
/// Only `write_crc` reaches the disk (it mirrors into the signature block of
/// a newly created archive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub verbose:        bool,
    /// `add`: store basenames only.  `extract`: report entries, copy nothing.
    pub only_names:     bool,
    /// Batch operations skip failing entries instead of aborting.
    pub ignore_errors:  bool,
    pub write_crc:      bool,
    pub checks_enabled: bool,
}

impl ArchiveOptions {
    pub const VERBOSE:        u8 = 0b0000_0001;
    pub const ONLY_NAMES:     u8 = 0b0000_0010;
    pub const IGNORE_ERRORS:  u8 = 0b0000_0100;
    pub const WRITE_CRC:      u8 = 0b0000_1000;
    pub const DISABLE_CHECKS: u8 = 0b0001_0000;

    /// Parse the raw flag byte.  Unknown bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            verbose:        bits & Self::VERBOSE != 0,
            only_names:     bits & Self::ONLY_NAMES != 0,
            ignore_errors:  bits & Self::IGNORE_ERRORS != 0,
            write_crc:      bits & Self::WRITE_CRC != 0,
            checks_enabled: bits & Self::DISABLE_CHECKS == 0,
        }
    }

    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.verbose         { bits |= Self::VERBOSE; }
        if self.only_names      { bits |= Self::ONLY_NAMES; }
        if self.ignore_errors   { bits |= Self::IGNORE_ERRORS; }
        if self.write_crc       { bits |= Self::WRITE_CRC; }
        if !self.checks_enabled { bits |= Self::DISABLE_CHECKS; }
        bits
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::from_bits(Self::WRITE_CRC)
    }
}
