use clap::{Args, Parser, Subcommand, ValueEnum};
use static_archive::{Archive, ArchiveMode, ArchiveOptions, SizeMode};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "starc", about = "Stacked-entry static archive CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Common {
    /// The archive file
    #[arg(short, long)]
    file: PathBuf,
    /// Size field width in bits for new archives
    #[arg(long, value_enum, default_value = "64")]
    size_mode: SizeBits,
    /// Be verbose
    #[arg(short, long)]
    verbose: bool,
    /// Disable writing a crc32
    #[arg(short = 'r', long)]
    no_crc: bool,
    /// Disable crc32 checks
    #[arg(short = 'c', long)]
    no_checks: bool,
    /// Skip failing entries instead of aborting
    #[arg(short, long)]
    ignore_errors: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SizeBits {
    #[value(name = "16")]
    B16,
    #[value(name = "32")]
    B32,
    #[value(name = "64")]
    B64,
}

impl From<SizeBits> for SizeMode {
    fn from(bits: SizeBits) -> Self {
        match bits {
            SizeBits::B16 => SizeMode::M16,
            SizeBits::B32 => SizeMode::M32,
            SizeBits::B64 => SizeMode::M64,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new archive from a file or directory
    #[command(visible_alias = "c")]
    Create {
        #[command(flatten)]
        common: Common,
        /// Input file or directory
        #[arg(short, long)]
        source: PathBuf,
        /// Store base names only, not relative paths
        #[arg(short, long)]
        names: bool,
        /// Value for the general purpose field
        #[arg(short = 'g', long)]
        general_purpose: Option<u32>,
    },
    /// Append a file or directory to an existing archive
    #[command(visible_alias = "a")]
    Append {
        #[command(flatten)]
        common: Common,
        #[arg(short, long)]
        source: PathBuf,
        #[arg(short, long)]
        names: bool,
        #[arg(short = 'g', long)]
        general_purpose: Option<u32>,
    },
    /// Extract entries into a directory
    #[command(visible_alias = "e")]
    Extract {
        #[command(flatten)]
        common: Common,
        /// Destination directory
        #[arg(short, long)]
        source: PathBuf,
        /// Entries to extract (default: all)
        #[arg(short, long, num_args = 1..)]
        limit: Option<Vec<String>>,
        /// Only report entry names, write nothing
        #[arg(short, long)]
        names: bool,
    },
    /// Show archive metadata and entry names
    #[command(visible_alias = "l")]
    List {
        #[command(flatten)]
        common: Common,
    },
    /// Read every entry and verify its checksum
    #[command(visible_alias = "v")]
    Validate {
        #[command(flatten)]
        common: Common,
    },
}

fn main() -> ExitCode {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    match run(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {

        // ── Create / Append ──────────────────────────────────────────────────
        Commands::Create { common, source, names, general_purpose } => {
            pack(&common, ArchiveMode::Create, &source, names, general_purpose)?;
        }
        Commands::Append { common, source, names, general_purpose } => {
            pack(&common, ArchiveMode::Append, &source, names, general_purpose)?;
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { common, source, limit, names } => {
            let opts   = options(&common, names);
            let mut ar = Archive::open_path(&common.file, ArchiveMode::Read, size_mode(&common), opts)?;
            let subset: Option<Vec<&str>> = limit.as_ref().map(|l| l.iter().map(String::as_str).collect());
            let report = ar.extract(&source, subset.as_deref(), &opts)?;
            ar.close()?;
            log::info!("extracted {} entries to {}", report.entries.len(), source.display());
            for skipped in &report.skipped {
                log::warn!("skipped {}: {}", skipped.name, skipped.error);
            }
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { common } => {
            let ar = Archive::open_path(&common.file, ArchiveMode::Read, size_mode(&common), options(&common, false))?;
            println!("--- STATIC ARCHIVE ---");
            println!("Size Mode: {}", ar.size_mode().name());
            println!("General Purpose Number: {}", ar.general_purpose());
            println!("CRC32: {}", if ar.write_crc_enabled() { "used" } else { "not used" });
            println!("File Count: {}", ar.file_count());
            println!("Maximal Filesize: {}", ar.max_filesize());
            println!("---");
            println!("Files Contained:");
            for info in ar.list_file_infos()? {
                if common.verbose {
                    println!("{:<40} {:>12} {:08x}", info.name, info.size, info.crc);
                } else {
                    println!("{}", info.name);
                }
            }
        }

        // ── Validate ─────────────────────────────────────────────────────────
        Commands::Validate { common } => {
            let mut ar = Archive::open_path(&common.file, ArchiveMode::Read, size_mode(&common), options(&common, false))?;
            let count  = ar.validate()?;
            println!("{}: {} entries OK", common.file.display(), count);
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn pack(
    common:          &Common,
    mode:            ArchiveMode,
    source:          &Path,
    names:           bool,
    general_purpose: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let opts   = options(common, names);
    let mut ar = Archive::open_path(&common.file, mode, size_mode(common), opts)?;
    if let Some(gp) = general_purpose {
        ar.set_general_purpose(gp)?;
    }
    let report = ar.add(source, &opts)?;
    ar.close()?;
    log::info!("{} entries added, archive now holds {}", report.entries.len(), ar.file_count());
    for skipped in &report.skipped {
        log::warn!("skipped {}: {}", skipped.name, skipped.error);
    }
    Ok(())
}

fn options(common: &Common, only_names: bool) -> ArchiveOptions {
    ArchiveOptions {
        verbose:        common.verbose,
        only_names,
        ignore_errors:  common.ignore_errors,
        write_crc:      !common.no_crc,
        checks_enabled: !common.no_checks,
    }
}

fn size_mode(common: &Common) -> SizeMode {
    common.size_mode.into()
}
