use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::catalog::{self, Selection, SelectionError};

/// Base URL of the mirrored site.
pub const DEFAULT_BASE_URL: &str = "https://www.joelsornette.fr/";

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mirror the latest version of each selected chapter.
    Lessons(LessonsArgs),
    /// Read or mirror the themed archive indexes.
    Archives {
        #[command(subcommand)]
        command: ArchivesCommand,
    },
    /// Mirror the still-hosted older versions of each selected chapter.
    Versions(VersionsArgs),
}

#[derive(Debug, Subcommand)]
pub enum ArchivesCommand {
    /// Print an archive index as JSON without downloading anything.
    List(ArchiveListArgs),
    /// Download every document of an archive index into themed directories.
    Download(ArchiveDownloadArgs),
}

/// Which archive index to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArchiveKind {
    /// Corrected exercise sheets.
    Exercises,
    /// Archived course texts.
    Lessons,
}

#[derive(Debug, Args)]
pub struct LessonsArgs {
    /// Output directory for the mirrored books.
    #[arg(long)]
    pub out: String,

    /// Restrict to `BOOK[:CHAPTERS]`, e.g. `A` or `B:1,4-6` (repeatable; default: everything).
    #[arg(long)]
    pub only: Vec<String>,

    /// Site to mirror.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Delay before each request (politeness).
    #[arg(long, default_value_t = 200)]
    pub delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct ArchiveListArgs {
    /// Archive index to read.
    #[arg(long, value_enum)]
    pub kind: ArchiveKind,

    /// Site to mirror.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct ArchiveDownloadArgs {
    /// Output directory for the themed tree.
    #[arg(long)]
    pub out: String,

    /// Archive index to mirror.
    #[arg(long, value_enum)]
    pub kind: ArchiveKind,

    /// Site to mirror.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Delay before each request (politeness).
    #[arg(long, default_value_t = 200)]
    pub delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct VersionsArgs {
    /// Output directory for the mirrored books.
    #[arg(long)]
    pub out: String,

    /// Restrict to `BOOK[:CHAPTERS]`, e.g. `A` or `B:1,4-6` (repeatable; default: everything).
    #[arg(long)]
    pub only: Vec<String>,

    /// Maximum concurrent version probes.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Site to mirror.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Delay before each request (politeness).
    #[arg(long, default_value_t = 200)]
    pub delay_ms: u64,
}

/// Resolve repeated `--only` specs; no specs selects the full catalog.
pub fn selection_from(only: &[String]) -> Result<Selection, SelectionError> {
    if only.is_empty() {
        Ok(catalog::full_catalog())
    } else {
        catalog::parse_selection(only)
    }
}
