//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Replace album copies with links to the per-year copy
//! gphotos-dedupe ~/Takeout/Google\ Photos
//!
//! # See what would change first
//! gphotos-dedupe --dry-run ~/Takeout/Google\ Photos
//!
//! # Takeout exported in another language
//! gphotos-dedupe --marker "Fotos de" ~/Takeout/Google\ Fotos
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

/// Replace duplicate photos in a Google Photos Takeout export with symlinks.
///
/// Every file under PATH is fingerprinted with MD5. For each set of identical
/// files one copy is kept (preferring a "Photos from YYYY" folder) and the
/// others become relative symbolic links to it.
#[derive(Debug, Parser)]
#[command(name = "gphotos-dedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directory of the Takeout export
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Parent-folder substring marking the copy to keep
    #[arg(short, long, value_name = "TEXT")]
    pub marker: Option<String>,

    /// Report planned links without modifying anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Abort the scan on the first unreadable file
    #[arg(long)]
    pub strict: bool,

    /// Ignore dot-files and dot-directories
    #[arg(long)]
    pub skip_hidden: bool,

    /// Ignore zero-length files
    #[arg(long)]
    pub skip_empty: bool,

    /// Do not re-check size and mtime before replacing a file
    #[arg(long)]
    pub no_verify: bool,

    /// Read settings from this JSON file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Merge these flags over settings loaded from a config file.
    ///
    /// Flags can only switch options on; `--marker` replaces the file value.
    #[must_use]
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(marker) = &self.marker {
            config.marker.clone_from(marker);
        }
        config.skip_hidden |= self.skip_hidden;
        config.skip_empty |= self.skip_empty;
        if self.no_verify {
            config.verify_before_replace = false;
        }
        config
    }

    /// Whether progress bars should be drawn.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}
