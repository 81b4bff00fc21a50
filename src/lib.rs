//! gphotos-dedupe - reclaim space in Google Photos Takeout exports
//!
//! A Takeout export stores each photo once in its per-year folder
//! (`Photos from 2019`) and again in every album that contains it. This
//! crate fingerprints every file with MD5, groups identical files, keeps the
//! per-year copy of each group and replaces the others with relative
//! symbolic links.
//!
//! The pipeline is:
//! 1. [`scanner`] walks the tree (sorted, symlinks skipped) and hashes files
//! 2. [`duplicates`] groups by fingerprint and picks the canonical copy
//! 3. [`actions`] swaps each redundant copy for a link

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{deduplicate, LinkConfig};
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{CanonicalPolicy, DuplicateFinder, FinderConfig, FinderError};
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::scanner::WalkerConfig;

/// Message printed when the root is not a directory.
pub const NOT_A_DIRECTORY_MESSAGE: &str = "The provided path is not a directory.";

/// Run one deduplication pass as described by `cli`.
///
/// # Errors
///
/// Fails when an explicit config file cannot be loaded, when the scan
/// aborts in strict mode, or on unexpected I/O errors. Per-file failures are
/// reported through the returned [`ExitCode::PartialSuccess`] instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging_with_color(cli.verbose, cli.quiet, !cli.no_color);

    let file_config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let config = cli.apply_to(file_config);
    log::debug!(
        "Effective configuration: {:?} (log level {})",
        config,
        logging::current_level_name()
    );

    if !cli.path.is_dir() {
        println!("{NOT_A_DIRECTORY_MESSAGE}");
        return Ok(ExitCode::Success);
    }

    let handler = signal::install_handler();
    let progress = Arc::new(Progress::new(!cli.show_progress()).with_color(!cli.no_color));

    let walker_config = WalkerConfig::new(config.skip_hidden, config.skip_empty);
    let finder_config = FinderConfig::default()
        .with_strict(cli.strict)
        .with_walker_config(walker_config)
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress.clone());

    say(&cli, "Scanning files and grouping by MD5 hash...");
    let scan = DuplicateFinder::new(finder_config).find_duplicates(&cli.path);
    let (groups, summary) = match scan {
        Ok(result) => result,
        Err(FinderError::Interrupted) => {
            eprintln!("Scan interrupted; nothing was changed.");
            return Ok(ExitCode::Interrupted);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Scan of {} failed", cli.path.display()))
        }
    };

    for error in &summary.scan_errors {
        log::debug!("Scan error: {}", error);
    }

    if groups.is_empty() {
        say(&cli, "No duplicate files found.");
        return Ok(if summary.scan_errors.is_empty() {
            ExitCode::NoDuplicates
        } else {
            ExitCode::PartialSuccess
        });
    }

    say(&cli, "Replacing album copies with symbolic links...");
    let policy = CanonicalPolicy::new(config.marker.as_str());
    let link_config = LinkConfig::default()
        .with_dry_run(cli.dry_run)
        .with_verify_unchanged(config.verify_before_replace)
        .with_shutdown_flag(handler.get_flag());
    let report = deduplicate(&groups, &policy, &link_config, Some(progress.as_ref()));

    for (path, error) in &report.failures {
        eprintln!("Error replacing {}: {}", path.display(), error);
    }
    say(&cli, &report.summary());

    if report.interrupted {
        return Ok(ExitCode::Interrupted);
    }

    say(&cli, "Cleanup complete.");

    if report.all_succeeded() && summary.scan_errors.is_empty() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::PartialSuccess)
    }
}

fn say(cli: &Cli, message: &str) {
    if !cli.quiet {
        println!("{message}");
    }
}
