//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements both
//! [`ProgressCallback`] (scan phases) and
//! [`LinkProgressCallback`](crate::actions::LinkProgressCallback) (the
//! replacement pass) to display progress bars in the terminal.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::actions::{LinkOutcome, LinkProgressCallback, LinkReport};

/// Scan phase names reported through [`ProgressCallback::on_phase_start`].
pub mod phase {
    /// Directory traversal; total is unknown.
    pub const WALKING: &str = "walking";
    /// Content hashing; total is the number of files found.
    pub const HASHING: &str = "hashing";
}

/// Progress callback for the scan pipeline.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (see [`phase`])
    /// * `total` - Total number of items to process (0 if unknown)
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, providing its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
    linking: Mutex<Option<ProgressBar>>,
    quiet: bool,
    color: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use gphotos_dedupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let multi = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };

        Self {
            multi,
            walking: Mutex::new(None),
            hashing: Mutex::new(None),
            linking: Mutex::new(None),
            quiet,
            color: true,
        }
    }

    /// Enable or disable colored bars.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn spinner_style(&self) -> ProgressStyle {
        let spinner = if self.color { "{spinner:.green}" } else { "{spinner}" };
        ProgressStyle::with_template(&format!("{spinner} {{msg}} [{{elapsed_precise}}] {{pos}} files"))
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style(&self, color: &str) -> ProgressStyle {
        let bar = if self.color {
            format!("{{bar:40.{color}/blue}}")
        } else {
            "{bar:40}".to_string()
        };
        ProgressStyle::with_template(&format!(
            "[{{elapsed_precise}}] [{bar}] {{pos}}/{{len}} ({{percent}}%) {{msg}} (ETA: {{eta}})"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn new_bar(&self, total: usize, style: ProgressStyle, message: &'static str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(style);
        pb.set_message(message);
        pb
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            phase::WALKING => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(self.spinner_style());
                pb.set_message("Walking archive");
                pb.enable_steady_tick(Duration::from_millis(100));
                *lock(&self.walking) = Some(pb);
            }
            phase::HASHING => {
                let pb = self.new_bar(total, self.bar_style("cyan"), "Scanning files");
                *lock(&self.hashing) = Some(pb);
            }
            other => log::debug!("Unknown progress phase: {}", other),
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let message = truncate_path(path, 30);
        if let Some(ref pb) = *lock(&self.hashing) {
            pb.set_position(current as u64);
            pb.set_message(message);
        } else if let Some(ref pb) = *lock(&self.walking) {
            pb.set_position(current as u64);
            pb.set_message(message);
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        match phase {
            phase::WALKING => {
                if let Some(pb) = lock(&self.walking).take() {
                    pb.finish_with_message("Walking complete");
                }
            }
            phase::HASHING => {
                if let Some(pb) = lock(&self.hashing).take() {
                    pb.finish_with_message("Scanning complete");
                }
            }
            _ => {}
        }
    }
}

impl LinkProgressCallback for Progress {
    fn on_before_link(&self, path: &Path, index: usize, total: usize) {
        if self.quiet {
            return;
        }

        let mut linking = lock(&self.linking);
        let pb = linking.get_or_insert_with(|| {
            self.new_bar(total, self.bar_style("green"), "Replacing duplicates")
        });
        pb.set_position(index as u64);
        pb.set_message(truncate_path(&path.to_string_lossy(), 30));
    }

    fn on_link_success(&self, _outcome: &LinkOutcome) {
        if let Some(ref pb) = *lock(&self.linking) {
            pb.inc(1);
        }
    }

    fn on_link_failure(&self, _path: &Path, _error: &str) {
        if let Some(ref pb) = *lock(&self.linking) {
            pb.inc(1);
        }
    }

    fn on_complete(&self, report: &LinkReport) {
        if let Some(pb) = lock(&self.linking).take() {
            pb.finish_with_message(format!("{} replaced", report.success_count()));
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len >= max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
