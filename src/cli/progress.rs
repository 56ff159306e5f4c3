//! Progress bar display for download events.

use std::collections::HashMap;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::services::DownloadEvent;

/// Renders one progress bar per in-flight download.
pub struct ProgressDisplay {
    multi: MultiProgress,
    bars: HashMap<String, ProgressBar>,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: HashMap::new(),
        }
    }

    fn sized_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{msg:30!} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
    }

    fn unsized_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:30!} {spinner} {bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Update the display from one event.
    pub fn handle(&mut self, event: &DownloadEvent) {
        match event {
            DownloadEvent::Started { id, name, .. } => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(Self::unsized_style());
                bar.set_message(name.clone());
                self.bars.insert(id.clone(), bar);
            }
            DownloadEvent::Progress { id, bytes, total } => {
                if let Some(bar) = self.bars.get(id) {
                    if let Some(total) = total {
                        if bar.length().is_none() {
                            bar.set_style(Self::sized_style());
                            bar.set_length(*total);
                        }
                    }
                    bar.set_position(*bytes);
                }
            }
            DownloadEvent::Completed { id, .. } => {
                if let Some(bar) = self.bars.remove(id) {
                    bar.finish();
                }
            }
            DownloadEvent::Cancelled { id } => {
                if let Some(bar) = self.bars.remove(id) {
                    bar.abandon_with_message("cancelled");
                }
            }
            DownloadEvent::Failed { id, error } => {
                if let Some(bar) = self.bars.remove(id) {
                    bar.abandon_with_message(format!("failed: {error}"));
                }
            }
        }
    }
}

impl Default for ProgressDisplay {
    fn default() -> Self {
        Self::new()
    }
}
