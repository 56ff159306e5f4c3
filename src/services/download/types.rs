//! Download service types and events.

use std::path::PathBuf;

use crate::models::DownloadState;

/// Events emitted during download operations.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// Retrieval started for a URI
    Started {
        id: String,
        uri: String,
        name: String,
    },
    /// Progress update (bytes transferred so far)
    Progress {
        id: String,
        bytes: u64,
        total: Option<u64>,
    },
    /// Download completed successfully
    Completed { id: String, path: PathBuf },
    /// Download stopped at a chunk boundary after a cancel request
    Cancelled { id: String },
    /// Download failed
    Failed { id: String, error: String },
}

/// Final state of a single fetch.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub id: String,
    pub state: DownloadState,
    pub bytes_transferred: u64,
    /// Destination path, present only on completion.
    pub path: Option<PathBuf>,
}

/// Aggregate result of a multi-URI fetch.
#[derive(Debug, Default)]
pub struct FetchSummary {
    pub completed: usize,
    pub cancelled: usize,
    pub failed: usize,
}

/// Configuration for the download service.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Read-buffer size; cancellation is observed at these boundaries.
    pub chunk_size: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { chunk_size: 64 * 1024 }
    }
}
