//! Process-wide download status registry.
//!
//! Maps a generated identifier to the status of one download. Mutated
//! concurrently by download tasks, read by status queries. Created once at
//! startup and handed to call sites behind an `Arc`; no global state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{DownloadRecord, DownloadState};

/// Shared cancellation flag observed cooperatively by a download loop.
///
/// Cancellation is advisory: setting the flag asks the transfer to stop at
/// its next chunk boundary. There is no hard interrupt.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct Entry {
    record: DownloadRecord,
    cancel: CancelFlag,
}

/// Registry of download records keyed by identifier.
///
/// Entries are owned by the download that created them until cancellation,
/// so updates need no coordination beyond the map lock itself. A `cancel`
/// racing an in-flight `update_status` resolves last-write-wins.
#[derive(Debug, Default)]
pub struct DownloadTracker {
    downloads: RwLock<HashMap<String, Entry>>,
}

impl DownloadTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new download in the Pending state.
    ///
    /// Replaces any previous record under the same id, preserving the
    /// one-authoritative-record-per-identifier invariant.
    pub async fn add_download(&self, id: &str, user: &str) -> CancelFlag {
        let cancel = CancelFlag::new();
        let entry = Entry {
            record: DownloadRecord::new(id, user),
            cancel: cancel.clone(),
        };
        let mut downloads = self.downloads.write().await;
        if downloads.insert(id.to_string(), entry).is_some() {
            debug!("Replaced existing download record {}", id);
        }
        cancel
    }

    /// Update byte count and state for a download. Unknown ids are ignored.
    pub async fn update_status(&self, id: &str, bytes_transferred: u64, state: DownloadState) {
        let mut downloads = self.downloads.write().await;
        if let Some(entry) = downloads.get_mut(id) {
            entry.record.bytes_transferred = bytes_transferred;
            entry.record.state = state;
            entry.record.updated_at = chrono::Utc::now();
        }
    }

    /// Record the total size once the retriever has reported one.
    pub async fn set_total_size(&self, id: &str, total: u64) {
        let mut downloads = self.downloads.write().await;
        if let Some(entry) = downloads.get_mut(id) {
            entry.record.total_size = Some(total);
            entry.record.updated_at = chrono::Utc::now();
        }
    }

    /// Get a snapshot of a download record, or `None` for unknown ids.
    pub async fn get_status(&self, id: &str) -> Option<DownloadRecord> {
        let downloads = self.downloads.read().await;
        downloads.get(id).map(|e| e.record.clone())
    }

    /// Request cancellation of an in-flight download; best effort.
    ///
    /// Sets the cooperative flag and marks the record Cancelled. The
    /// transfer observes the flag at its next chunk boundary.
    pub async fn cancel(&self, id: &str) {
        let mut downloads = self.downloads.write().await;
        if let Some(entry) = downloads.get_mut(id) {
            entry.cancel.set();
            entry.record.state = DownloadState::Cancelled;
            entry.record.updated_at = chrono::Utc::now();
        }
    }

    /// Remove a record entirely. Unknown ids are ignored.
    pub async fn remove(&self, id: &str) {
        let mut downloads = self.downloads.write().await;
        downloads.remove(id);
    }

    /// The cancellation flag for a download, if it is still tracked.
    pub async fn cancel_flag(&self, id: &str) -> Option<CancelFlag> {
        let downloads = self.downloads.read().await;
        downloads.get(id).map(|e| e.cancel.clone())
    }

    /// Snapshot of all records, for status listings.
    pub async fn all(&self) -> Vec<DownloadRecord> {
        let downloads = self.downloads.read().await;
        let mut records: Vec<_> = downloads.values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }

    /// Number of tracked downloads.
    pub async fn len(&self) -> usize {
        self.downloads.read().await.len()
    }

    /// Whether the tracker is empty.
    pub async fn is_empty(&self) -> bool {
        self.downloads.read().await.is_empty()
    }

    /// Drop all records, for shutdown.
    pub async fn clear(&self) {
        self.downloads.write().await.clear();
    }

    /// String-keyed status report for one download.
    ///
    /// External tooling polls this shape: `{"status": ..., "bytesTransferred": ...}`.
    pub async fn status_report(&self, id: &str) -> Option<serde_json::Value> {
        let downloads = self.downloads.read().await;
        downloads.get(id).map(|e| {
            json!({
                "status": e.record.state.as_str(),
                "bytesTransferred": e.record.bytes_transferred,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_id_has_no_status() {
        let tracker = DownloadTracker::new();
        assert!(tracker.get_status("nope").await.is_none());
        assert!(tracker.status_report("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_added_download_is_pending() {
        let tracker = DownloadTracker::new();
        tracker.add_download("dl-1", "alice").await;

        let record = tracker.get_status("dl-1").await.unwrap();
        assert_eq!(record.state, DownloadState::Pending);
        assert_eq!(record.user, "alice");
        assert_eq!(record.bytes_transferred, 0);
    }

    #[tokio::test]
    async fn test_update_then_remove() {
        let tracker = DownloadTracker::new();
        tracker.add_download("dl-1", "alice").await;
        tracker
            .update_status("dl-1", 1024, DownloadState::InProgress)
            .await;

        let record = tracker.get_status("dl-1").await.unwrap();
        assert_eq!(record.state, DownloadState::InProgress);
        assert_eq!(record.bytes_transferred, 1024);

        tracker.remove("dl-1").await;
        assert!(tracker.get_status("dl-1").await.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_ignored() {
        let tracker = DownloadTracker::new();
        tracker
            .update_status("ghost", 10, DownloadState::InProgress)
            .await;
        assert!(tracker.is_empty().await);
    }

    #[tokio::test]
    async fn test_cancel_sets_flag_and_state() {
        let tracker = DownloadTracker::new();
        let flag = tracker.add_download("dl-1", "alice").await;
        assert!(!flag.is_set());

        tracker.cancel("dl-1").await;
        assert!(flag.is_set());
        assert_eq!(
            tracker.get_status("dl-1").await.unwrap().state,
            DownloadState::Cancelled
        );
    }

    #[tokio::test]
    async fn test_cancel_then_update_is_last_write_wins() {
        let tracker = DownloadTracker::new();
        tracker.add_download("dl-1", "alice").await;

        tracker.cancel("dl-1").await;
        tracker
            .update_status("dl-1", 500, DownloadState::InProgress)
            .await;

        // The later write wins; the cooperative flag stays set either way.
        let record = tracker.get_status("dl-1").await.unwrap();
        assert_eq!(record.state, DownloadState::InProgress);
        assert_eq!(record.bytes_transferred, 500);
        assert!(tracker.cancel_flag("dl-1").await.unwrap().is_set());
    }

    #[tokio::test]
    async fn test_status_report_shape() {
        let tracker = DownloadTracker::new();
        tracker.add_download("dl-1", "alice").await;
        tracker
            .update_status("dl-1", 2048, DownloadState::InProgress)
            .await;

        let report = tracker.status_report("dl-1").await.unwrap();
        assert_eq!(report["status"], "IN_PROGRESS");
        assert_eq!(report["bytesTransferred"], 2048);
    }

    #[tokio::test]
    async fn test_re_add_replaces_record() {
        let tracker = DownloadTracker::new();
        tracker.add_download("dl-1", "alice").await;
        tracker
            .update_status("dl-1", 99, DownloadState::Failed)
            .await;

        tracker.add_download("dl-1", "bob").await;
        let record = tracker.get_status("dl-1").await.unwrap();
        assert_eq!(record.user, "bob");
        assert_eq!(record.state, DownloadState::Pending);
        assert_eq!(tracker.len().await, 1);
    }
}
