//! Download record and lifecycle state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadState {
    /// Registered but no bytes transferred yet.
    Pending,
    /// Bytes are actively being transferred.
    InProgress,
    /// All bytes transferred successfully.
    Completed,
    /// Cancelled by the owner; terminal.
    Cancelled,
    /// Retrieval or write failed; terminal.
    Failed,
}

impl DownloadState {
    /// Whether this state is terminal (no further transitions expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DownloadState::Completed | DownloadState::Cancelled | DownloadState::Failed
        )
    }

    /// Wire name used in status reports (`COMPLETED`, `IN_PROGRESS`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::Pending => "PENDING",
            DownloadState::InProgress => "IN_PROGRESS",
            DownloadState::Completed => "COMPLETED",
            DownloadState::Cancelled => "CANCELLED",
            DownloadState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for DownloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracked state of one in-flight or completed resource fetch.
///
/// There is at most one authoritative record per identifier; the tracker
/// owns the map, download tasks mutate their own entry through it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Opaque identifier generated when the fetch begins.
    pub id: String,
    /// User that initiated the download.
    pub user: String,
    /// Current lifecycle state.
    pub state: DownloadState,
    /// Bytes transferred so far.
    pub bytes_transferred: u64,
    /// Total resource size, when the retriever could determine it.
    pub total_size: Option<u64>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl DownloadRecord {
    /// Create a fresh record in the Pending state.
    pub fn new(id: &str, user: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            user: user.to_string(),
            state: DownloadState::Pending,
            bytes_transferred: 0,
            total_size: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fraction of the download completed, if the total size is known.
    pub fn progress(&self) -> Option<f64> {
        self.total_size.filter(|t| *t > 0).map(|total| {
            (self.bytes_transferred as f64 / total as f64).min(1.0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_pending() {
        let record = DownloadRecord::new("abc", "alice");
        assert_eq!(record.state, DownloadState::Pending);
        assert_eq!(record.bytes_transferred, 0);
        assert!(record.total_size.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(DownloadState::Completed.is_terminal());
        assert!(DownloadState::Cancelled.is_terminal());
        assert!(DownloadState::Failed.is_terminal());
        assert!(!DownloadState::Pending.is_terminal());
        assert!(!DownloadState::InProgress.is_terminal());
    }

    #[test]
    fn test_progress_fraction() {
        let mut record = DownloadRecord::new("abc", "alice");
        assert!(record.progress().is_none());

        record.total_size = Some(200);
        record.bytes_transferred = 50;
        assert_eq!(record.progress(), Some(0.25));
    }

    #[test]
    fn test_state_wire_names() {
        assert_eq!(DownloadState::InProgress.as_str(), "IN_PROGRESS");
        assert_eq!(
            serde_json::to_value(DownloadState::Cancelled).unwrap(),
            serde_json::json!("CANCELLED")
        );
    }
}
