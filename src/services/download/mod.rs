//! Resource download service.
//!
//! Runs each fetch on its own task: retrieves the resource, streams it to
//! disk in chunks, keeps the tracker current, and emits events for progress
//! display. Cancellation is observed cooperatively at chunk boundaries.

mod types;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::{DownloadState, ResourceRequest};
use crate::retriever::ResourceRetriever;
use crate::tracker::DownloadTracker;
use crate::utils::sanitize_filename;

pub use types::{DownloadConfig, DownloadEvent, DownloadOutcome, FetchSummary};

/// Service that retrieves resources and tracks their downloads.
#[derive(Clone)]
pub struct DownloadService {
    retriever: Arc<dyn ResourceRetriever>,
    tracker: Arc<DownloadTracker>,
    config: DownloadConfig,
}

impl DownloadService {
    /// Create a new download service.
    pub fn new(
        retriever: Arc<dyn ResourceRetriever>,
        tracker: Arc<DownloadTracker>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            retriever,
            tracker,
            config,
        }
    }

    /// The tracker this service reports into.
    pub fn tracker(&self) -> &Arc<DownloadTracker> {
        &self.tracker
    }

    /// Fetch one resource to `dest_dir`.
    ///
    /// The outcome always carries the generated download id; failures are
    /// reported through the outcome state, the tracker, and events rather
    /// than an `Err`.
    pub async fn fetch(
        &self,
        request: &ResourceRequest,
        user: &str,
        dest_dir: &Path,
        event_tx: &mpsc::Sender<DownloadEvent>,
    ) -> DownloadOutcome {
        let id = Uuid::new_v4().to_string();
        let cancel = self.tracker.add_download(&id, user).await;

        let response = match self.retriever.retrieve(request).await {
            Ok(r) => r,
            Err(e) => {
                self.tracker
                    .update_status(&id, 0, DownloadState::Failed)
                    .await;
                let _ = event_tx
                    .send(DownloadEvent::Failed {
                        id: id.clone(),
                        error: e.to_string(),
                    })
                    .await;
                return DownloadOutcome {
                    id,
                    state: DownloadState::Failed,
                    bytes_transferred: 0,
                    path: None,
                };
            }
        };

        if let Some(total) = response.size {
            self.tracker.set_total_size(&id, total).await;
        }
        let total = response.size;
        let name = sanitize_filename(&response.name);

        let _ = event_tx
            .send(DownloadEvent::Started {
                id: id.clone(),
                uri: request.uri().to_string(),
                name: name.clone(),
            })
            .await;

        let dest = match self.destination(dest_dir, &name, &id).await {
            Ok(p) => p,
            Err(e) => return self.fail(&id, 0, &e.to_string(), event_tx).await,
        };

        let mut file = match tokio::fs::File::create(&dest).await {
            Ok(f) => f,
            Err(e) => return self.fail(&id, 0, &e.to_string(), event_tx).await,
        };

        let mut stream = response.into_stream();
        let mut buf = vec![0u8; self.config.chunk_size];
        let mut bytes_transferred: u64 = 0;

        loop {
            // Chunk boundary: the only point where cancellation is observed.
            if cancel.is_set() {
                debug!("Download {} cancelled after {} bytes", id, bytes_transferred);
                // A chunk update may have overwritten the Cancelled state set
                // by cancel(); the owning task issues the last write so the
                // record always lands terminal.
                self.tracker
                    .update_status(&id, bytes_transferred, DownloadState::Cancelled)
                    .await;
                drop(file);
                if let Err(e) = tokio::fs::remove_file(&dest).await {
                    warn!("Could not remove partial file {}: {}", dest.display(), e);
                }
                let _ = event_tx.send(DownloadEvent::Cancelled { id: id.clone() }).await;
                return DownloadOutcome {
                    id,
                    state: DownloadState::Cancelled,
                    bytes_transferred,
                    path: None,
                };
            }

            let n = match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&dest).await;
                    return self.fail(&id, bytes_transferred, &e.to_string(), event_tx).await;
                }
            };

            if let Err(e) = file.write_all(&buf[..n]).await {
                drop(file);
                let _ = tokio::fs::remove_file(&dest).await;
                return self.fail(&id, bytes_transferred, &e.to_string(), event_tx).await;
            }

            bytes_transferred += n as u64;
            self.tracker
                .update_status(&id, bytes_transferred, DownloadState::InProgress)
                .await;
            let _ = event_tx
                .send(DownloadEvent::Progress {
                    id: id.clone(),
                    bytes: bytes_transferred,
                    total,
                })
                .await;
        }

        if let Err(e) = file.flush().await {
            let _ = tokio::fs::remove_file(&dest).await;
            return self.fail(&id, bytes_transferred, &e.to_string(), event_tx).await;
        }

        self.tracker
            .update_status(&id, bytes_transferred, DownloadState::Completed)
            .await;
        let _ = event_tx
            .send(DownloadEvent::Completed {
                id: id.clone(),
                path: dest.clone(),
            })
            .await;

        DownloadOutcome {
            id,
            state: DownloadState::Completed,
            bytes_transferred,
            path: Some(dest),
        }
    }

    /// Fetch several resources with a fixed pool of workers.
    pub async fn fetch_all(
        &self,
        requests: Vec<ResourceRequest>,
        user: &str,
        dest_dir: &Path,
        workers: usize,
        event_tx: mpsc::Sender<DownloadEvent>,
    ) -> FetchSummary {
        let queue = Arc::new(Mutex::new(requests.into_iter().collect::<VecDeque<_>>()));
        let completed = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let workers = workers.max(1);
        let mut handles = Vec::with_capacity(workers);

        for _ in 0..workers {
            let service = self.clone();
            let queue = queue.clone();
            let user = user.to_string();
            let dest_dir = dest_dir.to_path_buf();
            let completed = completed.clone();
            let cancelled = cancelled.clone();
            let failed = failed.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::spawn(async move {
                loop {
                    let request = {
                        let mut queue = queue.lock().await;
                        queue.pop_front()
                    };
                    let Some(request) = request else { break };

                    let outcome = service.fetch(&request, &user, &dest_dir, &event_tx).await;
                    match outcome.state {
                        DownloadState::Completed => completed.fetch_add(1, Ordering::Relaxed),
                        DownloadState::Cancelled => cancelled.fetch_add(1, Ordering::Relaxed),
                        _ => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.await;
        }

        FetchSummary {
            completed: completed.load(Ordering::Relaxed),
            cancelled: cancelled.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
        }
    }

    /// Pick a destination path, avoiding clobbering an existing file.
    async fn destination(
        &self,
        dest_dir: &Path,
        name: &str,
        id: &str,
    ) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let candidate = dest_dir.join(name);
        if tokio::fs::try_exists(&candidate).await? {
            // Disambiguate with the download id prefix.
            let short = &id[..8.min(id.len())];
            return Ok(dest_dir.join(format!("{short}-{name}")));
        }
        Ok(candidate)
    }

    async fn fail(
        &self,
        id: &str,
        bytes_transferred: u64,
        error: &str,
        event_tx: &mpsc::Sender<DownloadEvent>,
    ) -> DownloadOutcome {
        warn!("Download {} failed: {}", id, error);
        self.tracker
            .update_status(id, bytes_transferred, DownloadState::Failed)
            .await;
        let _ = event_tx
            .send(DownloadEvent::Failed {
                id: id.to_string(),
                error: error.to_string(),
            })
            .await;
        DownloadOutcome {
            id: id.to_string(),
            state: DownloadState::Failed,
            bytes_transferred,
            path: None,
        }
    }
}
