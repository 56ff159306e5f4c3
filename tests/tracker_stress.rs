//! Concurrency stress tests for the download tracker.

use std::sync::Arc;

use courier::models::DownloadState;
use courier::tracker::DownloadTracker;

/// N tasks each hammering a distinct id M times must lose no entries and
/// leave every record with the final byte count.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_updates_on_distinct_ids() {
    const TASKS: usize = 32;
    const UPDATES: u64 = 200;

    let tracker = Arc::new(DownloadTracker::new());

    let mut handles = Vec::with_capacity(TASKS);
    for task in 0..TASKS {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("dl-{task}");
            tracker.add_download(&id, "stress").await;
            for step in 1..=UPDATES {
                tracker
                    .update_status(&id, step * 10, DownloadState::InProgress)
                    .await;
            }
            tracker
                .update_status(&id, UPDATES * 10, DownloadState::Completed)
                .await;
        }));
    }

    for handle in handles {
        handle.await.expect("no task may panic");
    }

    assert_eq!(tracker.len().await, TASKS);
    for task in 0..TASKS {
        let record = tracker
            .get_status(&format!("dl-{task}"))
            .await
            .expect("no entry may be lost");
        assert_eq!(record.state, DownloadState::Completed);
        assert_eq!(record.bytes_transferred, UPDATES * 10);
    }
}

/// Concurrent updates on a single shared id must never corrupt the map;
/// the surviving record is whichever write landed last.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_updates_on_shared_id() {
    const TASKS: u64 = 16;
    const UPDATES: u64 = 100;

    let tracker = Arc::new(DownloadTracker::new());
    tracker.add_download("shared", "stress").await;

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            for step in 0..UPDATES {
                tracker
                    .update_status("shared", task * 1000 + step, DownloadState::InProgress)
                    .await;
            }
        }));
    }
    for handle in handles {
        handle.await.expect("no task may panic");
    }

    let record = tracker.get_status("shared").await.unwrap();
    assert_eq!(record.state, DownloadState::InProgress);
    assert!(record.bytes_transferred < TASKS * 1000 + UPDATES);
}

/// Cancels racing status updates resolve last-write-wins and never panic.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn cancel_racing_updates() {
    let tracker = Arc::new(DownloadTracker::new());
    tracker.add_download("race", "stress").await;

    let updater = {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            for step in 0..500u64 {
                tracker
                    .update_status("race", step, DownloadState::InProgress)
                    .await;
            }
        })
    };
    let canceller = {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            tracker.cancel("race").await;
        })
    };

    updater.await.unwrap();
    canceller.await.unwrap();

    // Either the cancel or a later update landed last; both are valid.
    let record = tracker.get_status("race").await.unwrap();
    assert!(matches!(
        record.state,
        DownloadState::Cancelled | DownloadState::InProgress
    ));
    // The cooperative flag is set regardless of which write won.
    assert!(tracker.cancel_flag("race").await.unwrap().is_set());
}
