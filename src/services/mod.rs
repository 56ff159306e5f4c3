//! Service layer for courier business logic.
//!
//! Domain logic separated from UI concerns. Services can be used by the
//! CLI or embedded by other interfaces.

pub mod download;

#[allow(unused_imports)]
pub use download::{DownloadConfig, DownloadEvent, DownloadOutcome, DownloadService, FetchSummary};
