//! Core domain types for courier.

mod download;
mod resource;

pub use download::{DownloadRecord, DownloadState};
pub use resource::{ByteStream, ResourceRequest, ResourceResponse};
