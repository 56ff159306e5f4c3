//! Scheme-specific resource readers.

mod file;
mod http;

use async_trait::async_trait;

use crate::models::{ResourceRequest, ResourceResponse};

pub use file::FileReader;
pub use http::HttpReader;

/// One candidate producer of resource bytes for a set of URI schemes.
///
/// Readers are registered in an ordered list; the first reader to return
/// `Ok(Some(..))` wins. `Ok(None)` means "cannot produce this resource,
/// try the next reader"; an `Err` is logged and treated the same way.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Short name used in logs and aggregate error messages.
    fn name(&self) -> &str;

    /// Whether this reader handles the given URI scheme.
    fn supports_scheme(&self, scheme: &str) -> bool;

    /// Attempt to produce the resource.
    async fn read(&self, request: &ResourceRequest) -> anyhow::Result<Option<ResourceResponse>>;
}
