//! Resource retrieval.
//!
//! A retriever resolves a resource URI to a byte stream plus metadata.
//! The local variant walks an ordered list of scheme-specific readers;
//! the remote variant delegates to a federated source.

pub mod local;
pub mod readers;
pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ResourceRequest, ResourceResponse};

pub use local::LocalRetriever;
pub use readers::{FileReader, HttpReader, ResourceReader};
pub use remote::{RemoteRetriever, RemoteSource};

/// Errors produced by resource retrieval.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// No registered reader could produce the resource.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The scheme is recognized but this resource cannot be produced.
    #[error("resource not supported: {0}")]
    NotSupported(String),

    /// Transient I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches resource bytes for a given URI.
#[async_trait]
pub trait ResourceRetriever: Send + Sync {
    /// Retrieve the resource named by the request.
    async fn retrieve(&self, request: &ResourceRequest)
        -> Result<ResourceResponse, RetrievalError>;
}
