//! courier — resource retrieval and download tracking.
//!
//! Resolves resource URIs to byte streams through an ordered list of
//! scheme-specific readers (or a federated remote source) and tracks every
//! download in a process-wide status registry.

pub mod cli;
pub mod config;
pub mod models;
pub mod net;
pub mod retriever;
pub mod services;
pub mod tracker;
pub mod utils;
