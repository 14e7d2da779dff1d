//! Shared building blocks for kube-remap
//!
//! - **config**: Flag, environment and kube-remap.toml resolution into `MapOptions`
//! - **error**: Error types with exit codes and contextual help messages

pub mod config;
pub mod error;
