//! CLI commands for kube-remap
//!
//! - **map**: Select releases, map deprecated APIs in their manifests and
//!   supersede the changed ones

pub mod map;

pub use map::{print_report, run_map};
