//! Integration tests for kube-remap

mod helpers;
mod test_map;
