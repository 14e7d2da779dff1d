//! Deprecated Kubernetes API mapping
//!
//! Rewrites release manifests using a mapping file of
//! `deprecatedAPI -> newAPI` text fragments. The migration only depends on the
//! `ManifestRewriter` trait; `MapFileRewriter` is the implementation the CLI
//! uses.
//!
//! A mapping is applied only when the target cluster version has reached the
//! mapping's deprecation (or removal) version. With no target version known,
//! every mapping applies.

pub mod mapfile;

pub use mapfile::MapFile;

use crate::core::config::ClusterConfig;
use crate::core::error::{MappingError, RailResult};
use std::path::Path;
use tracing::{debug, info};

/// Rewrites one manifest.
///
/// Returning the input unchanged means there was nothing to migrate; an error
/// means the rewrite could not be evaluated.
pub trait ManifestRewriter {
  fn rewrite(&self, manifest: &str, map_file: &Path, cluster: &ClusterConfig) -> RailResult<String>;
}

/// Rewriter backed by a YAML mapping file, loaded on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct MapFileRewriter;

impl ManifestRewriter for MapFileRewriter {
  fn rewrite(&self, manifest: &str, map_file: &Path, cluster: &ClusterConfig) -> RailResult<String> {
    let map = MapFile::load(map_file)?;
    apply_mappings(manifest, &map, cluster.kube_version.as_deref())
  }
}

/// Apply every mapping of `map` to `manifest`, in file order
pub fn apply_mappings(manifest: &str, map: &MapFile, kube_version: Option<&str>) -> RailResult<String> {
  let target = kube_version.and_then(parse_kube_version);
  let mut modified = manifest.to_string();

  for mapping in &map.mappings {
    let api = mapping.deprecated_api.replace('\n', " ");
    let gate = mapping
      .gating_version()
      .and_then(parse_kube_version)
      .ok_or_else(|| MappingError::MissingVersion { api: api.trim().to_string() })?;

    let count = modified.matches(mapping.deprecated_api.as_str()).count();
    if count == 0 {
      continue;
    }

    if let Some(target) = &target
      && gate > *target
    {
      debug!(
        api = %api.trim(),
        kube_version = %target,
        "API does not require mapping as it is not deprecated or removed in this Kubernetes version"
      );
      continue;
    }

    if mapping.has_successor() {
      info!(
        count,
        api = %api.trim(),
        new_api = %mapping.new_api.replace('\n', " ").trim(),
        "Found deprecated or removed Kubernetes API, mapping to supported API"
      );
      modified = modified.replace(mapping.deprecated_api.as_str(), &mapping.new_api);
    } else {
      info!(
        count,
        api = %api.trim(),
        "Found deprecated or removed Kubernetes API with no successor, removing resource"
      );
      modified = remove_documents_containing(&modified, &mapping.deprecated_api);
    }
  }

  Ok(modified)
}

/// Parse `v1.22`, `1.22.3`, `v1.25.3+k3s1` style versions
pub fn parse_kube_version(raw: &str) -> Option<semver::Version> {
  let trimmed = raw.trim();
  let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
  let core = trimmed.split(['-', '+']).next().unwrap_or_default();

  let mut parts = core.split('.');
  let major = parts.next()?.parse().ok()?;
  let minor = parts.next().map(|p| p.parse()).transpose().ok()?.unwrap_or(0);
  let patch = parts.next().map(|p| p.parse()).transpose().ok()?.unwrap_or(0);
  if parts.next().is_some() {
    return None;
  }

  Some(semver::Version::new(major, minor, patch))
}

/// Drop every YAML document (delimited by `---` lines) that contains `api`
fn remove_documents_containing(manifest: &str, api: &str) -> String {
  let mut out = String::with_capacity(manifest.len());
  for doc in split_documents(manifest) {
    if !doc.contains(api) {
      out.push_str(doc);
    }
  }
  out
}

/// Split into documents; every document after the first starts with its
/// `---` separator line.
fn split_documents(manifest: &str) -> Vec<&str> {
  let starts: Vec<usize> = manifest
    .match_indices("---\n")
    .map(|(idx, _)| idx)
    .filter(|&idx| idx == 0 || manifest.as_bytes()[idx - 1] == b'\n')
    .collect();

  let mut docs = Vec::with_capacity(starts.len() + 1);
  let mut prev = 0;
  for start in starts {
    docs.push(&manifest[prev..start]);
    prev = start;
  }
  docs.push(&manifest[prev..]);
  docs
}
