//! Release store abstraction and the on-disk implementation
//!
//! The migration only needs four things from a store: list the current
//! releases, overwrite an existing version, add a new version, and a clock.
//!
//! `FileStore` keeps one JSON record per release version:
//!
//! ```text
//! <root>/
//!   prod/
//!     web.v3.json
//!     web.v4.json
//!   staging/
//!     api.v1.json
//! ```

use crate::core::error::{RailResult, StoreError};
use crate::release::{Release, ReleaseStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Narrow store contract used by the migration
///
/// No locking or optimistic concurrency: callers assume they are the only
/// writer for the duration of a run.
pub trait ReleaseStore {
  /// Latest listable version of every release
  fn list_all(&self) -> RailResult<Vec<Release>>;

  /// Overwrite an existing release version
  fn update(&mut self, release: &Release) -> RailResult<()>;

  /// Add a release version that does not exist yet
  fn create(&mut self, release: &Release) -> RailResult<()>;

  /// Current time, used as the deploy time of new versions
  fn now(&self) -> DateTime<Utc>;
}

/// Directory-backed release store
#[derive(Debug, Clone)]
pub struct FileStore {
  root: PathBuf,
}

impl FileStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path of the record for one release version, always inside `root`
  pub fn record_path(&self, release: &Release) -> RailResult<PathBuf> {
    check_segment("namespace", &release.namespace)?;
    check_segment("name", &release.name)?;
    Ok(
      self
        .root
        .join(&release.namespace)
        .join(format!("{}.json", release.version_name())),
    )
  }

  /// Read every record in the store, in no particular order
  pub fn load_all(&self) -> RailResult<Vec<Release>> {
    let namespaces = fs::read_dir(&self.root).map_err(|e| StoreError::Unavailable {
      root: self.root.clone(),
      reason: e.to_string(),
    })?;

    let mut releases = Vec::new();
    for entry in namespaces {
      let entry = entry.map_err(|e| StoreError::Unavailable {
        root: self.root.clone(),
        reason: e.to_string(),
      })?;
      let ns_path = entry.path();
      if !ns_path.is_dir() {
        continue;
      }

      let records = fs::read_dir(&ns_path).map_err(|e| StoreError::Corrupt {
        path: ns_path.clone(),
        reason: e.to_string(),
      })?;
      for record in records {
        let record = record.map_err(|e| StoreError::Corrupt {
          path: ns_path.clone(),
          reason: e.to_string(),
        })?;
        let path = record.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
          continue;
        }
        releases.push(read_record(&path)?);
      }
    }

    Ok(releases)
  }

  /// Load one specific release version
  #[cfg(test)]
  pub fn get(&self, name: &str, namespace: &str, version: u32) -> RailResult<Release> {
    let path = self.root.join(namespace).join(format!("{}.v{}.json", name, version));
    if !path.exists() {
      return Err(
        StoreError::NotFound {
          version_name: format!("{}.v{}", name, version),
        }
        .into(),
      );
    }
    read_record(&path)
  }

  fn write_record(&self, release: &Release, path: &Path) -> RailResult<()> {
    let write_failed = |reason: String| StoreError::WriteFailed {
      path: path.to_path_buf(),
      reason,
    };

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
    }
    let content = serde_json::to_string_pretty(release).map_err(|e| write_failed(e.to_string()))?;
    fs::write(path, content).map_err(|e| write_failed(e.to_string()))?;
    Ok(())
  }
}

impl ReleaseStore for FileStore {
  /// Latest version of each release, kept only if it is deployed or failed.
  /// Sorted by namespace then name.
  fn list_all(&self) -> RailResult<Vec<Release>> {
    let mut latest: BTreeMap<(String, String), Release> = BTreeMap::new();

    for release in self.load_all()? {
      let key = (release.namespace.clone(), release.name.clone());
      match latest.get(&key) {
        Some(existing) if existing.version >= release.version => {}
        _ => {
          latest.insert(key, release);
        }
      }
    }

    Ok(
      latest
        .into_values()
        .filter(|r| matches!(r.info.status, ReleaseStatus::Deployed | ReleaseStatus::Failed))
        .collect(),
    )
  }

  fn update(&mut self, release: &Release) -> RailResult<()> {
    let path = self.record_path(release)?;
    if !path.exists() {
      return Err(
        StoreError::NotFound {
          version_name: release.version_name(),
        }
        .into(),
      );
    }
    self.write_record(release, &path)
  }

  fn create(&mut self, release: &Release) -> RailResult<()> {
    let path = self.record_path(release)?;
    if path.exists() {
      return Err(
        StoreError::AlreadyExists {
          version_name: release.version_name(),
        }
        .into(),
      );
    }
    self.write_record(release, &path)
  }

  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

fn check_segment(field: &str, value: &str) -> RailResult<()> {
  let invalid = value.is_empty()
    || value == "."
    || value.contains("..")
    || value.contains(['/', '\\'])
    || Path::new(value).is_absolute();
  if invalid {
    return Err(
      StoreError::InvalidName {
        field: field.to_string(),
        value: value.to_string(),
      }
      .into(),
    );
  }
  Ok(())
}

fn read_record(path: &Path) -> RailResult<Release> {
  let content = fs::read_to_string(path).map_err(|e| StoreError::Corrupt {
    path: path.to_path_buf(),
    reason: e.to_string(),
  })?;
  let release: Release = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
    path: path.to_path_buf(),
    reason: e.to_string(),
  })?;
  Ok(release)
}
