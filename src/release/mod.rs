//! Release records and the version-supersession protocol
//!
//! A release is one named, namespaced bundle of rendered manifests. Every
//! upgrade adds a new version; older versions are kept with status
//! `superseded` so history stays queryable.
//!
//! # Invariants
//!
//! 1. **History is append-only**
//!    - A migration never edits a manifest in place
//!    - The changed manifest lands in version N+1, version N becomes superseded
//!
//! 2. **At most one deployed version per release after a successful migration**
//!
//! # Architecture
//!
//! - **Model**: `Release`, `ReleaseInfo`, `ReleaseStatus`, `ReleaseRef`
//! - **Store**: `ReleaseStore` trait, `FileStore` on-disk implementation
//! - **Supersede**: two-step update/create transition

pub mod store;
pub mod supersede;

pub use store::{FileStore, ReleaseStore};
pub use supersede::supersede;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Description written on every version created by a migration
pub const UPGRADE_DESCRIPTION: &str = "Kubernetes deprecated API upgrade - DO NOT rollback from this version";

/// Identifies a release regardless of version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReleaseRef {
  pub name: String,
  pub namespace: String,
}

impl ReleaseRef {
  pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      namespace: namespace.into(),
    }
  }
}

impl fmt::Display for ReleaseRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.name, self.namespace)
  }
}

/// Lifecycle status of a single release version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
  #[default]
  Unknown,
  /// Current active version
  Deployed,
  Uninstalled,
  /// Replaced by a later version, kept for history
  Superseded,
  Failed,
  Uninstalling,
  PendingInstall,
  PendingUpgrade,
  PendingRollback,
}

impl fmt::Display for ReleaseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ReleaseStatus::Unknown => "unknown",
      ReleaseStatus::Deployed => "deployed",
      ReleaseStatus::Uninstalled => "uninstalled",
      ReleaseStatus::Superseded => "superseded",
      ReleaseStatus::Failed => "failed",
      ReleaseStatus::Uninstalling => "uninstalling",
      ReleaseStatus::PendingInstall => "pending-install",
      ReleaseStatus::PendingUpgrade => "pending-upgrade",
      ReleaseStatus::PendingRollback => "pending-rollback",
    };
    write!(f, "{}", s)
  }
}

/// Deployment metadata for a release version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseInfo {
  pub status: ReleaseStatus,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub first_deployed: Option<DateTime<Utc>>,
  pub last_deployed: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
}

/// One recorded version of a release
///
/// `chart` and `config` are opaque to this tool and carried unchanged into
/// every new version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
  pub name: String,
  pub namespace: String,
  pub version: u32,
  pub info: ReleaseInfo,
  #[serde(default)]
  pub manifest: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub chart: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub config: Option<serde_json::Value>,
}

impl Release {
  /// Version-independent identity
  pub fn release_ref(&self) -> ReleaseRef {
    ReleaseRef::new(&self.name, &self.namespace)
  }

  /// Versioned identifier, `name.v<version>`
  pub fn version_name(&self) -> String {
    format!("{}.v{}", self.name, self.version)
  }

  /// Build the version that supersedes this one.
  ///
  /// Every field is cloned from `self`; only the manifest, version, status,
  /// description and deploy time differ. `None` when the version number is
  /// exhausted.
  pub fn next_version(&self, manifest: impl Into<String>, deployed_at: DateTime<Utc>) -> Option<Release> {
    Some(Release {
      name: self.name.clone(),
      namespace: self.namespace.clone(),
      version: self.version.checked_add(1)?,
      info: ReleaseInfo {
        status: ReleaseStatus::Deployed,
        description: UPGRADE_DESCRIPTION.to_string(),
        first_deployed: self.info.first_deployed,
        last_deployed: deployed_at,
        notes: self.info.notes.clone(),
      },
      manifest: manifest.into(),
      chart: self.chart.clone(),
      config: self.config.clone(),
    })
  }
}
