//! Two-step supersession: retire the current version, install the next one
//!
//! The steps are not atomic. If the create step fails the prior version is
//! already superseded and no deployed version exists; that state is reported
//! to the caller as `SupersedeError::Create` and left for the operator.

use crate::core::error::RailError;
use crate::release::{Release, ReleaseStatus, ReleaseStore};
use std::fmt;
use tracing::info;

/// Failure of one step of the supersession sequence
#[derive(Debug)]
pub enum SupersedeError {
  /// Marking the current version superseded failed; the store is unchanged
  Update { version_name: String, source: RailError },

  /// Creating the next version failed after the current one was superseded
  Create { version_name: String, source: RailError },

  /// The current version is the highest representable one; nothing written
  VersionExhausted { version_name: String },
}

impl SupersedeError {
  /// True when the release was left without a deployed version
  pub fn is_inconsistent(&self) -> bool {
    matches!(self, SupersedeError::Create { .. })
  }
}

impl fmt::Display for SupersedeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SupersedeError::Update { version_name, source } => {
        write!(f, "failed to update release version '{}': {}", version_name, source)
      }
      SupersedeError::Create { version_name, source } => {
        write!(f, "failed to create new release version '{}': {}", version_name, source)
      }
      SupersedeError::VersionExhausted { version_name } => {
        write!(f, "release version '{}' cannot be incremented", version_name)
      }
    }
  }
}

impl std::error::Error for SupersedeError {}

/// Replace `current` with a new deployed version carrying `new_manifest`.
///
/// `current` itself is not modified; the superseded copy written to the store
/// is a clone. Returns the newly created version.
pub fn supersede<S: ReleaseStore + ?Sized>(
  store: &mut S,
  current: &Release,
  new_manifest: &str,
) -> Result<Release, SupersedeError> {
  let mut retired = current.clone();
  retired.info.status = ReleaseStatus::Superseded;

  let next = retired
    .next_version(new_manifest, store.now())
    .ok_or_else(|| SupersedeError::VersionExhausted {
      version_name: retired.version_name(),
    })?;

  info!(version = %retired.version_name(), "Set status of release version to 'superseded'");
  store.update(&retired).map_err(|source| SupersedeError::Update {
    version_name: retired.version_name(),
    source,
  })?;
  info!(version = %retired.version_name(), "Release version updated successfully");

  info!(version = %next.version_name(), "Add release version with updated supported APIs");
  store.create(&next).map_err(|source| SupersedeError::Create {
    version_name: next.version_name(),
    source,
  })?;
  info!(version = %next.version_name(), "Release version added successfully");

  Ok(next)
}
