//! API mapping file (`Map.yaml`) model and loading

use crate::core::error::{MappingError, RailResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level mapping file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapFile {
  #[serde(default)]
  pub mappings: Vec<ApiMapping>,
}

/// One deprecated API and its replacement
///
/// `deprecated_api` / `new_api` are literal manifest fragments, usually the
/// `apiVersion` and `kind` lines. An empty `new_api` means the resource kind
/// has no successor and is dropped from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMapping {
  #[serde(rename = "deprecatedAPI")]
  pub deprecated_api: String,
  #[serde(rename = "newAPI", default)]
  pub new_api: String,
  #[serde(default)]
  pub deprecated_in_version: Option<String>,
  #[serde(default)]
  pub removed_in_version: Option<String>,
}

impl ApiMapping {
  /// Version from which this mapping applies: deprecation if known, else removal
  pub fn gating_version(&self) -> Option<&str> {
    self
      .deprecated_in_version
      .as_deref()
      .filter(|v| !v.is_empty())
      .or_else(|| self.removed_in_version.as_deref().filter(|v| !v.is_empty()))
  }

  pub fn has_successor(&self) -> bool {
    !self.new_api.is_empty()
  }
}

impl MapFile {
  /// Load and parse a mapping file
  pub fn load(path: &Path) -> RailResult<Self> {
    let content = fs::read_to_string(path).map_err(|e| MappingError::Unreadable {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })?;
    Self::parse(&content).map_err(|reason| {
      MappingError::Invalid {
        path: path.to_path_buf(),
        reason,
      }
      .into()
    })
  }

  pub fn parse(content: &str) -> Result<Self, String> {
    serde_yaml::from_str(content).map_err(|e| e.to_string())
  }
}
