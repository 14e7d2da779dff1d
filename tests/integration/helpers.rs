//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const DEPRECATED_DEPLOYMENT: &str =
  "---\n# Source: web/templates/deployment.yaml\napiVersion: extensions/v1beta1\nkind: Deployment\nmetadata:\n  name: web\n";

/// A scratch directory with a release store and a mapping file
pub struct TestStore {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestStore {
  /// Create an empty store plus a `Map.yaml` with one Deployment mapping
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    std::fs::create_dir_all(path.join("releases"))?;
    std::fs::write(
      path.join("Map.yaml"),
      r#"mappings:
  - deprecatedAPI: "apiVersion: extensions/v1beta1\nkind: Deployment"
    newAPI: "apiVersion: apps/v1\nkind: Deployment"
    deprecatedInVersion: "v1.9"
    removedInVersion: "v1.16"
"#,
    )?;

    Ok(Self { _root: root, path })
  }

  pub fn storage_dir(&self) -> PathBuf {
    self.path.join("releases")
  }

  pub fn map_file(&self) -> PathBuf {
    self.path.join("Map.yaml")
  }

  /// Write one deployed release version
  pub fn add_release(&self, name: &str, namespace: &str, version: u32, manifest: &str) -> Result<()> {
    let record = json!({
      "name": name,
      "namespace": namespace,
      "version": version,
      "info": {
        "status": "deployed",
        "description": "Upgrade complete",
        "first_deployed": "2023-01-01T00:00:00Z",
        "last_deployed": "2023-06-01T00:00:00Z"
      },
      "manifest": manifest,
      "chart": { "metadata": { "name": name, "version": "1.0.0" } }
    });

    let dir = self.storage_dir().join(namespace);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(
      dir.join(format!("{}.v{}.json", name, version)),
      serde_json::to_string_pretty(&record)?,
    )?;
    Ok(())
  }

  /// Read a release version back, `None` if it does not exist
  pub fn read_release(&self, name: &str, namespace: &str, version: u32) -> Result<Option<Value>> {
    let path = self
      .storage_dir()
      .join(namespace)
      .join(format!("{}.v{}.json", name, version));
    if !path.exists() {
      return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
  }

  /// Common flags pointing the CLI at this store
  pub fn base_args(&self) -> Vec<String> {
    vec![
      "--storage-dir".to_string(),
      self.storage_dir().display().to_string(),
      "--mapfile".to_string(),
      self.map_file().display().to_string(),
    ]
  }
}

/// Run the kube-remap CLI, failing on a non-zero exit
pub fn run_kube_remap(cwd: &Path, args: &[String]) -> Result<Output> {
  let output = run_kube_remap_raw(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "kube-remap command failed: kube-remap {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

/// Run the kube-remap CLI and return the output whatever the exit status
pub fn run_kube_remap_raw(cwd: &Path, args: &[String]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_kube-remap");

  Command::new(bin)
    .current_dir(cwd)
    .env_remove("KUBE_REMAP_STORAGE_DIR")
    .env_remove("HELM_PLUGIN_DIR")
    .env_remove("HELM_KUBECONTEXT")
    .env_remove("KUBECONFIG")
    .args(args)
    .output()
    .context("Failed to run kube-remap")
}
