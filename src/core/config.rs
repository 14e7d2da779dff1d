//! Run configuration
//!
//! Settings come from three places, resolved once at startup into `MapOptions`:
//!
//! 1. Command-line flags
//! 2. Environment (`HELM_PLUGIN_DIR`, `HELM_KUBECONTEXT`, `KUBECONFIG`,
//!    `KUBE_REMAP_STORAGE_DIR`)
//! 3. Optional config file, searched in order: kube-remap.toml,
//!    .kube-remap.toml, .config/kube-remap.toml
//!
//! Scalars take the first value found in that order. Allow lists given on the
//! command line replace the file's; deny lists are merged so an exclusion in
//! the file is never dropped.

use crate::core::error::{ConfigError, RailError, RailResult, ResultExt};
use crate::mapping::parse_kube_version;
use crate::select::SelectionInput;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_PLUGIN_DIR: &str = "HELM_PLUGIN_DIR";
pub const ENV_KUBE_CONTEXT: &str = "HELM_KUBECONTEXT";
pub const ENV_KUBECONFIG: &str = "KUBECONFIG";
pub const ENV_STORAGE_DIR: &str = "KUBE_REMAP_STORAGE_DIR";

/// Cluster connection descriptor handed to the manifest rewriter
///
/// `MapFileRewriter` only reads `kube_version`; the connection fields are
/// carried for rewriters that query a live cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterConfig {
  /// Path to the kubeconfig file
  pub kubeconfig: Option<PathBuf>,
  /// Name of the kubeconfig context to use
  pub context: Option<String>,
  /// Target Kubernetes version; mappings not yet due on it are skipped
  pub kube_version: Option<String>,
}

/// Optional config file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemapConfig {
  #[serde(default)]
  pub map_file: Option<PathBuf>,
  #[serde(default)]
  pub storage_dir: Option<PathBuf>,
  #[serde(default)]
  pub kube_version: Option<String>,
  #[serde(default)]
  pub kube_context: Option<String>,
  #[serde(default)]
  pub kubeconfig: Option<PathBuf>,
  #[serde(default)]
  pub namespaces: Vec<String>,
  /// `release.namespace` specifiers
  #[serde(default)]
  pub releases: Vec<String>,
  #[serde(default)]
  pub except_namespaces: Vec<String>,
  /// `release.namespace` specifiers
  #[serde(default)]
  pub except_releases: Vec<String>,
}

impl RemapConfig {
  /// Find config file in search order
  pub fn find_config_path(dir: &Path) -> Option<PathBuf> {
    let candidates = [
      dir.join("kube-remap.toml"),
      dir.join(".kube-remap.toml"),
      dir.join(".config").join("kube-remap.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Parse a config file
  pub fn load(path: &Path) -> RailResult<Self> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: RemapConfig =
      toml_edit::de::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))?;
    Ok(config)
  }
}

/// Settings as parsed from command-line flags, before defaults apply
#[derive(Debug, Clone, Default)]
pub struct CliSettings {
  pub dry_run: bool,
  pub config: Option<PathBuf>,
  pub kubeconfig: Option<PathBuf>,
  pub kube_context: Option<String>,
  pub kube_version: Option<String>,
  pub map_file: Option<PathBuf>,
  pub storage_dir: Option<PathBuf>,
  pub all_namespaces: bool,
  pub namespaces: Vec<String>,
  pub releases: Vec<String>,
  pub except_namespaces: Vec<String>,
  pub except_releases: Vec<String>,
}

/// Fully resolved options for one migration run
#[derive(Debug, Clone)]
pub struct MapOptions {
  pub dry_run: bool,
  pub cluster: ClusterConfig,
  pub map_file: PathBuf,
  pub storage_dir: PathBuf,
  pub selection: SelectionInput,
}

impl MapOptions {
  /// Resolve options using the process environment and working directory
  pub fn resolve(cli: CliSettings) -> RailResult<Self> {
    let cwd = std::env::current_dir()?;
    Self::resolve_with(cli, &cwd, |key| std::env::var(key).ok().filter(|v| !v.is_empty()))
  }

  /// Resolve options against an explicit directory and environment lookup
  pub fn resolve_with<F>(cli: CliSettings, cwd: &Path, env: F) -> RailResult<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let file = match &cli.config {
      Some(path) => {
        if !path.exists() {
          return Err(RailError::Config(ConfigError::NotFound { path: path.clone() }));
        }
        RemapConfig::load(path)?
      }
      None => match RemapConfig::find_config_path(cwd) {
        Some(path) => RemapConfig::load(&path)?,
        None => RemapConfig::default(),
      },
    };

    let map_file = cli
      .map_file
      .or(file.map_file)
      .unwrap_or_else(|| default_map_file(env(ENV_PLUGIN_DIR).as_deref()));

    let storage_dir = cli
      .storage_dir
      .or_else(|| env(ENV_STORAGE_DIR).map(PathBuf::from))
      .or(file.storage_dir)
      .ok_or_else(|| {
        RailError::Config(ConfigError::MissingField {
          field: "storage_dir".to_string(),
        })
      })?;

    let kube_version = cli.kube_version.or(file.kube_version);
    if let Some(version) = &kube_version
      && parse_kube_version(version).is_none()
    {
      return Err(RailError::Config(ConfigError::InvalidValue {
        field: "kube_version".to_string(),
        value: version.clone(),
        reason: "not a Kubernetes version".to_string(),
      }));
    }

    let cluster = ClusterConfig {
      kubeconfig: cli
        .kubeconfig
        .or_else(|| env(ENV_KUBECONFIG).map(PathBuf::from))
        .or(file.kubeconfig),
      context: cli.kube_context.or_else(|| env(ENV_KUBE_CONTEXT)).or(file.kube_context),
      kube_version,
    };

    let selection = SelectionInput {
      all_namespaces: cli.all_namespaces,
      namespaces: prefer(cli.namespaces, file.namespaces),
      releases: prefer(cli.releases, file.releases),
      except_namespaces: merge(file.except_namespaces, cli.except_namespaces),
      except_releases: merge(file.except_releases, cli.except_releases),
    };

    Ok(Self {
      dry_run: cli.dry_run,
      cluster,
      map_file,
      storage_dir,
      selection,
    })
  }
}

/// Default mapping file: `$HELM_PLUGIN_DIR/config/Map.yaml`, else `config/Map.yaml`
pub fn default_map_file(plugin_dir: Option<&str>) -> PathBuf {
  match plugin_dir {
    Some(dir) => Path::new(dir).join("config").join("Map.yaml"),
    None => Path::new("config").join("Map.yaml"),
  }
}

fn prefer(primary: Vec<String>, fallback: Vec<String>) -> Vec<String> {
  if primary.is_empty() { fallback } else { primary }
}

fn merge(mut base: Vec<String>, extra: Vec<String>) -> Vec<String> {
  base.extend(extra);
  base
}
