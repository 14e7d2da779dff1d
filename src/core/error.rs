//! Error types for kube-remap with contextual messages and exit codes
//!
//! One error type covers every fatal path of a run. Each category carries its
//! own help text so `print_error` can point the operator at a fix. Per-release
//! failures during a migration are not errors at this level; they are recorded
//! as outcomes in the run report.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for kube-remap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, malformed specifiers)
  User = 1,
  /// System error (release store, I/O)
  System = 2,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for kube-remap
#[derive(Debug)]
pub enum RailError {
  /// Configuration errors
  Config(ConfigError),

  /// Malformed `release.namespace` input
  Specifier(SpecifierError),

  /// Release store errors
  Store(StoreError),

  /// API mapping file errors
  Mapping(MappingError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
    /// Exit code of the error this message was built from
    exit_code: ExitCode,
  },
}

impl RailError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RailError::Message {
      message: msg.into(),
      context: None,
      help: None,
      exit_code: ExitCode::User,
    }
  }

  /// Add context to an existing error
  ///
  /// Typed errors are folded into a message so the context line is never lost;
  /// their help text and exit code are kept.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RailError::Message {
        message,
        context,
        help,
        exit_code,
      } => RailError::Message {
        message: ctx_str,
        context: Some(context.map(|c| format!("{}\n{}", message, c)).unwrap_or(message)),
        help,
        exit_code,
      },
      other => RailError::Message {
        message: ctx_str,
        context: Some(other.to_string()),
        help: other.help_message(),
        exit_code: other.exit_code(),
      },
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RailError::Config(_) => ExitCode::User,
      RailError::Specifier(_) => ExitCode::User,
      RailError::Store(_) => ExitCode::System,
      RailError::Mapping(_) => ExitCode::User,
      RailError::Io(_) => ExitCode::System,
      RailError::Message { exit_code, .. } => *exit_code,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RailError::Config(e) => e.help_message(),
      RailError::Specifier(e) => e.help_message(),
      RailError::Store(e) => e.help_message(),
      RailError::Mapping(e) => e.help_message(),
      RailError::Message { help, .. } => help.clone(),
      RailError::Io(_) => None,
    }
  }
}

impl fmt::Display for RailError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RailError::Config(e) => write!(f, "{}", e),
      RailError::Specifier(e) => write!(f, "{}", e),
      RailError::Store(e) => write!(f, "{}", e),
      RailError::Mapping(e) => write!(f, "{}", e),
      RailError::Io(e) => write!(f, "I/O error: {}", e),
      RailError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RailError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RailError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RailError {
  fn from(err: io::Error) -> Self {
    RailError::Io(err)
  }
}

impl From<String> for RailError {
  fn from(msg: String) -> Self {
    RailError::message(msg)
  }
}

impl From<&str> for RailError {
  fn from(msg: &str) -> Self {
    RailError::message(msg)
  }
}

impl From<ConfigError> for RailError {
  fn from(err: ConfigError) -> Self {
    RailError::Config(err)
  }
}

impl From<SpecifierError> for RailError {
  fn from(err: SpecifierError) -> Self {
    RailError::Specifier(err)
  }
}

impl From<StoreError> for RailError {
  fn from(err: StoreError) -> Self {
    RailError::Store(err)
  }
}

impl From<MappingError> for RailError {
  fn from(err: MappingError) -> Self {
    RailError::Mapping(err)
  }
}

impl From<toml_edit::de::Error> for RailError {
  fn from(err: toml_edit::de::Error) -> Self {
    RailError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for RailError {
  fn from(err: serde_json::Error) -> Self {
    RailError::message(format!("JSON error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file passed with --config does not exist
  NotFound { path: PathBuf },

  /// Missing required setting
  MissingField { field: String },

  /// Setting present but unusable
  InvalidValue { field: String, value: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Omit --config to fall back to kube-remap.toml in the current directory.".to_string())
      }
      ConfigError::MissingField { field } if field == "storage_dir" => Some(
        "Pass --storage-dir, set KUBE_REMAP_STORAGE_DIR, or add storage_dir to kube-remap.toml.".to_string(),
      ),
      ConfigError::InvalidValue { field, .. } if field == "kube_version" => {
        Some("Kubernetes versions look like v1.22 or 1.22.3".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => {
        write!(f, "Config file not found: {}", path.display())
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required setting: {}", field)
      }
      ConfigError::InvalidValue { field, value, reason } => {
        write!(f, "Invalid value '{}' for {}: {}", value, field, reason)
      }
    }
  }
}

/// Release specifier errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecifierError {
  /// Entry is not of the form `release.namespace`
  InvalidSpecifier { specifier: String },
}

impl SpecifierError {
  fn help_message(&self) -> Option<String> {
    match self {
      SpecifierError::InvalidSpecifier { .. } => {
        Some("Release specifiers take the form <release>.<namespace>, for example web.prod".to_string())
      }
    }
  }
}

impl fmt::Display for SpecifierError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SpecifierError::InvalidSpecifier { specifier } => {
        write!(f, "Invalid release specifier '{}'", specifier)
      }
    }
  }
}

/// Release store errors
#[derive(Debug)]
pub enum StoreError {
  /// Store root directory missing or unreadable
  Unavailable { root: PathBuf, reason: String },

  /// Record file could not be read or parsed
  Corrupt { path: PathBuf, reason: String },

  /// Update target does not exist
  NotFound { version_name: String },

  /// Create target already exists
  AlreadyExists { version_name: String },

  /// Record could not be written
  WriteFailed { path: PathBuf, reason: String },

  /// Name or namespace cannot be used as a path segment
  InvalidName { field: String, value: String },
}

impl StoreError {
  fn help_message(&self) -> Option<String> {
    match self {
      StoreError::Unavailable { root, .. } => Some(format!(
        "Check that {} exists and contains <namespace>/<release>.v<version>.json records",
        root.display()
      )),
      StoreError::Corrupt { path, .. } => Some(format!("Repair or remove {} and rerun", path.display())),
      StoreError::InvalidName { .. } => {
        Some("Release names and namespaces must not contain path separators or '..'".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for StoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StoreError::Unavailable { root, reason } => {
        write!(f, "Release store at {} is unavailable: {}", root.display(), reason)
      }
      StoreError::Corrupt { path, reason } => {
        write!(f, "Unreadable release record {}: {}", path.display(), reason)
      }
      StoreError::NotFound { version_name } => {
        write!(f, "Release version '{}' not found", version_name)
      }
      StoreError::AlreadyExists { version_name } => {
        write!(f, "Release version '{}' already exists", version_name)
      }
      StoreError::WriteFailed { path, reason } => {
        write!(f, "Failed to write release record {}: {}", path.display(), reason)
      }
      StoreError::InvalidName { field, value } => {
        write!(f, "Invalid release {} '{}' in release store", field, value)
      }
    }
  }
}

/// API mapping file errors
#[derive(Debug)]
pub enum MappingError {
  /// Mapping file could not be read
  Unreadable { path: PathBuf, reason: String },

  /// Mapping file is not valid YAML for the mapping schema
  Invalid { path: PathBuf, reason: String },

  /// Mapping entry has no usable deprecation/removal version
  MissingVersion { api: String },
}

impl MappingError {
  fn help_message(&self) -> Option<String> {
    match self {
      MappingError::Unreadable { .. } => {
        Some("Pass --mapfile or set HELM_PLUGIN_DIR so config/Map.yaml can be found".to_string())
      }
      MappingError::MissingVersion { .. } => {
        Some("Every mapping needs deprecatedInVersion or removedInVersion, for example v1.16".to_string())
      }
      MappingError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for MappingError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      MappingError::Unreadable { path, reason } => {
        write!(f, "Failed to read mapping file {}: {}", path.display(), reason)
      }
      MappingError::Invalid { path, reason } => {
        write!(f, "Invalid mapping file {}: {}", path.display(), reason)
      }
      MappingError::MissingVersion { api } => {
        write!(f, "Failed to get the deprecated or removed Kubernetes version for API: {}", api)
      }
    }
  }
}

/// Result type alias for kube-remap
pub type RailResult<T> = Result<T, RailError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RailResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RailError>,
{
  fn context(self, ctx: impl Into<String>) -> RailResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RailResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RailError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exit_codes() {
    let spec = RailError::from(SpecifierError::InvalidSpecifier {
      specifier: "web".to_string(),
    });
    assert_eq!(spec.exit_code(), ExitCode::User);

    let store = RailError::from(StoreError::NotFound {
      version_name: "web.v3".to_string(),
    });
    assert_eq!(store.exit_code(), ExitCode::System);
    assert_eq!(store.exit_code().as_i32(), 2);
  }

  #[test]
  fn test_context_keeps_typed_error_text() {
    let err: RailResult<()> = Err(StoreError::Unavailable {
      root: PathBuf::from("/nope"),
      reason: "No such file or directory".to_string(),
    }
    .into());

    let err = err.context("failed to list all releases").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.starts_with("failed to list all releases"));
    assert!(rendered.contains("/nope"));
    assert!(err.help_message().is_some());
  }

  #[test]
  fn test_context_keeps_exit_code() {
    let err: RailResult<()> = Err(StoreError::Unavailable {
      root: PathBuf::from("/nope"),
      reason: "No such file or directory".to_string(),
    }
    .into());

    let err = err.context("failed to list all releases").context("map run aborted").unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::System);
    assert_eq!(RailError::message("bad input").context("outer").exit_code(), ExitCode::User);
  }

  #[test]
  fn test_context_stacks_on_messages() {
    let err = RailError::message("inner").context("middle").context("outer");
    assert_eq!(err.to_string(), "outer\nmiddle\ninner");
  }
}
