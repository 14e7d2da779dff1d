//! Map command: migrate deprecated APIs in recorded releases
//!
//! For every selected release the manifest is passed through the rewriter.
//! If the text changed, the release is superseded by a new version carrying
//! the rewritten manifest (or, in dry-run mode, only reported).
//!
//! Only two things abort a run: malformed selection specifiers and a store
//! that cannot list releases. Anything that goes wrong with a single release
//! is recorded as that release's outcome and the run moves on.

use crate::core::config::MapOptions;
use crate::core::error::{RailResult, ResultExt};
use crate::mapping::ManifestRewriter;
use crate::release::{ReleaseRef, ReleaseStore, supersede};
use crate::select::SelectionCriteria;
use serde::Serialize;
use tracing::{error, info, info_span, warn};

/// Which step of the supersession failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitStage {
  /// Marking the current version superseded; store unchanged
  Supersede,
  /// Creating the new version; current version already superseded
  Create,
}

/// What happened to one selected release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
  /// No deprecated APIs found
  Unchanged,
  /// Deprecated APIs found, nothing written (dry run)
  WouldChange,
  /// New version written
  Committed { new_version: u32 },
  /// Manifest could not be evaluated
  RewriteFailed { reason: String },
  /// Store rejected one of the supersession writes
  CommitFailed {
    stage: CommitStage,
    reason: String,
    inconsistent: bool,
  },
}

impl Outcome {
  pub fn is_failure(&self) -> bool {
    matches!(self, Outcome::RewriteFailed { .. } | Outcome::CommitFailed { .. })
  }
}

/// Outcome for one release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseEntry {
  pub name: String,
  pub namespace: String,
  /// Version examined
  pub version: u32,
  pub outcome: Outcome,
}

/// Result of one run, in processing order
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
  pub dry_run: bool,
  pub releases: Vec<ReleaseEntry>,
  /// Releases listed by the store but not selected
  pub excluded: Vec<ReleaseRef>,
}

impl MigrationReport {
  pub fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
    self.releases.iter().filter(|e| pred(&e.outcome)).count()
  }

  /// Releases left superseded without a deployed replacement
  pub fn inconsistent(&self) -> Vec<&ReleaseEntry> {
    self
      .releases
      .iter()
      .filter(|e| matches!(e.outcome, Outcome::CommitFailed { inconsistent: true, .. }))
      .collect()
  }
}

/// Run the map command against `store`, rewriting manifests with `rewriter`
pub fn run_map<S, R>(options: &MapOptions, store: &mut S, rewriter: &R) -> RailResult<MigrationReport>
where
  S: ReleaseStore + ?Sized,
  R: ManifestRewriter + ?Sized,
{
  if options.dry_run {
    info!("NOTE: This is in dry-run mode, the following actions will not be executed.");
    info!("Run without --dry-run to take the actions described below:");
  }

  let criteria = SelectionCriteria::build(&options.selection)?;
  let all = store.list_all().context("failed to list all releases")?;
  let partition = criteria.filter(all);

  let mut report = MigrationReport {
    dry_run: options.dry_run,
    releases: Vec::with_capacity(partition.selected.len()),
    excluded: partition.excluded,
  };

  for release in &partition.selected {
    let span = info_span!("release", release = %release.name, namespace = %release.namespace);
    let _guard = span.enter();

    info!("Check release {} for deprecated or removed APIs...", release.release_ref());
    let outcome = match rewriter.rewrite(&release.manifest, &options.map_file, &options.cluster) {
      Err(e) => {
        error!(error = %e, "Failed to check release for deprecated or removed APIs");
        Outcome::RewriteFailed { reason: e.to_string() }
      }
      Ok(modified) if modified == release.manifest => {
        info!("Release {} has no deprecated or removed APIs.", release.release_ref());
        Outcome::Unchanged
      }
      Ok(_) if options.dry_run => {
        info!("Deprecated or removed APIs exist, for release: {}.", release.release_ref());
        Outcome::WouldChange
      }
      Ok(modified) => {
        info!("Deprecated or removed APIs exist, updating release: {}.", release.release_ref());
        match supersede(&mut *store, release, &modified) {
          Ok(next) => {
            info!(
              "Release {} with deprecated or removed APIs updated successfully to new version.",
              release.release_ref()
            );
            Outcome::Committed {
              new_version: next.version,
            }
          }
          Err(e) => {
            let inconsistent = e.is_inconsistent();
            if inconsistent {
              error!(
                error = %e,
                "Release left without a deployed version; previous version is marked superseded"
              );
            } else {
              warn!(error = %e, "Release not updated");
            }
            Outcome::CommitFailed {
              stage: if inconsistent {
                CommitStage::Create
              } else {
                CommitStage::Supersede
              },
              reason: e.to_string(),
              inconsistent,
            }
          }
        }
      }
    };

    report.releases.push(ReleaseEntry {
      name: release.name.clone(),
      namespace: release.namespace.clone(),
      version: release.version,
      outcome,
    });
  }

  Ok(report)
}

/// Print a human readable summary of the run
pub fn print_report(report: &MigrationReport) {
  println!();
  if report.dry_run {
    println!("🔍 Dry-run mode (no changes applied)");
    println!();
  }

  if report.releases.is_empty() {
    println!("⚠️  No releases matched the selection");
    return;
  }

  println!("📋 Releases");
  println!();
  for entry in &report.releases {
    let (icon, detail) = match &entry.outcome {
      Outcome::Unchanged => ("✅", "no deprecated or removed APIs".to_string()),
      Outcome::WouldChange => ("🟡", "deprecated or removed APIs found".to_string()),
      Outcome::Committed { new_version } => ("🟢", format!("mapped to new version v{}", new_version)),
      Outcome::RewriteFailed { reason } => ("❌", format!("check failed: {}", reason)),
      Outcome::CommitFailed { reason, .. } => ("❌", format!("update failed: {}", reason)),
    };
    println!(
      "{} {}.{} (v{}): {}",
      icon, entry.name, entry.namespace, entry.version, detail
    );
  }
  println!();

  let changed = report.count(|o| matches!(o, Outcome::Committed { .. } | Outcome::WouldChange));
  let failed = report.count(Outcome::is_failure);
  println!(
    "   {} checked, {} {}, {} failed, {} not selected",
    report.releases.len(),
    changed,
    if report.dry_run { "to update" } else { "updated" },
    failed,
    report.excluded.len()
  );

  let inconsistent = report.inconsistent();
  if !inconsistent.is_empty() {
    println!();
    println!("⚠️  These releases have no deployed version (previous version already superseded):");
    for entry in inconsistent {
      println!("  {}.v{} in namespace {}", entry.name, entry.version, entry.namespace);
    }
    println!("   Restore the previous version's status or rerun once the store accepts writes.");
  }
}
