//! Selection criteria: build once from user input, then decide per release
//!
//! Two build modes:
//!
//! - **Scoped** (`all_namespaces == false`): allow lists come from
//!   `namespaces` and `releases`; a release whose namespace is also allowed as
//!   a whole is folded into the namespace allow set.
//! - **Global** (`all_namespaces == true`): every release is a candidate, only
//!   the deny lists are built.
//!
//! Deny lists use the same folding against `except_namespaces`. A namespace
//! that is also denied never enters the allow set, nor do release entries in it.

use crate::core::error::SpecifierError;
use crate::release::{Release, ReleaseRef};
use crate::select::specifier::parse_specifier;

/// Raw selection input as given on the command line / config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionInput {
  pub all_namespaces: bool,
  pub namespaces: Vec<String>,
  pub except_namespaces: Vec<String>,
  /// `release.namespace` specifiers to include
  pub releases: Vec<String>,
  /// `release.namespace` specifiers to exclude
  pub except_releases: Vec<String>,
}

/// Parsed selection rules
///
/// Every list holds each entry at most once, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
  pub all_namespaces: bool,
  pub namespaces: Vec<String>,
  pub except_namespaces: Vec<String>,
  pub releases: Vec<ReleaseRef>,
  pub except_releases: Vec<ReleaseRef>,
}

/// Outcome of filtering a release list
#[derive(Debug, Clone, Default)]
pub struct Partition {
  /// Selected releases, in input order
  pub selected: Vec<Release>,
  /// Refs of releases that were not selected, in input order
  pub excluded: Vec<ReleaseRef>,
}

impl SelectionCriteria {
  /// Build criteria from raw input. Fails on the first malformed specifier.
  pub fn build(input: &SelectionInput) -> Result<Self, SpecifierError> {
    let mut criteria = SelectionCriteria {
      all_namespaces: input.all_namespaces,
      ..Default::default()
    };

    if !input.all_namespaces {
      fold_releases(
        &input.releases,
        &input.namespaces,
        &input.except_namespaces,
        &mut criteria.namespaces,
        &mut criteria.releases,
      )?;
      for ns in &input.namespaces {
        if !input.except_namespaces.contains(ns) {
          push_unique(&mut criteria.namespaces, ns.clone());
        }
      }
    }

    fold_releases(
      &input.except_releases,
      &input.except_namespaces,
      &[],
      &mut criteria.except_namespaces,
      &mut criteria.except_releases,
    )?;
    for ns in &input.except_namespaces {
      push_unique(&mut criteria.except_namespaces, ns.clone());
    }

    Ok(criteria)
  }

  /// Decide whether the release `name` in `namespace` is selected.
  ///
  /// Rules are evaluated in order and the first match decides:
  /// deny namespace, deny release, all namespaces, allow namespace,
  /// allow release. Nothing matched means excluded.
  pub fn is_selected(&self, name: &str, namespace: &str) -> bool {
    if self.except_namespaces.iter().any(|ns| ns == namespace) {
      return false;
    }
    if self.except_releases.iter().any(|r| r.name == name && r.namespace == namespace) {
      return false;
    }
    if self.all_namespaces {
      return true;
    }
    if self.namespaces.iter().any(|ns| ns == namespace) {
      return true;
    }
    self.releases.iter().any(|r| r.name == name && r.namespace == namespace)
  }

  /// Stable partition of `releases` into selected and excluded
  pub fn filter(&self, releases: Vec<Release>) -> Partition {
    let mut partition = Partition::default();
    for release in releases {
      if self.is_selected(&release.name, &release.namespace) {
        partition.selected.push(release);
      } else {
        partition.excluded.push(release.release_ref());
      }
    }
    partition
  }
}

/// Parse `specs` into `releases`, promoting to `namespace_set` any namespace
/// that is also listed whole in `namespace_input`. Entries whose namespace is
/// in `blocked` are parsed but dropped.
fn fold_releases(
  specs: &[String],
  namespace_input: &[String],
  blocked: &[String],
  namespace_set: &mut Vec<String>,
  releases: &mut Vec<ReleaseRef>,
) -> Result<(), SpecifierError> {
  for spec in specs {
    let release = parse_specifier(spec)?;
    if blocked.contains(&release.namespace) {
      continue;
    }

    if !namespace_input.is_empty() {
      if namespace_set.contains(&release.namespace) {
        continue;
      }
      if namespace_input.contains(&release.namespace) {
        namespace_set.push(release.namespace);
        continue;
      }
    }

    push_unique(releases, release);
  }
  Ok(())
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
  if !list.contains(&item) {
    list.push(item);
  }
}
