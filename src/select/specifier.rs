//! `release.namespace` specifier parsing

use crate::core::error::SpecifierError;
use crate::release::ReleaseRef;

/// Parse one `<release>.<namespace>` specifier.
///
/// The release is everything before the first `.`, the namespace is the
/// segment after it up to the next `.`. Anything after a second `.` is
/// ignored.
pub fn parse_specifier(spec: &str) -> Result<ReleaseRef, SpecifierError> {
  let invalid = || SpecifierError::InvalidSpecifier {
    specifier: spec.to_string(),
  };

  let mut parts = spec.split('.');
  let name = parts.next().unwrap_or_default();
  let namespace = parts.next().ok_or_else(invalid)?;

  if name.is_empty() || namespace.is_empty() {
    return Err(invalid());
  }

  Ok(ReleaseRef::new(name, namespace))
}
