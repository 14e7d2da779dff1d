//! Release selection
//!
//! Turns the namespace/release allow and deny inputs into a per-release
//! decision.
//!
//! # Core Invariant
//!
//! **Deny always wins.** Exclusion rules are checked before any allow rule, so a
//! namespace or release named in an except list is never touched, whatever the
//! allow lists or `--all-namespaces` say.

pub mod criteria;
pub mod specifier;

pub use criteria::{SelectionCriteria, SelectionInput};
