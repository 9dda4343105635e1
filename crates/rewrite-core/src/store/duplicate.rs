//! Exact-pair duplicate detection
//!
//! Two rules with the same domain but different answers are allowed (several
//! A/AAAA overrides for one name is a normal setup). Only a rule whose domain
//! and answer both match an existing entry is a duplicate.

use crate::error::{Error, Result};
use crate::rule::Rule;

/// Number of rules matching `(domain, answer)` exactly
pub fn count_matches(rules: &[Rule], domain: &str, answer: &str) -> usize {
    rules
        .iter()
        .filter(|rule| rule.matches(domain, answer))
        .count()
}

/// Fail with [`Error::Duplicate`] if `(domain, answer)` is already present
///
/// The check is only meaningful if the caller holds the lock guarding
/// `rules` until its mutation is applied.
pub fn check_duplicate(rules: &[Rule], domain: &str, answer: &str) -> Result<()> {
    match count_matches(rules, domain, answer) {
        0 => Ok(()),
        _ => Err(Error::duplicate(domain, answer)),
    }
}
