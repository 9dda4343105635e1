//! Substring filter used by [`RuleStore::list`](super::RuleStore::list)

use crate::rule::Rule;

/// Whether `needle` occurs in the rule's domain or answer
///
/// Matching is case-sensitive. An empty needle matches every rule.
pub fn matches_query(rule: &Rule, needle: &str) -> bool {
    rule.domain.contains(needle) || rule.answer.contains(needle)
}

/// Ordered subsequence of `rules` matching `needle`
///
/// Operates on a snapshot borrowed from the caller's read guard and takes no
/// lock of its own.
pub fn filter_rules(rules: &[Rule], needle: &str) -> Vec<Rule> {
    if needle.is_empty() {
        return rules.to_vec();
    }

    rules
        .iter()
        .filter(|rule| matches_query(rule, needle))
        .cloned()
        .collect()
}
