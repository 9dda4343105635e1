//! Rewrite rule entity
//!
//! A [`Rule`] maps a domain to a fixed answer. The answer is one of:
//!
//! - an IP literal (`1.2.3.4`, `::1`), answered as an A or AAAA record
//! - another domain name, answered CNAME-style
//! - the keyword `A` or `AAAA`, meaning "keep the upstream records of this type"
//!
//! Rules carry no identifier of their own; identity is the normalized
//! `(domain, answer)` pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Answer keyword passing through upstream A records
const KEYWORD_A: &str = "A";

/// Answer keyword passing through upstream AAAA records
const KEYWORD_AAAA: &str = "AAAA";

/// A single domain-to-answer override
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    /// Domain the rule applies to
    pub domain: String,
    /// Answer returned instead of the normal lookup
    pub answer: String,
}

/// What kind of answer a rule produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Fixed IPv4 address
    A,
    /// Fixed IPv6 address
    Aaaa,
    /// Redirect to another domain
    Cname,
    /// Keep upstream A records
    PassA,
    /// Keep upstream AAAA records
    PassAaaa,
}

impl Rule {
    /// Create a rule from raw, not yet normalized, fields
    pub fn new(domain: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            answer: answer.into(),
        }
    }

    /// Return the canonical form of this rule
    ///
    /// The domain is trimmed, lowercased and stripped of its trailing dot.
    /// IP answers are rendered in canonical textual form, keywords are
    /// upper-cased and domain answers get the same treatment as the domain.
    ///
    /// Only an empty domain or answer is rejected. Anything else that does
    /// not parse as an IP literal is accepted as a CNAME-style target, so
    /// malformed addresses are left for the resolver to deal with.
    pub fn normalize(&self) -> Result<Rule> {
        let domain = canonical_name(&self.domain);
        if domain.is_empty() {
            return Err(Error::validation("domain cannot be empty"));
        }

        let answer = canonical_answer(&self.answer);
        if answer.is_empty() {
            return Err(Error::validation(format!(
                "answer for {} cannot be empty",
                domain
            )));
        }

        Ok(Rule { domain, answer })
    }

    /// Exact equality on both fields
    ///
    /// Both rules are expected to be normalized already.
    pub fn equal(&self, other: &Rule) -> bool {
        self.domain == other.domain && self.answer == other.answer
    }

    /// Whether this rule matches the given pair exactly
    pub fn matches(&self, domain: &str, answer: &str) -> bool {
        self.domain == domain && self.answer == answer
    }

    /// Classify the answer of this rule
    pub fn kind(&self) -> RuleKind {
        match self.answer.as_str() {
            KEYWORD_A => RuleKind::PassA,
            KEYWORD_AAAA => RuleKind::PassAaaa,
            answer => match answer.parse::<IpAddr>() {
                Ok(IpAddr::V4(_)) => RuleKind::A,
                Ok(IpAddr::V6(_)) => RuleKind::Aaaa,
                Err(_) => RuleKind::Cname,
            },
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.domain, self.answer)
    }
}

fn canonical_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_lowercase()
}

fn canonical_answer(answer: &str) -> String {
    let answer = answer.trim();

    if answer.eq_ignore_ascii_case(KEYWORD_A) {
        return KEYWORD_A.to_string();
    }
    if answer.eq_ignore_ascii_case(KEYWORD_AAAA) {
        return KEYWORD_AAAA.to_string();
    }

    match answer.parse::<IpAddr>() {
        Ok(ip) => ip.to_string(),
        Err(_) => canonical_name(answer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        let rule = Rule::new("  WWW.Example.COM. ", "1.2.3.4").normalize().unwrap();
        assert_eq!(rule.domain, "www.example.com");
        assert_eq!(rule.answer, "1.2.3.4");
    }

    #[test]
    fn test_normalize_answers() {
        let v6 = Rule::new("a.com", "2001:DB8:0:0::1").normalize().unwrap();
        assert_eq!(v6.answer, "2001:db8::1");

        let cname = Rule::new("a.com", "Target.Example.").normalize().unwrap();
        assert_eq!(cname.answer, "target.example");

        let keyword = Rule::new("a.com", "aaaa").normalize().unwrap();
        assert_eq!(keyword.answer, "AAAA");
    }

    #[test]
    fn test_normalize_rejects_empty_fields() {
        assert!(matches!(
            Rule::new("", "1.2.3.4").normalize(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Rule::new(" . ", "1.2.3.4").normalize(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Rule::new("a.com", "   ").normalize(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_normalize_is_lenient_on_malformed_ip() {
        // Not an IP literal, so it is kept as a redirect target
        let rule = Rule::new("a.com", "999.1.1.1").normalize().unwrap();
        assert_eq!(rule.answer, "999.1.1.1");
        assert_eq!(rule.kind(), RuleKind::Cname);
    }

    #[test]
    fn test_equal_is_exact() {
        let a = Rule::new("a.com", "1.1.1.1");
        assert!(a.equal(&Rule::new("a.com", "1.1.1.1")));
        assert!(!a.equal(&Rule::new("a.com", "1.1.1.2")));
        assert!(!a.equal(&Rule::new("b.a.com", "1.1.1.1")));
    }

    #[test]
    fn test_kind() {
        assert_eq!(Rule::new("a.com", "1.1.1.1").kind(), RuleKind::A);
        assert_eq!(Rule::new("a.com", "::1").kind(), RuleKind::Aaaa);
        assert_eq!(Rule::new("a.com", "b.com").kind(), RuleKind::Cname);
        assert_eq!(Rule::new("a.com", "A").kind(), RuleKind::PassA);
        assert_eq!(Rule::new("a.com", "AAAA").kind(), RuleKind::PassAaaa);
    }

    #[test]
    fn test_display() {
        assert_eq!(Rule::new("a.com", "1.1.1.1").to_string(), "a.com -> 1.1.1.1");
    }
}
