//! Ruleset algebra over rules borrowed from a [`Catalogue`](super::Catalogue).

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use super::{Rule, RuleGroup};
use crate::models::SegmentKind;

/// Deduplicated, ordered selection of catalogue rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet<'c> {
    rules: Vec<&'c Rule>,
}

impl<'c> RuleSet<'c> {
    pub fn from_rules<I: IntoIterator<Item = &'c Rule>>(rules: I) -> Self {
        let mut seen = HashSet::new();
        let rules = rules
            .into_iter()
            .filter(|rule| seen.insert(rule.reference.as_str()))
            .collect();
        Self { rules }
    }

    fn filtered(&self, keep: impl Fn(&Rule) -> bool) -> Self {
        Self {
            rules: self.rules.iter().copied().filter(|r| keep(r)).collect(),
        }
    }

    /// Keep rules whose reference is listed; unknown references are ignored.
    pub fn only<S: AsRef<str>>(&self, references: &[S]) -> Self {
        let wanted: HashSet<&str> = references.iter().map(AsRef::as_ref).collect();
        self.filtered(|r| wanted.contains(r.reference.as_str()))
    }

    /// Drop rules whose reference is listed.
    pub fn exclude<S: AsRef<str>>(&self, references: &[S]) -> Self {
        let unwanted: HashSet<&str> = references.iter().map(AsRef::as_ref).collect();
        self.filtered(|r| !unwanted.contains(r.reference.as_str()))
    }

    pub fn only_static(&self) -> Self {
        self.filtered(Rule::is_static)
    }

    pub fn only_llm(&self) -> Self {
        self.filtered(Rule::is_llm)
    }

    pub fn only_from_groups(&self, groups: &[RuleGroup]) -> Self {
        self.filtered(|r| groups.contains(&r.group))
    }

    /// Rules applicable to segments of `kind`.
    pub fn applicable_to(&self, kind: SegmentKind) -> impl Iterator<Item = &'c Rule> + '_ {
        self.rules.iter().copied().filter(move |r| r.applies_to(kind))
    }

    pub fn has_llm_rules(&self) -> bool {
        self.rules.iter().any(|r| r.is_llm())
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.rules.iter().any(|r| r.reference == reference)
    }

    pub fn references(&self) -> Vec<&'c str> {
        self.rules.iter().map(|r| r.reference.as_str()).collect()
    }

    /// SHA-256 of the sorted, comma-joined references.
    pub fn identity(&self) -> String {
        let mut refs = self.references();
        refs.sort_unstable();
        let mut hasher = Sha256::new();
        hasher.update(refs.join(",").as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'c Rule> + '_ {
        self.rules.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
