//! Rule definitions, the built-in catalogue and ruleset algebra.
//!
//! A [`Rule`] pairs a numeric code with either a deterministic validator or an
//! LLM prompt-fragment generator.  Catalogues own rules; rulesets borrow them.

pub mod catalogue;
pub mod checkers;
pub mod ruleset;

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::docstring::DocStyle;
use crate::errors::{DolceError, DolceResult};
use crate::models::{CodeSegment, SegmentKind, Verdict};

pub use catalogue::Catalogue;
pub use ruleset::RuleSet;

pub const RULE_PREFIX: &str = "DCE";

// ---------------------------------------------------------------------------
// RuleGroup
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleGroup {
    Structural = 1,
    Style = 2,
    Signature = 3,
    Content = 4,
    Semantic = 5,
}

impl RuleGroup {
    pub const ALL: &'static [RuleGroup] = &[
        RuleGroup::Structural,
        RuleGroup::Style,
        RuleGroup::Signature,
        RuleGroup::Content,
        RuleGroup::Semantic,
    ];

    /// Group of a rule code: its hundreds digit.
    pub fn from_code(code: u16) -> Option<Self> {
        match code / 100 {
            1 => Some(RuleGroup::Structural),
            2 => Some(RuleGroup::Style),
            3 => Some(RuleGroup::Signature),
            4 => Some(RuleGroup::Content),
            5 => Some(RuleGroup::Semantic),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleGroup::Structural => "Structural",
            RuleGroup::Style => "Style",
            RuleGroup::Signature => "Signature",
            RuleGroup::Content => "Content",
            RuleGroup::Semantic => "Semantic",
        }
    }
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// CheckContext
// ---------------------------------------------------------------------------

/// Options that validators consult.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckContext {
    pub ignore_variadic_positional: bool,
    pub ignore_variadic_keyword: bool,
    pub ignore_private_segments: bool,
    pub ensure_style: Option<DocStyle>,
}

impl Default for CheckContext {
    fn default() -> Self {
        Self {
            ignore_variadic_positional: true,
            ignore_variadic_keyword: true,
            ignore_private_segments: true,
            ensure_style: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Deterministic check; an empty result means "does not apply here".
pub type StaticCheck = fn(&CodeSegment, &CheckContext) -> Vec<Verdict>;

/// Prompt-fragment generator; `None` means "does not apply here".
pub type LlmPrompter = fn(&CodeSegment, &CheckContext) -> Option<String>;

#[derive(Clone, Copy)]
pub enum Validator {
    Static(StaticCheck),
    Llm(LlmPrompter),
}

impl Validator {
    pub fn is_static(&self) -> bool {
        matches!(self, Validator::Static(_))
    }

    pub fn is_llm(&self) -> bool {
        matches!(self, Validator::Llm(_))
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Static(_) => f.write_str("Validator::Static"),
            Validator::Llm(_) => f.write_str("Validator::Llm"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// One checkable documentation requirement.
#[derive(Clone, Debug)]
pub struct Rule {
    pub code: u16,
    pub reference: String,
    pub name: &'static str,
    pub description: &'static str,
    /// `None` applies to every segment kind.
    pub scopes: Option<&'static [SegmentKind]>,
    pub group: RuleGroup,
    pub validator: Validator,
}

impl Rule {
    pub fn new(
        code: u16,
        name: &'static str,
        description: &'static str,
        scopes: Option<&'static [SegmentKind]>,
        validator: Validator,
    ) -> DolceResult<Self> {
        let group = RuleGroup::from_code(code)
            .ok_or_else(|| DolceError::Config(format!("Rule code {code} has no group")))?;
        Ok(Self {
            code,
            reference: reference_for(code),
            name,
            description,
            scopes,
            group,
            validator,
        })
    }

    pub fn applies_to(&self, kind: SegmentKind) -> bool {
        self.scopes.map_or(true, |scopes| scopes.contains(&kind))
    }

    pub fn is_static(&self) -> bool {
        self.validator.is_static()
    }

    pub fn is_llm(&self) -> bool {
        self.validator.is_llm()
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.reference, self.name)
    }
}

pub fn reference_for(code: u16) -> String {
    format!("{RULE_PREFIX}{code:03}")
}

/// Whether `token` is shaped like a rule reference (`DCE` + 3 digits).
pub fn is_reference_token(token: &str) -> bool {
    token.len() == RULE_PREFIX.len() + 3
        && token.starts_with(RULE_PREFIX)
        && token[RULE_PREFIX.len()..].bytes().all(|b| b.is_ascii_digit())
}
