//! Shared typed models used across extraction, rule checking and caching.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::docstring::StructuredDoc;
use crate::rules::Rule;

/// Decorators that turn a function into a property.
pub const PROPERTY_DECORATORS: &[&str] = &["property", "cached_property", "functools.cached_property"];

/// Return-type heads that mark a callable as a generator.
const GENERATOR_TYPES: &[&str] = &[
    "Generator",
    "Iterator",
    "Iterable",
    "AsyncGenerator",
    "AsyncIterator",
    "AsyncIterable",
];

// ---------------------------------------------------------------------------
// 1. SegmentKind
// ---------------------------------------------------------------------------

/// Kind of an analyzable unit of source code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentKind {
    Module,
    Class,
    Method,
    #[default]
    Function,
    Property,
}

impl SegmentKind {
    pub const ALL: &'static [SegmentKind] = &[
        SegmentKind::Module,
        SegmentKind::Class,
        SegmentKind::Method,
        SegmentKind::Function,
        SegmentKind::Property,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SegmentKind::Module => "module",
            SegmentKind::Class => "class",
            SegmentKind::Method => "method",
            SegmentKind::Function => "function",
            SegmentKind::Property => "property",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == name.trim().to_lowercase())
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// 2. CodeSegment
// ---------------------------------------------------------------------------

/// One function, method, class, property or module with its documentation.
#[derive(Clone, Debug, Default)]
pub struct CodeSegment {
    pub file_path: String,
    /// Display location, `path:line qualified.name`.
    pub location: String,
    pub name: String,
    pub line: usize,
    pub code: String,
    pub doc: String,
    pub parsed_doc: Option<StructuredDoc>,
    pub kind: SegmentKind,
    /// Declared parameters in order, mapped to their annotation if any.
    pub params: IndexMap<String, Option<String>>,
    pub args_name: Option<String>,
    pub args_type: Option<String>,
    pub kwargs_name: Option<String>,
    pub kwargs_type: Option<String>,
    pub returns: Option<String>,
    pub decorators: Vec<String>,
}

impl CodeSegment {
    pub fn has_doc(&self) -> bool {
        !self.doc.trim().is_empty()
    }

    pub fn is_private(&self) -> bool {
        self.name.starts_with('_')
    }

    /// `true` when the declared return type is a generator or iterator.
    pub fn is_generator(&self) -> bool {
        self.returns
            .as_deref()
            .is_some_and(|ret| generator_head(ret).is_some())
    }

    /// Yielded type: the first subscript argument of the generator annotation.
    pub fn generator_type(&self) -> Option<String> {
        let ret = self.returns.as_deref()?;
        let rest = generator_head(ret)?;
        let inner = rest.strip_prefix('[')?.strip_suffix(']')?;
        let first = split_top_level(inner).into_iter().next()?;
        let first = first.trim();
        if first.is_empty() {
            None
        } else {
            Some(first.to_string())
        }
    }

    pub fn is_property(&self) -> bool {
        self.kind == SegmentKind::Property
            || self
                .decorators
                .iter()
                .any(|d| PROPERTY_DECORATORS.contains(&d.trim_start_matches('@').trim()))
    }

    /// Declared return is the literal `None`.
    pub fn returns_none(&self) -> bool {
        self.returns.as_deref().map(str::trim) == Some("None")
    }

    /// A non-generator return section is documented.
    pub fn has_return_doc(&self) -> bool {
        self.parsed_doc
            .as_ref()
            .and_then(|doc| doc.returns.as_ref())
            .is_some_and(|ret| !ret.is_generator)
    }

    /// A yield section is documented.
    pub fn has_yield_doc(&self) -> bool {
        self.parsed_doc
            .as_ref()
            .and_then(|doc| doc.returns.as_ref())
            .is_some_and(|ret| ret.is_generator)
    }

    /// Segment identity used as cache key: code, path, line and kind.
    pub fn identity_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.code.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.file_path.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.line.to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(self.kind.name().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Signature parameter names the documentation is expected to cover.
    pub fn documentable_params(&self, ctx: &crate::rules::CheckContext) -> Vec<String> {
        let mut names: Vec<String> = self
            .params
            .keys()
            .filter(|name| name.as_str() != "self" && name.as_str() != "cls")
            .cloned()
            .collect();
        if !ctx.ignore_variadic_positional {
            if let Some(args) = &self.args_name {
                names.push(args.clone());
            }
        }
        if !ctx.ignore_variadic_keyword {
            if let Some(kwargs) = &self.kwargs_name {
                names.push(kwargs.clone());
            }
        }
        names
    }

    /// Whether `name` (optionally starred) is part of the signature.
    pub fn has_param(&self, name: &str) -> bool {
        let bare = name.trim_start_matches('*');
        self.params.contains_key(bare)
            || self.args_name.as_deref() == Some(bare)
            || self.kwargs_name.as_deref() == Some(bare)
    }

    /// Declared type of `name`, including the variadic annotations.
    pub fn param_type(&self, name: &str) -> Option<&str> {
        let bare = name.trim_start_matches('*');
        if let Some(ty) = self.params.get(bare) {
            return ty.as_deref();
        }
        if self.args_name.as_deref() == Some(bare) {
            return self.args_type.as_deref();
        }
        if self.kwargs_name.as_deref() == Some(bare) {
            return self.kwargs_type.as_deref();
        }
        None
    }
}

/// Return the text after a generator head (`Generator`, `typing.Iterator` ...).
fn generator_head(ret: &str) -> Option<&str> {
    let ret = ret.trim();
    let head_end = ret.find('[').unwrap_or(ret.len());
    let head = &ret[..head_end];
    let bare = head.rsplit('.').next().unwrap_or(head);
    if GENERATOR_TYPES.contains(&bare) {
        Some(&ret[head_end..])
    } else {
        None
    }
}

/// Split on commas that are not nested inside brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (pos, ch) in text.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&text[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

// ---------------------------------------------------------------------------
// 3. Verdict
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Good,
    Bad,
    Unknown,
}

/// Outcome of one rule on one segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: CheckStatus,
    #[serde(default)]
    pub issue: String,
}

impl Verdict {
    pub fn good() -> Self {
        Self {
            status: CheckStatus::Good,
            issue: String::new(),
        }
    }

    pub fn bad(issue: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Bad,
            issue: issue.into(),
        }
    }

    pub fn unknown(issue: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Unknown,
            issue: issue.into(),
        }
    }

    /// Good when `ok`, else Bad with `issue`.
    pub fn check(ok: bool, issue: impl Into<String>) -> Self {
        if ok {
            Self::good()
        } else {
            Self::bad(issue)
        }
    }

    /// One Bad per issue, or a single Good when there are none.
    pub fn from_issues(issues: Vec<String>) -> Vec<Self> {
        if issues.is_empty() {
            vec![Self::good()]
        } else {
            issues.into_iter().map(Self::bad).collect()
        }
    }

    pub fn is_good(&self) -> bool {
        self.status == CheckStatus::Good
    }

    pub fn is_bad(&self) -> bool {
        self.status == CheckStatus::Bad
    }
}

// ---------------------------------------------------------------------------
// 4. Report
// ---------------------------------------------------------------------------

/// Per-segment result: every rule that produced at least one verdict.
pub type Report<'c> = IndexMap<&'c Rule, Vec<Verdict>>;

/// A report is clean when every verdict is Good.
pub fn is_clean(report: &Report<'_>) -> bool {
    report.values().flatten().all(Verdict::is_good)
}
