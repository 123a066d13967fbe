//! Docstring grammar parsing.
//!
//! Turns a cleaned docstring into a [`StructuredDoc`]: summary, long
//! description, documented parameters and the return/yield section.  Three
//! styles are understood (Google, NumPy and reST/Sphinx field lists); the
//! style is detected from the section markers present in the text.

pub mod google;
pub mod numpy;
pub mod rest;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{DolceError, DolceResult};

// ---------------------------------------------------------------------------
// Structured types
// ---------------------------------------------------------------------------

/// Docstring layout convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocStyle {
    Google,
    Numpy,
    Rest,
}

impl DocStyle {
    pub fn name(&self) -> &'static str {
        match self {
            DocStyle::Google => "google",
            DocStyle::Numpy => "numpy",
            DocStyle::Rest => "rest",
        }
    }

    /// Resolve a user supplied style name (`sphinx` is an alias of `rest`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "google" => Some(DocStyle::Google),
            "numpy" | "numpydoc" => Some(DocStyle::Numpy),
            "rest" | "sphinx" => Some(DocStyle::Rest),
            _ => None,
        }
    }
}

impl fmt::Display for DocStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A documented parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocParam {
    pub name: String,
    pub type_name: Option<String>,
    pub description: Option<String>,
}

/// A documented return or yield section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocReturns {
    pub type_name: Option<String>,
    pub description: Option<String>,
    pub is_generator: bool,
}

/// Parsed docstring.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructuredDoc {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub params: Vec<DocParam>,
    pub returns: Option<DocReturns>,
    /// `None` when the docstring carries no section markers at all.
    pub style: Option<DocStyle>,
}

impl StructuredDoc {
    /// Record a return/yield section; the first one documented wins.
    pub(crate) fn set_returns(&mut self, returns: DocReturns) {
        if self.returns.is_none() {
            self.returns = Some(returns);
        }
    }
}

// ---------------------------------------------------------------------------
// Style detection
// ---------------------------------------------------------------------------

static REST_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*:(param|parameter|arg|argument|key|keyword|type|returns?|rtype|yields?|ytype|raises?|except|exception)\b",
    )
    .unwrap()
});

static GOOGLE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(Args|Arguments|Parameters|Params|Keyword Args|Keyword Arguments|Other Parameters|Returns|Return|Yields|Yield|Raises|Raise|Exceptions|Attributes|Example|Examples|Note|Notes|Todo|Warning|Warnings|See Also|References)\s*:\s*$",
    )
    .unwrap()
});

static UNDERLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-{3,}\s*$").unwrap());

/// Detect the style of a cleaned docstring from its section markers.
pub fn detect_style(text: &str) -> Option<DocStyle> {
    if REST_FIELD_RE.is_match(text) {
        return Some(DocStyle::Rest);
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines
        .windows(2)
        .any(|w| numpy::is_section_title(w[0]) && UNDERLINE_RE.is_match(w[1]))
    {
        return Some(DocStyle::Numpy);
    }
    if lines.iter().any(|line| GOOGLE_HEADER_RE.is_match(line)) {
        return Some(DocStyle::Google);
    }
    None
}

/// Parse a docstring, detecting its style.
pub fn parse(text: &str) -> DolceResult<StructuredDoc> {
    match detect_style(text) {
        Some(DocStyle::Rest) => rest::parse(text),
        Some(DocStyle::Numpy) => numpy::parse(text),
        Some(DocStyle::Google) => google::parse(text),
        None => Ok(StructuredDoc {
            summary: summary_of(text),
            description: non_empty(text.trim()),
            ..StructuredDoc::default()
        }),
    }
}

// ---------------------------------------------------------------------------
// Helpers shared by the style parsers
// ---------------------------------------------------------------------------

pub(crate) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First paragraph of the leading text, joined onto one line.
pub(crate) fn summary_of(text: &str) -> Option<String> {
    let paragraph: Vec<&str> = text
        .trim()
        .lines()
        .map(str::trim)
        .take_while(|line| !line.is_empty())
        .collect();
    non_empty(&paragraph.join(" "))
}

/// Append a continuation line to an optional description.
pub(crate) fn push_description(description: &mut Option<String>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match description {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(line);
        }
        None => *description = Some(line.to_string()),
    }
}

/// Strip the `optional` marker used by Google and NumPy parameter types.
pub(crate) fn clean_type(raw: &str) -> Option<String> {
    let mut ty = raw.trim();
    for suffix in [", optional", ",optional", " optional"] {
        if let Some(stripped) = ty.strip_suffix(suffix) {
            ty = stripped.trim_end();
        }
    }
    if ty == "optional" {
        return None;
    }
    non_empty(ty)
}

pub(crate) fn parse_error(message: String) -> DolceError {
    DolceError::Parse(message)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
