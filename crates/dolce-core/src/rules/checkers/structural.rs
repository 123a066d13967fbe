//! Presence and syntax of docstrings (DCE1xx).

use crate::docstring;
use crate::models::{CodeSegment, Verdict};
use crate::rules::CheckContext;

pub fn invalid_docstring_syntax(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    if !segment.has_doc() {
        return Vec::new();
    }
    match docstring::parse(&segment.doc) {
        Ok(_) => vec![Verdict::good()],
        Err(err) => vec![Verdict::bad(err.to_string())],
    }
}

pub fn missing_module_docstring(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    vec![Verdict::check(segment.has_doc(), "")]
}

pub fn missing_class_docstring(segment: &CodeSegment, ctx: &CheckContext) -> Vec<Verdict> {
    presence(segment, ctx)
}

pub fn missing_method_docstring(segment: &CodeSegment, ctx: &CheckContext) -> Vec<Verdict> {
    presence(segment, ctx)
}

pub fn missing_func_docstring(segment: &CodeSegment, ctx: &CheckContext) -> Vec<Verdict> {
    presence(segment, ctx)
}

fn presence(segment: &CodeSegment, ctx: &CheckContext) -> Vec<Verdict> {
    if ctx.ignore_private_segments && segment.is_private() {
        return Vec::new();
    }
    vec![Verdict::check(segment.has_doc(), "")]
}
