//! Docstring style enforcement (DCE2xx).

use super::documented;
use crate::models::{CodeSegment, Verdict};
use crate::rules::CheckContext;

pub fn invalid_docstring_style(segment: &CodeSegment, ctx: &CheckContext) -> Vec<Verdict> {
    let Some(doc) = documented(segment) else {
        return Vec::new();
    };
    match (ctx.ensure_style, doc.style) {
        (Some(expected), Some(used)) if expected != used => vec![Verdict::bad(format!(
            "Docstring style is '{used}', but should be '{expected}'."
        ))],
        _ => vec![Verdict::good()],
    }
}
