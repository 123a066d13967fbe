//! Validator functions referenced by the built-in catalogue.

pub mod content;
pub mod semantic;
pub mod signature;
pub mod structural;
pub mod style;

use crate::docstring::StructuredDoc;
use crate::models::CodeSegment;

/// Parsed documentation of a segment whose docstring is non-blank.
pub(crate) fn documented(segment: &CodeSegment) -> Option<&StructuredDoc> {
    if segment.has_doc() {
        segment.parsed_doc.as_ref()
    } else {
        None
    }
}

pub(crate) fn is_blank(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.trim().is_empty())
}
