//! Spelling of docstring prose (DCE4xx), judged by the oracle.

use super::{documented, is_blank};
use crate::models::CodeSegment;
use crate::rules::CheckContext;

const TYPO_EXAMPLES: &str = "Examples: 'functon' instead of 'function', 'retrun' instead of 'return'. Report each typo found.";

pub fn description_spelling(segment: &CodeSegment, _ctx: &CheckContext) -> Option<String> {
    let doc = documented(segment)?;
    if is_blank(doc.summary.as_deref()) && is_blank(doc.description.as_deref()) {
        return None;
    }
    Some(format!(
        "The docstring DESCRIPTION contains TYPOS. {TYPO_EXAMPLES} Scopes: [DESCRIPTION]"
    ))
}

pub fn param_desc_spelling(segment: &CodeSegment, _ctx: &CheckContext) -> Option<String> {
    let doc = documented(segment)?;
    if doc.params.iter().all(|p| is_blank(p.description.as_deref())) {
        return None;
    }
    Some(format!(
        "The description of some PARAMETERS contains TYPOS. {TYPO_EXAMPLES} Scopes: [PARAM_DESCRIPTION]"
    ))
}

pub fn return_desc_spelling(segment: &CodeSegment, _ctx: &CheckContext) -> Option<String> {
    let ret = documented(segment)?.returns.as_ref()?;
    if is_blank(ret.description.as_deref()) {
        return None;
    }
    Some(format!(
        "The description of the RETURN VALUE contains TYPOS. {TYPO_EXAMPLES} Scopes: [RETURN_DESCRIPTION]"
    ))
}
