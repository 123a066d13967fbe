//! Consistency between docstrings and behavior (DCE5xx), judged by the oracle.

use super::documented;
use crate::models::CodeSegment;
use crate::rules::CheckContext;

pub fn func_behavior_mismatch(segment: &CodeSegment, _ctx: &CheckContext) -> Option<String> {
    documented(segment)?;
    Some(
        "The docstring summary does not match what the code does. For example, the docstring \
         says 'This function sends an email' but the code sends an SMS. Scopes: [DOCSTRING, CODE]"
            .to_string(),
    )
}

pub fn func_critical_behavior_omitted(
    segment: &CodeSegment,
    _ctx: &CheckContext,
) -> Option<String> {
    documented(segment)?;
    Some(
        "The code performs a CRITICAL behavior that the docstring never mentions. CRITICAL \
         means heavy or side-effecting work such as network calls, file writes or process \
         termination; minor behavior may stay undocumented. Scopes: [DESCRIPTION, CODE]"
            .to_string(),
    )
}
