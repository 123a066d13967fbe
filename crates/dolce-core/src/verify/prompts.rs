//! Prompt templates for batched oracle checks.

use crate::models::CodeSegment;
use crate::rules::Rule;

const SYSTEM_HEADER: &str = "\
You are an expert Python docstring analyzer. Decide whether the docstring of the \
code you are given violates any of the rules listed below.

Analysis scopes:
- DOCSTRING: the whole docstring, every section included.
- DESCRIPTION: the summary and long description of the docstring.
- PARAM_DESCRIPTION: the description of each documented parameter.
- RETURN_DESCRIPTION: the description of the documented return value.
- DOC_PARAM: the whole parameter section of the docstring.
- PARAMS: the parameters of the signature.
- CODE: the implementation itself.

RULES TO CHECK:
";

const SYSTEM_FOOTER: &str = r#"
Check every rule independently of the others, looking only at the scopes the rule names.

Reply with exactly this JSON object:

{
    "status": "CORRECT" or "INCORRECT",
    "issues": [references (DCEXXX) of the violated rules, empty when CORRECT],
    "descr": [one sentence per issue describing it, same order as "issues"]
}

Do not add any commentary outside the JSON object."#;

/// System prompt listing every rule fragment labeled by its reference.
pub fn system_prompt(fragments: &[(&Rule, String)]) -> String {
    let mut prompt = String::from(SYSTEM_HEADER);
    for (rule, fragment) in fragments {
        prompt.push_str(&format!("- {}: {}\n", rule.reference, fragment));
    }
    prompt.push_str(SYSTEM_FOOTER);
    prompt
}

pub fn user_prompt(segment: &CodeSegment) -> String {
    format!("Check this code:\n```python\n{}\n```", segment.code)
}
