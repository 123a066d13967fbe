//! Google-style docstrings (`Args:`, `Returns:`, `Yields:` sections).

use std::sync::LazyLock;

use regex::Regex;

use super::{
    clean_type, indent_of, non_empty, parse_error, push_description, summary_of, DocParam,
    DocReturns, DocStyle, StructuredDoc, GOOGLE_HEADER_RE,
};
use crate::errors::DolceResult;

static PARAM_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*{0,2}[A-Za-z_][A-Za-z0-9_]*)\s*(?:\(([^)]*)\))?\s*:(.*)$").unwrap()
});

enum Section {
    Params,
    Returns,
    Yields,
    Other,
}

fn section_of(title: &str) -> Section {
    match title {
        "Args" | "Arguments" | "Parameters" | "Params" | "Keyword Args" | "Keyword Arguments"
        | "Other Parameters" => Section::Params,
        "Returns" | "Return" => Section::Returns,
        "Yields" | "Yield" => Section::Yields,
        _ => Section::Other,
    }
}

fn is_header(line: &str) -> bool {
    GOOGLE_HEADER_RE.is_match(line)
}

pub fn parse(text: &str) -> DolceResult<StructuredDoc> {
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() && !is_header(lines[i]) {
        i += 1;
    }
    let leading = lines[..i].join("\n");
    let mut doc = StructuredDoc {
        summary: summary_of(&leading),
        description: non_empty(&leading),
        style: Some(DocStyle::Google),
        ..StructuredDoc::default()
    };

    while i < lines.len() {
        let header = lines[i];
        let header_indent = indent_of(header);
        let title = header.trim().trim_end_matches(':').trim();
        i += 1;

        let start = i;
        while i < lines.len() {
            let line = lines[i];
            if !line.trim().is_empty() && indent_of(line) <= header_indent {
                break;
            }
            i += 1;
        }
        let body = &lines[start..i];

        match section_of(title) {
            Section::Params => parse_params(body, &mut doc)?,
            Section::Returns => doc.set_returns(parse_returns(body, false)),
            Section::Yields => doc.set_returns(parse_returns(body, true)),
            Section::Other => {}
        }

        while i < lines.len() && !is_header(lines[i]) {
            i += 1;
        }
    }

    Ok(doc)
}

fn parse_params(body: &[&str], doc: &mut StructuredDoc) -> DolceResult<()> {
    let Some(entry_indent) = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_of(line))
        .min()
    else {
        return Ok(());
    };

    let mut current: Option<DocParam> = None;
    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) == entry_indent {
            if let Some(param) = current.take() {
                doc.params.push(param);
            }
            let entry = line.trim();
            let caps = PARAM_ENTRY_RE
                .captures(entry)
                .ok_or_else(|| parse_error(format!("Can't parse parameter entry \"{entry}\"")))?;
            current = Some(DocParam {
                name: caps[1].to_string(),
                type_name: caps.get(2).and_then(|m| clean_type(m.as_str())),
                description: non_empty(&caps[3]),
            });
        } else if let Some(param) = current.as_mut() {
            push_description(&mut param.description, line);
        }
    }
    if let Some(param) = current {
        doc.params.push(param);
    }
    Ok(())
}

fn parse_returns(body: &[&str], is_generator: bool) -> DocReturns {
    let lines: Vec<&str> = body
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();
    let Some(first) = lines.first() else {
        return DocReturns {
            is_generator,
            ..DocReturns::default()
        };
    };

    let (type_name, head) = split_type_prefix(first);
    let mut description = non_empty(head);
    for line in &lines[1..] {
        push_description(&mut description, line);
    }
    DocReturns {
        type_name,
        description,
        is_generator,
    }
}

/// Split `type: description` when the part before the first top-level colon
/// reads like a type expression (no spaces outside brackets).
fn split_type_prefix(line: &str) -> (Option<String>, &str) {
    let mut depth = 0i32;
    for (pos, ch) in line.char_indices() {
        match ch {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            ':' if depth == 0 => {
                let candidate = line[..pos].trim();
                if looks_like_type(candidate) {
                    return (Some(candidate.to_string()), &line[pos + 1..]);
                }
                return (None, line);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !line[..pos].trim().is_empty() && !line[pos..].trim_start().starts_with(':') {
                    return (None, line);
                }
            }
            _ => {}
        }
    }
    (None, line)
}

fn looks_like_type(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    let mut depth = 0i32;
    for ch in candidate.chars() {
        match ch {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => return false,
            _ => {}
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_and_returns() {
        let doc = "\
Add two numbers.

Longer explanation.

Args:
    a (int): First operand.
    b (int, optional): Second operand
        spanning two lines.

Returns:
    int: The sum.
";
        let parsed = parse(doc).unwrap();
        assert_eq!(parsed.style, Some(DocStyle::Google));
        assert_eq!(parsed.summary.as_deref(), Some("Add two numbers."));
        assert_eq!(parsed.params.len(), 2);
        assert_eq!(parsed.params[0].name, "a");
        assert_eq!(parsed.params[0].type_name.as_deref(), Some("int"));
        assert_eq!(parsed.params[1].type_name.as_deref(), Some("int"));
        assert_eq!(
            parsed.params[1].description.as_deref(),
            Some("Second operand spanning two lines.")
        );
        let returns = parsed.returns.unwrap();
        assert_eq!(returns.type_name.as_deref(), Some("int"));
        assert_eq!(returns.description.as_deref(), Some("The sum."));
        assert!(!returns.is_generator);
    }

    #[test]
    fn test_untyped_param_and_empty_description() {
        let doc = "Summary.\n\nArgs:\n    param:\n    other: Something.\n";
        let parsed = parse(doc).unwrap();
        assert_eq!(parsed.params[0].name, "param");
        assert_eq!(parsed.params[0].type_name, None);
        assert_eq!(parsed.params[0].description, None);
        assert_eq!(parsed.params[1].description.as_deref(), Some("Something."));
    }

    #[test]
    fn test_returns_without_type() {
        let doc = "Summary.\n\nReturns:\n    None\n";
        let returns = parse(doc).unwrap().returns.unwrap();
        assert_eq!(returns.type_name, None);
        assert_eq!(returns.description.as_deref(), Some("None"));
    }

    #[test]
    fn test_returns_sentence_with_colon_is_not_a_type() {
        let doc = "Summary.\n\nReturns:\n    The mapping of names: values.\n";
        let returns = parse(doc).unwrap().returns.unwrap();
        assert_eq!(returns.type_name, None);
    }

    #[test]
    fn test_generic_return_type() {
        let doc = "Summary.\n\nReturns:\n    dict[str, int]: Counts per name.\n";
        let returns = parse(doc).unwrap().returns.unwrap();
        assert_eq!(returns.type_name.as_deref(), Some("dict[str, int]"));
        assert_eq!(returns.description.as_deref(), Some("Counts per name."));
    }

    #[test]
    fn test_yields_section() {
        let doc = "Summary.\n\nYields:\n    int: Next value.\n";
        let returns = parse(doc).unwrap().returns.unwrap();
        assert!(returns.is_generator);
        assert_eq!(returns.type_name.as_deref(), Some("int"));
    }

    #[test]
    fn test_variadic_names_kept() {
        let doc = "Summary.\n\nArgs:\n    *args: Positional.\n    **kwargs: Keywords.\n";
        let parsed = parse(doc).unwrap();
        assert_eq!(parsed.params[0].name, "*args");
        assert_eq!(parsed.params[1].name, "**kwargs");
    }

    #[test]
    fn test_malformed_entry_is_error() {
        let doc = "Summary.\n\nArgs:\n    this line is not an entry\n";
        assert!(parse(doc).is_err());
    }

    #[test]
    fn test_other_sections_ignored() {
        let doc = "Summary.\n\nRaises:\n    ValueError: If bad.\n\nArgs:\n    x (str): X.\n";
        let parsed = parse(doc).unwrap();
        assert_eq!(parsed.params.len(), 1);
        assert_eq!(parsed.params[0].name, "x");
    }
}
