//! NumPy-style docstrings: section titles underlined with dashes.

use super::{
    clean_type, indent_of, non_empty, push_description, summary_of, DocParam, DocReturns,
    DocStyle, StructuredDoc, UNDERLINE_RE,
};
use crate::errors::DolceResult;

const SECTION_TITLES: &[&str] = &[
    "Parameters",
    "Params",
    "Arguments",
    "Args",
    "Other Parameters",
    "Keyword Arguments",
    "Receives",
    "Returns",
    "Return",
    "Yields",
    "Yield",
    "Raises",
    "Warns",
    "Warnings",
    "See Also",
    "Notes",
    "References",
    "Examples",
    "Attributes",
    "Methods",
];

pub fn is_section_title(line: &str) -> bool {
    SECTION_TITLES.contains(&line.trim())
}

fn is_section_start(lines: &[&str], i: usize) -> bool {
    i + 1 < lines.len() && is_section_title(lines[i]) && UNDERLINE_RE.is_match(lines[i + 1])
}

/// One `name : type` entry followed by its indented description.
struct Entry<'a> {
    head: &'a str,
    description: Option<String>,
}

fn entries<'a>(body: &[&'a str]) -> Vec<Entry<'a>> {
    let Some(entry_indent) = body
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_of(line))
        .min()
    else {
        return Vec::new();
    };

    let mut out: Vec<Entry<'a>> = Vec::new();
    for line in body {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) == entry_indent {
            out.push(Entry {
                head: line.trim(),
                description: None,
            });
        } else if let Some(entry) = out.last_mut() {
            push_description(&mut entry.description, line);
        }
    }
    out
}

pub fn parse(text: &str) -> DolceResult<StructuredDoc> {
    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() && !is_section_start(&lines, i) {
        i += 1;
    }
    let leading = lines[..i].join("\n");
    let mut doc = StructuredDoc {
        summary: summary_of(&leading),
        description: non_empty(&leading),
        style: Some(DocStyle::Numpy),
        ..StructuredDoc::default()
    };

    while i < lines.len() {
        let title = lines[i].trim();
        i += 2;
        let start = i;
        while i < lines.len() && !is_section_start(&lines, i) {
            i += 1;
        }
        let body = &lines[start..i];

        match title {
            "Parameters" | "Params" | "Arguments" | "Args" | "Other Parameters"
            | "Keyword Arguments" => {
                for entry in entries(body) {
                    let (names, type_name) = match entry.head.split_once(':') {
                        Some((names, ty)) => (names, clean_type(ty)),
                        None => (entry.head, None),
                    };
                    for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                        doc.params.push(DocParam {
                            name: name.to_string(),
                            type_name: type_name.clone(),
                            description: entry.description.clone(),
                        });
                    }
                }
            }
            "Returns" | "Return" | "Yields" | "Yield" => {
                let is_generator = title.starts_with("Yield");
                if let Some(entry) = entries(body).into_iter().next() {
                    let type_name = match entry.head.split_once(':') {
                        Some((_, ty)) => non_empty(ty),
                        None => non_empty(entry.head),
                    };
                    doc.set_returns(DocReturns {
                        type_name,
                        description: entry.description,
                        is_generator,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(doc)
}
