//! Build [`CodeSegment`]s from a Python syntax tree.
//!
//! Segments come out in source order: the module first, then every class and
//! function definition in pre-order.  A function nested directly in a class
//! body is a method; one decorated with a property marker is a property.

use std::path::Path;

use indexmap::IndexMap;
use tree_sitter::Node;

use super::parser::{node_line, node_text, parse_python};
use crate::docstring;
use crate::errors::DolceResult;
use crate::models::{CodeSegment, SegmentKind, PROPERTY_DECORATORS};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    Module,
    Class,
    Function,
}

struct Builder<'s> {
    file_path: &'s str,
    source: &'s str,
    out: Vec<CodeSegment>,
}

/// Extract every segment of `source`, reported under `file_path`.
pub fn segments_from_source(file_path: &str, source: &str) -> DolceResult<Vec<CodeSegment>> {
    let tree = parse_python(source)?;
    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!("{file_path} has syntax errors; extracting what parsed");
    }

    let module_name = Path::new(file_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let doc = docstring_of(root, source);
    let mut builder = Builder {
        file_path,
        source,
        out: Vec::new(),
    };
    let module = CodeSegment {
        location: format!("{file_path}:1 {module_name}"),
        name: module_name,
        line: 1,
        code: source.to_string(),
        kind: SegmentKind::Module,
        ..builder.with_doc(doc)
    };
    builder.push(module);
    builder.visit_block(root, &[], Scope::Module);
    Ok(builder.out)
}

impl<'s> Builder<'s> {
    fn push(&mut self, segment: CodeSegment) {
        self.out.push(segment);
    }

    /// Base segment carrying the file path and the given docstring.
    fn with_doc(&self, doc: String) -> CodeSegment {
        let parsed_doc = if doc.trim().is_empty() {
            None
        } else {
            docstring::parse(&doc).ok()
        };
        CodeSegment {
            file_path: self.file_path.to_string(),
            doc,
            parsed_doc,
            ..CodeSegment::default()
        }
    }

    fn visit_block(&mut self, block: Node<'_>, qualname: &[String], scope: Scope) {
        let mut cursor = block.walk();
        for child in block.named_children(&mut cursor) {
            self.visit_statement(child, qualname, scope);
        }
    }

    fn visit_statement(&mut self, node: Node<'_>, qualname: &[String], scope: Scope) {
        match node.kind() {
            "function_definition" => self.visit_function(node, Vec::new(), qualname, scope),
            "class_definition" => self.visit_class(node, qualname),
            "decorated_definition" => {
                let mut cursor = node.walk();
                let decorators: Vec<String> = node
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() == "decorator")
                    .map(|c| {
                        node_text(c, self.source)
                            .trim_start_matches('@')
                            .trim()
                            .to_string()
                    })
                    .collect();
                let Some(definition) = node.child_by_field_name("definition") else {
                    return;
                };
                match definition.kind() {
                    "function_definition" => {
                        self.visit_function(definition, decorators, qualname, scope)
                    }
                    "class_definition" => self.visit_class(definition, qualname),
                    _ => {}
                }
            }
            // Definitions guarded by if/try/with blocks still count.
            "if_statement" | "try_statement" | "with_statement" | "for_statement"
            | "while_statement" | "block" | "else_clause" | "elif_clause" | "except_clause"
            | "finally_clause" => self.visit_block(node, qualname, scope),
            _ => {}
        }
    }

    fn visit_class(&mut self, node: Node<'_>, qualname: &[String]) {
        let name = field_text(node, "name", self.source).to_string();
        let line = node_line(node);
        let path = extend(qualname, &name);
        let doc = node
            .child_by_field_name("body")
            .map(|body| docstring_of(body, self.source))
            .unwrap_or_default();

        let segment = CodeSegment {
            location: format!("{}:{line} {}", self.file_path, path.join(".")),
            name,
            line,
            code: node_text(node, self.source).to_string(),
            kind: SegmentKind::Class,
            ..self.with_doc(doc)
        };
        self.push(segment);

        if let Some(body) = node.child_by_field_name("body") {
            self.visit_block(body, &path, Scope::Class);
        }
    }

    fn visit_function(
        &mut self,
        node: Node<'_>,
        decorators: Vec<String>,
        qualname: &[String],
        scope: Scope,
    ) {
        let name = field_text(node, "name", self.source).to_string();
        let line = node_line(node);
        let path = extend(qualname, &name);
        let body = node.child_by_field_name("body");
        let doc = body
            .map(|b| docstring_of(b, self.source))
            .unwrap_or_default();

        let is_property = decorators
            .iter()
            .any(|d| PROPERTY_DECORATORS.contains(&d.as_str()));
        let kind = match (is_property, scope) {
            (true, _) => SegmentKind::Property,
            (false, Scope::Class) => SegmentKind::Method,
            (false, _) => SegmentKind::Function,
        };

        let mut segment = CodeSegment {
            location: format!("{}:{line} {}", self.file_path, path.join(".")),
            name,
            line,
            code: node_text(node, self.source).to_string(),
            kind,
            returns: node
                .child_by_field_name("return_type")
                .map(|t| node_text(t, self.source).to_string()),
            decorators,
            ..self.with_doc(doc)
        };
        if let Some(params) = node.child_by_field_name("parameters") {
            collect_params(params, self.source, &mut segment);
        }
        self.push(segment);

        if let Some(body) = body {
            self.visit_block(body, &path, Scope::Function);
        }
    }
}

fn extend(qualname: &[String], name: &str) -> Vec<String> {
    let mut path = qualname.to_vec();
    path.push(name.to_string());
    path
}

fn field_text<'s>(node: Node<'_>, field: &str, source: &'s str) -> &'s str {
    node.child_by_field_name(field)
        .map(|n| node_text(n, source))
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

fn collect_params(params: Node<'_>, source: &str, segment: &mut CodeSegment) {
    let mut named: IndexMap<String, Option<String>> = IndexMap::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "identifier" => {
                named.insert(node_text(param, source).to_string(), None);
            }
            "default_parameter" => {
                named.insert(field_text(param, "name", source).to_string(), None);
            }
            "typed_default_parameter" => {
                let ty = param
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source).to_string());
                named.insert(field_text(param, "name", source).to_string(), ty);
            }
            "typed_parameter" => {
                let ty = param
                    .child_by_field_name("type")
                    .map(|t| node_text(t, source).to_string());
                let Some(target) = param.named_child(0) else {
                    continue;
                };
                match target.kind() {
                    "list_splat_pattern" => {
                        segment.args_name = Some(splat_name(target, source));
                        segment.args_type = ty;
                    }
                    "dictionary_splat_pattern" => {
                        segment.kwargs_name = Some(splat_name(target, source));
                        segment.kwargs_type = ty;
                    }
                    _ => {
                        named.insert(node_text(target, source).to_string(), ty);
                    }
                }
            }
            "list_splat_pattern" => segment.args_name = Some(splat_name(param, source)),
            "dictionary_splat_pattern" => segment.kwargs_name = Some(splat_name(param, source)),
            _ => {}
        }
    }
    segment.params = named;
}

fn splat_name(node: Node<'_>, source: &str) -> String {
    node_text(node, source).trim_start_matches('*').trim().to_string()
}

// ---------------------------------------------------------------------------
// Docstrings
// ---------------------------------------------------------------------------

/// Cleaned docstring of a module or definition body, or `""`.
fn docstring_of(body: Node<'_>, source: &str) -> String {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    let Some(statement) = first.filter(|s| s.kind() == "expression_statement") else {
        return String::new();
    };
    let Some(literal) = statement.named_child(0) else {
        return String::new();
    };
    match literal.kind() {
        "string" => clean_doc(&string_value(node_text(literal, source))),
        "concatenated_string" => {
            let mut cursor = literal.walk();
            let joined: String = literal
                .named_children(&mut cursor)
                .filter(|part| part.kind() == "string")
                .map(|part| string_value(node_text(part, source)))
                .collect();
            clean_doc(&joined)
        }
        _ => String::new(),
    }
}

/// Body of a Python string literal: prefix and quotes removed.
fn string_value(literal: &str) -> String {
    let body = literal.trim_start_matches(|c: char| "rRuUbBfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(inner) = body
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    body.to_string()
}

/// Leading whitespace width in characters, so non-ASCII blanks count once.
fn indent_chars(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Normalize indentation like Python's `inspect.cleandoc`.
pub fn clean_doc(raw: &str) -> String {
    let expanded = raw.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let margin = lines[1..]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_chars(line))
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim_start().to_string());
    for line in &lines[1..] {
        let cut = margin.min(indent_chars(line));
        let start = line.char_indices().nth(cut).map_or(line.len(), |(pos, _)| pos);
        cleaned.push(line[start..].trim_end().to_string());
    }
    while cleaned.first().is_some_and(|l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.trim().is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}
