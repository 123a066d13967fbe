//! tree-sitter wrapper for Python sources.

use tree_sitter::{Node, Parser, Tree};

use crate::errors::{DolceError, DolceResult};

pub fn parse_python(source: &str) -> DolceResult<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| DolceError::Parse(format!("Failed to set language: {e}")))?;
    parser
        .parse(source.as_bytes(), None)
        .ok_or_else(|| DolceError::Parse("tree-sitter returned no tree".to_string()))
}

/// Source text of `node`.
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-based line of the start of `node`.
pub fn node_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}
