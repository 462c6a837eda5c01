//! Shared tree-sitter helpers for Python sources

use arborium::tree_sitter::{Node, Parser, Tree};

/// Parse Python source text, returning `None` if the parser gives up
pub(crate) fn parse(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_python::language().into())
        .expect("Failed to load Python grammar");
    parser.parse(source, None)
}

/// The source text covered by a node
pub(crate) fn node_text<'a>(source: &'a str, node: Node) -> &'a str {
    &source[node.byte_range()]
}

/// The literal value of a plain string node, quotes stripped
///
/// An f-string with interpolation has no single literal value and yields
/// `None`.
pub(crate) fn string_literal(source: &str, node: Node) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    // Recent python grammars expose the value as string_content children;
    // an empty string has none.
    let mut content = String::new();
    let mut has_content = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "string_content" => {
                content.push_str(node_text(source, child));
                has_content = true;
            }
            "interpolation" => return None,
            _ => {}
        }
    }
    if has_content {
        return Some(content);
    }
    let raw = node_text(source, node);
    Some(
        raw.trim_matches(|c| c == '\'' || c == '"')
            .to_string(),
    )
}

/// First named child, if any
pub(crate) fn first_named_child(node: Node) -> Option<Node> {
    node.named_child(0)
}
