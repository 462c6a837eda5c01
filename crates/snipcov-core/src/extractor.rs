//! Snippet extraction from Python source files
//!
//! Parses a source file's syntax tree, finds top-level functions and class
//! methods, and classifies how each one is invoked. Classification precedence
//! per function: Flask route decorator, then webapp2 routing-table handler,
//! then plain direct invocation.

use crate::python;
use crate::snippet::{
    FLASK_DEFAULT_METHODS, HTTP_METHOD_NAMES, IGNORED_FUNCTION_NAMES, ParserKind, SnippetFunction,
};
use arborium::tree_sitter::Node;
use std::collections::HashMap;
use std::path::Path;

/// Extract all snippet functions from one source file, in document order
///
/// Functions whose name is in the fixed ignore-list are excluded. Region
/// tags are not attached here; see
/// [`add_region_tags_to_snippets`](crate::snippet::add_region_tags_to_snippets).
pub fn extract_snippets(path: &Path, source: &str) -> Vec<SnippetFunction> {
    let Some(tree) = python::parse(source) else {
        return Vec::new();
    };
    let root = tree.root_node();

    let routes = webapp2_routes(source, root);
    let module_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut snippets = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                if let Some(s) = module_function(path, source, child, child, &[], &module_name) {
                    snippets.push(s);
                }
            }
            "decorated_definition" => {
                let Some(definition) = child.child_by_field_name("definition") else {
                    continue;
                };
                let decorators = decorator_nodes(child);
                match definition.kind() {
                    "function_definition" => {
                        if let Some(s) = module_function(
                            path,
                            source,
                            definition,
                            child,
                            &decorators,
                            &module_name,
                        ) {
                            snippets.push(s);
                        }
                    }
                    "class_definition" => {
                        class_methods(path, source, definition, &routes, &mut snippets);
                    }
                    _ => {}
                }
            }
            "class_definition" => {
                class_methods(path, source, child, &routes, &mut snippets);
            }
            _ => {}
        }
    }

    snippets.retain(|s| !IGNORED_FUNCTION_NAMES.contains(&s.name.as_str()));
    snippets
}

/// Build a snippet for a module-level function
fn module_function(
    path: &Path,
    source: &str,
    definition: Node,
    span: Node,
    decorators: &[Node],
    module_name: &str,
) -> Option<SnippetFunction> {
    let name = function_name(source, definition)?;
    let parser = match flask_route(source, decorators) {
        Some((url, http_methods)) => ParserKind::FlaskRouter { url, http_methods },
        None => ParserKind::DirectInvocation {
            class_name: module_name.to_string(),
            method_name: name.clone(),
        },
    };
    Some(snippet(path, span, name, parser))
}

/// Build snippets for every method of a top-level class
fn class_methods(
    path: &Path,
    source: &str,
    class_def: Node,
    routes: &HashMap<String, String>,
    snippets: &mut Vec<SnippetFunction>,
) {
    let Some(class_name) =
        class_def.child_by_field_name("name").map(|n| python::node_text(source, n).to_string())
    else {
        return;
    };
    let Some(body) = class_def.child_by_field_name("body") else {
        return;
    };

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        let (definition, span, decorators) = match child.kind() {
            "function_definition" => (child, child, Vec::new()),
            "decorated_definition" => {
                let Some(def) = child.child_by_field_name("definition") else {
                    continue;
                };
                if def.kind() != "function_definition" {
                    continue;
                }
                (def, child, decorator_nodes(child))
            }
            _ => continue,
        };
        let Some(name) = function_name(source, definition) else {
            continue;
        };

        let parser = if let Some((url, http_methods)) = flask_route(source, &decorators) {
            ParserKind::FlaskRouter { url, http_methods }
        } else if let Some(url) = routes.get(&class_name) {
            if HTTP_METHOD_NAMES.contains(&name.as_str()) {
                ParserKind::Webapp2Router {
                    url: url.clone(),
                    http_method: name.clone(),
                }
            } else {
                direct(&class_name, &name)
            }
        } else {
            direct(&class_name, &name)
        };

        snippets.push(snippet(path, span, name, parser));
    }
}

fn direct(class_name: &str, method_name: &str) -> ParserKind {
    ParserKind::DirectInvocation {
        class_name: class_name.to_string(),
        method_name: method_name.to_string(),
    }
}

fn snippet(path: &Path, span: Node, name: String, parser: ParserKind) -> SnippetFunction {
    SnippetFunction {
        name,
        source_path: path.to_path_buf(),
        start_line: span.start_position().row + 1,
        end_line: span.end_position().row + 1,
        parser,
        region_tags: Vec::new(),
        test_methods: Vec::new(),
    }
}

fn function_name(source: &str, definition: Node) -> Option<String> {
    definition
        .child_by_field_name("name")
        .map(|n| python::node_text(source, n).to_string())
}

fn decorator_nodes(decorated: Node) -> Vec<Node> {
    let mut decorators = Vec::new();
    let mut cursor = decorated.walk();
    for child in decorated.children(&mut cursor) {
        if child.kind() == "decorator" {
            decorators.push(child);
        }
    }
    decorators
}

/// Detect a Flask-style route decorator: `@<receiver>.route(url, methods=[...])`
///
/// Returns the URL and the declared HTTP methods (lowercased); a route with
/// no explicit `methods` list gets the fixed Flask default set.
fn flask_route(source: &str, decorators: &[Node]) -> Option<(String, Vec<String>)> {
    for decorator in decorators {
        let Some(expr) = python::first_named_child(*decorator) else {
            continue;
        };
        if expr.kind() != "call" {
            continue;
        }
        let Some(function) = expr.child_by_field_name("function") else {
            continue;
        };
        if function.kind() != "attribute" {
            continue;
        }
        let is_route = function
            .child_by_field_name("attribute")
            .map(|a| python::node_text(source, a) == "route")
            .unwrap_or(false);
        if !is_route {
            continue;
        }

        let Some(arguments) = expr.child_by_field_name("arguments") else {
            continue;
        };
        let mut url = None;
        let mut methods = None;
        let mut cursor = arguments.walk();
        for arg in arguments.named_children(&mut cursor) {
            match arg.kind() {
                "string" if url.is_none() => url = python::string_literal(source, arg),
                "keyword_argument" => {
                    let is_methods = arg
                        .child_by_field_name("name")
                        .map(|n| python::node_text(source, n) == "methods")
                        .unwrap_or(false);
                    if is_methods {
                        if let Some(value) = arg.child_by_field_name("value") {
                            methods = Some(string_list(source, value));
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(url) = url {
            let http_methods = match methods {
                Some(m) if !m.is_empty() => m,
                _ => FLASK_DEFAULT_METHODS.iter().map(|m| m.to_string()).collect(),
            };
            return Some((url, http_methods));
        }
    }
    None
}

/// Lowercased string elements of a list/tuple literal
fn string_list(source: &str, node: Node) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(s) = python::string_literal(source, child) {
            out.push(s.to_lowercase());
        }
    }
    out
}

/// Collect webapp2-style routing-table entries: class name -> URL
///
/// Recognizes top-level `<x> = webapp2.WSGIApplication([(url, Handler), ...])`
/// assignments. The first route mentioning a class wins.
fn webapp2_routes(source: &str, root: Node) -> HashMap<String, String> {
    let mut routes = HashMap::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        let assignment = match child.kind() {
            "assignment" => child,
            "expression_statement" => match python::first_named_child(child) {
                Some(inner) => inner,
                None => continue,
            },
            _ => continue,
        };
        if assignment.kind() != "assignment" {
            continue;
        }
        let Some(right) = assignment.child_by_field_name("right") else {
            continue;
        };
        if right.kind() != "call" {
            continue;
        }
        let Some(function) = right.child_by_field_name("function") else {
            continue;
        };
        let callee = match function.kind() {
            "attribute" => function.child_by_field_name("attribute"),
            "identifier" => Some(function),
            _ => None,
        };
        let is_wsgi_app = callee
            .map(|n| python::node_text(source, n) == "WSGIApplication")
            .unwrap_or(false);
        if !is_wsgi_app {
            continue;
        }

        let Some(arguments) = right.child_by_field_name("arguments") else {
            continue;
        };
        let mut arg_cursor = arguments.walk();
        let Some(table) = arguments
            .named_children(&mut arg_cursor)
            .find(|a| a.kind() == "list")
        else {
            continue;
        };

        let mut entry_cursor = table.walk();
        for entry in table.named_children(&mut entry_cursor) {
            if entry.kind() != "tuple" {
                continue;
            }
            let mut tuple_cursor = entry.walk();
            let parts: Vec<Node> = entry.named_children(&mut tuple_cursor).collect();
            if parts.len() < 2 {
                continue;
            }
            let Some(url) = python::string_literal(source, parts[0]) else {
                continue;
            };
            if parts[1].kind() == "identifier" {
                let class_name = python::node_text(source, parts[1]).to_string();
                routes.entry(class_name).or_insert(url);
            }
        }
    }
    routes
}
