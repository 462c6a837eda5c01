//! Test-key resolution over test-file syntax trees
//!
//! Each test method's body is walked recursively to derive "test keys":
//! either a direct `receiver.attribute` access (the test calls the snippet
//! function itself) or an HTTP test-client call like `client.post('/sign')`.
//! Keys map to the tests that produced them, in discovery order.

use crate::python;
use crate::snippet::{HTTP_CLIENT_NAMES, HTTP_METHOD_NAMES, TestKey, TestLocation};
use arborium::tree_sitter::Node;
use eyre::{Result, bail};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Prefix identifying test methods
const TEST_NAME_PREFIX: &str = "test_";

/// Ordered mapping from test keys to the tests that produced them
#[derive(Debug, Default)]
pub struct TestKeyMap {
    entries: BTreeMap<TestKey, Vec<TestLocation>>,
}

impl TestKeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a test location under a key (entries are never overwritten)
    pub fn append(&mut self, key: TestKey, location: TestLocation) {
        self.entries.entry(key).or_default().push(location);
    }

    /// Locations recorded under a key, in append order
    pub fn get(&self, key: &TestKey) -> Option<&[TestLocation]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &TestKey> {
        self.entries.keys()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of resolving a set of test files
#[derive(Debug, Default)]
pub struct ResolveResult {
    pub map: TestKeyMap,
    /// Non-fatal problems (unreadable files)
    pub warnings: Vec<String>,
}

/// Build the test-key map for a set of test files
///
/// Per-file resolution is independent and may run in parallel; the map is
/// merged in input-path order, so appended locations keep a deterministic
/// order. An unreadable file contributes zero keys and a warning. A file
/// containing two test methods of the same name fails the whole run.
pub fn resolve_test_files(paths: &[PathBuf]) -> Result<ResolveResult> {
    #[cfg(feature = "parallel")]
    let outcomes: Vec<Result<FileOutcome>> = {
        use rayon::prelude::*;
        paths.par_iter().map(|p| resolve_one(p)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Result<FileOutcome>> = paths.iter().map(|p| resolve_one(p)).collect();

    let mut result = ResolveResult::default();
    for outcome in outcomes {
        let outcome = outcome?;
        result.warnings.extend(outcome.warnings);
        for (key, location) in outcome.keys {
            result.map.append(key, location);
        }
    }
    Ok(result)
}

#[derive(Debug, Default)]
struct FileOutcome {
    keys: Vec<(TestKey, TestLocation)>,
    warnings: Vec<String>,
}

fn resolve_one(path: &Path) -> Result<FileOutcome> {
    let mut outcome = FileOutcome::default();
    match std::fs::read_to_string(path) {
        Ok(source) => {
            outcome.keys = keys_from_source(path, &source)?;
        }
        Err(err) => {
            outcome
                .warnings
                .push(format!("could not read file: {}: {err}", path.display()));
        }
    }
    Ok(outcome)
}

/// Derive all `(key, location)` pairs from one test file's source
///
/// Class-wrapped test methods are flattened to top level. Duplicate test
/// method names within one file are a fatal error.
pub fn keys_from_source(path: &Path, source: &str) -> Result<Vec<(TestKey, TestLocation)>> {
    let Some(tree) = python::parse(source) else {
        return Ok(Vec::new());
    };
    let root = tree.root_node();

    let methods = test_methods(source, root);

    let mut seen = HashSet::new();
    for (name, _) in &methods {
        if !seen.insert(name.clone()) {
            bail!("Test name {name} in file {} must be unique", path.display());
        }
    }

    let mut keys = Vec::new();
    for (name, body) in methods {
        let location = TestLocation(path.to_path_buf(), name);
        let mut cursor = body.walk();
        for statement in body.named_children(&mut cursor) {
            for key in keys_in_node(source, statement) {
                keys.push((key, location.clone()));
            }
        }
    }
    Ok(keys)
}

/// Top-level test functions plus class-wrapped test methods, flattened
fn test_methods<'t>(source: &str, root: Node<'t>) -> Vec<(String, Node<'t>)> {
    let mut methods = Vec::new();

    let mut push_if_test = |definition: Node<'t>| {
        let Some(name) = definition
            .child_by_field_name("name")
            .map(|n| python::node_text(source, n).to_string())
        else {
            return;
        };
        if !name.starts_with(TEST_NAME_PREFIX) {
            return;
        }
        if let Some(body) = definition.child_by_field_name("body") {
            methods.push((name, body));
        }
    };

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        let node = match child.kind() {
            "decorated_definition" => match child.child_by_field_name("definition") {
                Some(def) => def,
                None => continue,
            },
            _ => child,
        };
        match node.kind() {
            "function_definition" => push_if_test(node),
            "class_definition" => {
                let Some(body) = node.child_by_field_name("body") else {
                    continue;
                };
                let mut body_cursor = body.walk();
                for member in body.children(&mut body_cursor) {
                    let def = match member.kind() {
                        "function_definition" => member,
                        "decorated_definition" => match member.child_by_field_name("definition") {
                            Some(d) if d.kind() == "function_definition" => d,
                            _ => continue,
                        },
                        _ => continue,
                    };
                    push_if_test(def);
                }
            }
            _ => {}
        }
    }

    methods
}

/// Recursively find test keys within an expression or statement
///
/// First match wins at each recursion level; unmatched branches recurse into
/// their nested value/callee, both sides of an asserted comparison, and the
/// bodies of `with`/`for` blocks.
fn keys_in_node(source: &str, node: Node) -> Vec<TestKey> {
    match node.kind() {
        "attribute" => {
            let Some(object) = node.child_by_field_name("object") else {
                return Vec::new();
            };
            if object.kind() == "identifier" {
                let Some(attribute) = node.child_by_field_name("attribute") else {
                    return Vec::new();
                };
                return vec![TestKey::Direct {
                    receiver: python::node_text(source, object).to_string(),
                    attribute: python::node_text(source, attribute).to_string(),
                }];
            }
            keys_in_node(source, object)
        }
        "call" => {
            if let Some(key) = http_client_call(source, node) {
                return vec![key];
            }
            match node.child_by_field_name("function") {
                Some(function) => keys_in_node(source, function),
                None => Vec::new(),
            }
        }
        "expression_statement" | "parenthesized_expression" | "await" | "return_statement" => {
            match python::first_named_child(node) {
                Some(inner) => keys_in_node(source, inner),
                None => Vec::new(),
            }
        }
        "assignment" => match node.child_by_field_name("right") {
            Some(right) => keys_in_node(source, right),
            None => Vec::new(),
        },
        "assert_statement" | "comparison_operator" => {
            let mut keys = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                keys.extend(keys_in_node(source, child));
            }
            keys
        }
        "with_statement" | "for_statement" => {
            let Some(body) = node.child_by_field_name("body") else {
                return Vec::new();
            };
            // Collect matches from every statement in the block; duplicates
            // are permitted and kept in order.
            let mut keys = Vec::new();
            let mut cursor = body.walk();
            for statement in body.named_children(&mut cursor) {
                keys.extend(keys_in_node(source, statement));
            }
            keys
        }
        _ => Vec::new(),
    }
}

/// Match `receiver.verb("/url", ...)` where the receiver is a known HTTP
/// test client and the first argument is a string literal
fn http_client_call(source: &str, call: Node) -> Option<TestKey> {
    let function = call.child_by_field_name("function")?;
    if function.kind() != "attribute" {
        return None;
    }
    let object = function.child_by_field_name("object")?;
    if object.kind() != "identifier" {
        return None;
    }
    let receiver = python::node_text(source, object);
    if !HTTP_CLIENT_NAMES.contains(&receiver) {
        return None;
    }
    let verb = python::node_text(source, function.child_by_field_name("attribute")?);
    if !HTTP_METHOD_NAMES.contains(&verb) {
        return None;
    }
    let arguments = call.child_by_field_name("arguments")?;
    let first_arg = python::first_named_child(arguments)?;
    let url = python::string_literal(source, first_arg)?;
    Some(TestKey::Http {
        verb: verb.to_string(),
        url,
    })
}
