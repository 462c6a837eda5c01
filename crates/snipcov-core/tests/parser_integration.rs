//! Fixture-driven tests over the full extract-and-correlate pipeline

use snipcov_core::snippet::ParserKind;
use snipcov_core::{SnippetFunction, extract_directory};
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/parser")).to_path_buf()
}

fn extract(subdir: &str) -> Vec<SnippetFunction> {
    extract_directory(&fixtures_dir().join(subdir))
        .unwrap()
        .snippets
}

#[test]
fn test_direct_invocation_parser() {
    let snippets = extract("http");
    let direct: Vec<&SnippetFunction> = snippets
        .iter()
        .filter(|s| matches!(s.parser, ParserKind::DirectInvocation { .. }))
        .collect();

    assert_eq!(direct.len(), 3);
    assert_eq!(direct[0].name, "hello_get");
    assert!(
        direct[0]
            .region_tags
            .contains(&"functions_helloworld_get".to_string())
    );

    // main() is in the fixed ignore-list
    assert!(snippets.iter().all(|s| s.name != "main"));
}

#[test]
fn test_direct_invocation_correlation() {
    let snippets = extract("http");

    let hello_get = snippets.iter().find(|s| s.name == "hello_get").unwrap();
    assert_eq!(hello_get.test_methods.len(), 1);
    assert_eq!(hello_get.test_methods[0].1, "test_hello_get");

    let hello_content = snippets.iter().find(|s| s.name == "hello_content").unwrap();
    assert_eq!(hello_content.test_methods.len(), 1);
    assert_eq!(hello_content.test_methods[0].1, "test_hello_content");

    // No test calls hello_background; empty coverage is not an error
    let background = snippets.iter().find(|s| s.name == "hello_background").unwrap();
    assert!(background.test_methods.is_empty());
}

#[test]
fn test_webapp2_parser() {
    let snippets = extract("webapp2");
    let routed: Vec<&SnippetFunction> = snippets
        .iter()
        .filter(|s| matches!(s.parser, ParserKind::Webapp2Router { .. }))
        .collect();

    assert_eq!(routed.len(), 2);

    let sign = routed.last().unwrap();
    assert_eq!(
        sign.parser,
        ParserKind::Webapp2Router {
            url: "/sign".to_string(),
            http_method: "post".to_string(),
        }
    );
    assert_eq!(sign.region_tags, vec!["sign_handler"]);
    assert_eq!(sign.test_methods.len(), 1);
    assert_eq!(sign.test_methods[0].1, "test_sign");
}

#[test]
fn test_flask_router_parser() {
    let snippets = extract("flask");
    let routed: Vec<&SnippetFunction> = snippets
        .iter()
        .filter(|s| matches!(s.parser, ParserKind::FlaskRouter { .. }))
        .collect();

    assert_eq!(routed.len(), 1);
    let hello = routed[0];

    // Flask has a default HTTP method set for routes that don't declare any
    assert_eq!(
        hello.parser,
        ParserKind::FlaskRouter {
            url: "/".to_string(),
            http_methods: vec!["get".to_string(), "head".to_string(), "options".to_string()],
        }
    );
    assert_eq!(hello.region_tags, vec!["sample_route"]);
    assert_eq!(hello.test_methods.len(), 1);
    assert_eq!(hello.test_methods[0].1, "test_index");
}

#[test]
fn test_ignored_method_names() {
    let snippets = extract("edge_cases");
    assert_eq!(snippets.len(), 1);
    assert_eq!(snippets[0].name, "not_main");
    assert_eq!(snippets[0].region_tags, vec!["not_main"]);
}

#[test]
fn test_region_tags_nested() {
    let snippets = extract("nested_tags");
    assert_eq!(snippets.len(), 2);

    let nested = &snippets[0];
    assert_eq!(nested.name, "nested_method");
    let mut tags = nested.region_tags.clone();
    tags.sort();
    assert_eq!(tags, vec!["nested_tag", "root_tag"]);

    assert_eq!(snippets[1].name, "root_method");
    assert_eq!(snippets[1].region_tags, vec!["root_tag"]);
}

#[test]
fn test_multi_block_region_tags() {
    // Two disjoint blocks share the tag name; the second function carries an
    // identical tag set and collapses into the first
    let snippets = extract("nested_tags");

    let root = snippets.iter().find(|s| s.name == "root_method").unwrap();
    assert_eq!(root.region_tags, vec!["root_tag"]);
    assert!(snippets.iter().all(|s| s.name != "another_root_method"));
}

#[test]
fn test_cross_directory_key_collision_is_fatal() {
    // webapp2_test.py and flask_test.py both derive the key (get, "/");
    // resolving them into one map is the mapping-consistency error
    let err = extract_directory(&fixtures_dir()).unwrap_err();
    assert!(err.to_string().contains("invalid test-key map"));
}
