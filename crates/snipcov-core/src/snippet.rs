//! Snippet data model
//!
//! A snippet function is a top-level Python function (or class method)
//! associated with one or more region tags. Its parser classification
//! determines the shape of the test keys used to correlate it with tests.

use crate::regions::RegionTagRegion;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Function names that are never treated as snippets
pub const IGNORED_FUNCTION_NAMES: &[&str] = &["run_command", "parse_command_line_args", "main"];

/// HTTP methods Flask serves for a route that declares none
pub const FLASK_DEFAULT_METHODS: &[&str] = &["get", "head", "options"];

/// Receiver names recognized as HTTP test clients in test bodies
pub const HTTP_CLIENT_NAMES: &[&str] = &["client", "test_client", "app"];

/// Method names recognized as HTTP verbs
pub const HTTP_METHOD_NAMES: &[&str] =
    &["get", "post", "put", "patch", "delete", "head", "options"];

/// How a snippet function is invoked
///
/// Downstream logic matches exhaustively on this; each variant carries only
/// the fields its key derivation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "parser", rename_all = "snake_case")]
pub enum ParserKind {
    /// Called as `receiver.method(...)` from a test. For module-level
    /// functions the "class" is the source file stem; for class methods it
    /// is the class name.
    DirectInvocation {
        class_name: String,
        method_name: String,
    },
    /// Registered as a handler method in a webapp2-style routing table; the
    /// HTTP method is the handler method's own name.
    Webapp2Router { url: String, http_method: String },
    /// Registered via a Flask-style route decorator.
    FlaskRouter {
        url: String,
        http_methods: Vec<String>,
    },
}

/// A `(test file, test method)` pair, serialized as a 2-element array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLocation(pub PathBuf, pub String);

/// The join key between a snippet and the tests that call it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestKey {
    /// `receiver.attribute` - direct method invocation
    Direct { receiver: String, attribute: String },
    /// `client.verb("/url")` - HTTP-routed invocation
    Http { verb: String, url: String },
}

impl std::fmt::Display for TestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestKey::Direct {
                receiver,
                attribute,
            } => write!(f, "({receiver}, {attribute})"),
            TestKey::Http { verb, url } => write!(f, "({verb}, {url})"),
        }
    }
}

/// A parsed snippet function with its classification, tags, and tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetFunction {
    /// Function or method name
    pub name: String,
    /// File the function was parsed from
    pub source_path: PathBuf,
    /// First line of the definition (decorators included), 1-indexed
    pub start_line: usize,
    /// Last line of the definition, 1-indexed
    pub end_line: usize,
    #[serde(flatten)]
    pub parser: ParserKind,
    /// Region tags whose regions intersect this function, deduplicated
    #[serde(default)]
    pub region_tags: Vec<String>,
    /// Tests found to exercise this snippet, in discovery order
    #[serde(default)]
    pub test_methods: Vec<TestLocation>,
}

impl SnippetFunction {
    /// The lookup keys this snippet can be matched under
    pub fn test_keys(&self) -> Vec<TestKey> {
        match &self.parser {
            ParserKind::DirectInvocation {
                class_name,
                method_name,
            } => vec![TestKey::Direct {
                receiver: class_name.clone(),
                attribute: method_name.clone(),
            }],
            ParserKind::Webapp2Router { url, http_method } => vec![TestKey::Http {
                verb: http_method.clone(),
                url: url.clone(),
            }],
            ParserKind::FlaskRouter { url, http_methods } => http_methods
                .iter()
                .map(|m| TestKey::Http {
                    verb: m.clone(),
                    url: url.clone(),
                })
                .collect(),
        }
    }

    /// Identity used for snippet deduplication: the sorted region-tag set
    pub fn tag_identity(&self) -> Vec<String> {
        let mut tags = self.region_tags.clone();
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Attach every region tag whose span intersects a snippet's line range
///
/// Tags are appended in region order and deduplicated per snippet. Snippets
/// touching zero regions are left as-is; downstream consumers filter them.
pub fn add_region_tags_to_snippets(
    snippets: &mut [SnippetFunction],
    regions: &[RegionTagRegion],
) {
    for snippet in snippets {
        for region in regions {
            let intersects =
                region.start_line <= snippet.end_line && snippet.start_line <= region.end_line;
            if intersects && !snippet.region_tags.contains(&region.tag) {
                snippet.region_tags.push(region.tag.clone());
            }
        }
    }
}
