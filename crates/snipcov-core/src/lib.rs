//! snipcov-core - Core library for snippet test-coverage correlation
//!
//! This crate provides the building blocks for:
//! - Scanning source text for region-tag markers delimiting documentation
//!   snippets ([`regions`])
//! - Extracting snippet functions from Python sources and classifying how
//!   each is invoked ([`extractor`])
//! - Deriving test keys from test-file syntax trees ([`testkeys`])
//! - Correlating snippets with the tests that exercise them ([`correlate`])
//! - Analyzing a prior extraction artifact against a root directory
//!   ([`analyze`])
//!
//! # Features
//!
//! - `walk` - Enable [`pipeline`] for gitignore-aware directory extraction
//!   (brings in `ignore`)
//! - `parallel` - Enable parallel per-file extraction (brings in `rayon`)
//!
//! # Region tags
//!
//! Documentation snippets are delimited with bracketed markers in comments:
//!
//! ```python
//! # [START functions_helloworld_get]
//! def hello_get(request):
//!     return 'Hello World!'
//! # [END functions_helloworld_get]
//! ```
//!
//! # Correlating snippets with tests
//!
//! ```
//! use snipcov_core::{extractor, regions, snippet, testkeys, correlate};
//! use std::path::Path;
//!
//! let source = "\
//! # [START sample_tag]
//! def hello_get(request):
//!     return 'Hello World!'
//! # [END sample_tag]
//! ";
//! let mut snippets = extractor::extract_snippets(Path::new("http_main.py"), source);
//! let scan = regions::scan(source);
//! snippet::add_region_tags_to_snippets(&mut snippets, &scan.regions);
//!
//! let test_source = "\
//! def test_hello():
//!     r = http_main.hello_get(None)
//! ";
//! let mut map = testkeys::TestKeyMap::new();
//! for (key, location) in
//!     testkeys::keys_from_source(Path::new("http_test.py"), test_source).unwrap()
//! {
//!     map.append(key, location);
//! }
//!
//! correlate::store_tests_on_snippets(&mut snippets, &map).unwrap();
//! assert_eq!(snippets[0].test_methods.len(), 1);
//! ```

pub mod analyze;
pub mod correlate;
pub mod extractor;
#[cfg(feature = "walk")]
pub mod pipeline;
mod python;
pub mod regions;
pub mod snippet;
pub mod testkeys;
pub mod yaml;

pub use analyze::{Analysis, ArtifactRecord, analyze_artifact, analyze_records};
pub use correlate::{dedupe_snippets, store_tests_on_snippets};
pub use extractor::extract_snippets;
#[cfg(feature = "walk")]
pub use pipeline::{ExtractOutput, extract_directory, find_python_files};
pub use regions::{RegionScan, RegionTagRegion, scan};
pub use snippet::{
    FLASK_DEFAULT_METHODS, HTTP_CLIENT_NAMES, HTTP_METHOD_NAMES, IGNORED_FUNCTION_NAMES,
    ParserKind, SnippetFunction, TestKey, TestLocation, add_region_tags_to_snippets,
};
pub use testkeys::{ResolveResult, TestKeyMap, keys_from_source, resolve_test_files};
pub use yaml::{METADATA_FILENAME, TagMeta, TagMetadata};
