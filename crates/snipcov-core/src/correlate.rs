//! Correlation between snippet functions and test keys
//!
//! Joins each snippet's derived keys against the test-key map, enforcing the
//! mapping-consistency invariant (all locations under one key must come from
//! a single test file) and the path-containment filter (a test only counts
//! for snippets rooted in the same directory tree).

use crate::snippet::SnippetFunction;
use crate::testkeys::TestKeyMap;
use eyre::{Result, bail};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Populate each snippet's `test_methods` from the resolved key map
///
/// A snippet with zero resolved keys is left untouched; that is not an
/// error. A key whose recorded locations span more than one distinct test
/// file signals a collision between unrelated snippets and aborts the run.
pub fn store_tests_on_snippets(
    snippets: &mut [SnippetFunction],
    map: &TestKeyMap,
) -> Result<()> {
    for snippet in snippets.iter_mut() {
        let source_root = snippet
            .source_path
            .parent()
            .map(absolute)
            .unwrap_or_default();

        for key in snippet.test_keys() {
            let Some(entries) = map.get(&key) else {
                continue;
            };
            if entries.is_empty() {
                continue;
            }

            let test_paths: BTreeSet<&PathBuf> = entries.iter().map(|loc| &loc.0).collect();
            if test_paths.len() != 1 {
                bail!(
                    "invalid test-key map: key {key} matches tests in {} distinct files; \
                     locations within a map entry must share one test source file",
                    test_paths.len()
                );
            }

            let test_path = entries[0].0.as_path();
            if absolute(test_path).starts_with(&source_root) {
                snippet.test_methods.extend(entries.iter().cloned());
            }
        }
    }
    Ok(())
}

/// Collapse snippets sharing an identical (sorted) region-tag set
///
/// The first-encountered snippet wins.
pub fn dedupe_snippets(snippets: Vec<SnippetFunction>) -> Vec<SnippetFunction> {
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut deduped = Vec::new();
    for snippet in snippets {
        if seen.insert(snippet.tag_identity()) {
            deduped.push(snippet);
        }
    }
    deduped
}

/// Lexical absolute form of a path (the path need not exist)
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
