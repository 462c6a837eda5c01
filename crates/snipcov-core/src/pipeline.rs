//! Directory-level extraction pipeline
//!
//! Walks a root directory for Python files, partitions test files from
//! snippet sources, extracts snippets and region tags per source file,
//! resolves test keys per test file, and correlates the two. The result is
//! the artifact consumed by [`analyze`](crate::analyze).

use crate::correlate::{dedupe_snippets, store_tests_on_snippets};
use crate::snippet::{SnippetFunction, add_region_tags_to_snippets};
use crate::testkeys::resolve_test_files;
use crate::{extractor, regions};
use eyre::Result;
use std::path::{Path, PathBuf};

/// Python files under a root, test files separated from snippet sources
#[derive(Debug, Default)]
pub struct PythonFiles {
    pub sources: Vec<PathBuf>,
    pub tests: Vec<PathBuf>,
}

/// Whether a path follows the test-file naming conventions
pub fn is_test_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with("test_") && name.ends_with(".py") || name.ends_with("_test.py")
}

/// Find all Python files under a root, gitignore-aware, in sorted order
pub fn find_python_files(root: &Path) -> PythonFiles {
    use ignore::WalkBuilder;

    let mut files = PythonFiles::default();
    let walker = WalkBuilder::new(root)
        .follow_links(true)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            continue;
        }
        if is_test_file(path) {
            files.tests.push(path.to_path_buf());
        } else {
            files.sources.push(path.to_path_buf());
        }
    }

    // Walk order is not guaranteed; sort for deterministic output
    files.sources.sort();
    files.tests.sort();
    files
}

/// Result of extracting a directory tree
#[derive(Debug, Default)]
pub struct ExtractOutput {
    /// Snippet functions carrying at least one region tag, duplicate tag
    /// sets collapsed, tests correlated
    pub snippets: Vec<SnippetFunction>,
    /// Non-fatal problems (unreadable files, unclosed regions)
    pub warnings: Vec<String>,
}

/// Extract and correlate every snippet under a root directory
///
/// Per-file extraction runs in parallel; results are merged in sorted file
/// order, so list ordering is deterministic. Functions touching no region
/// are dropped, and snippets with an identical sorted tag set collapse to
/// the first occurrence. Fatal errors (duplicate test names, test-key
/// collisions) abort the run.
pub fn extract_directory(root: &Path) -> Result<ExtractOutput> {
    let files = find_python_files(root);

    #[cfg(feature = "parallel")]
    let per_file: Vec<FileExtraction> = {
        use rayon::prelude::*;
        files.sources.par_iter().map(|p| extract_one(p)).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let per_file: Vec<FileExtraction> = files.sources.iter().map(|p| extract_one(p)).collect();

    let mut output = ExtractOutput::default();
    for extraction in per_file {
        output.warnings.extend(extraction.warnings);
        output.snippets.extend(extraction.snippets);
    }

    let resolved = resolve_test_files(&files.tests)?;
    output.warnings.extend(resolved.warnings);

    store_tests_on_snippets(&mut output.snippets, &resolved.map)?;

    output.snippets.retain(|s| !s.region_tags.is_empty());
    output.snippets = dedupe_snippets(std::mem::take(&mut output.snippets));
    Ok(output)
}

#[derive(Debug, Default)]
struct FileExtraction {
    snippets: Vec<SnippetFunction>,
    warnings: Vec<String>,
}

fn extract_one(path: &Path) -> FileExtraction {
    let mut extraction = FileExtraction::default();
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            extraction
                .warnings
                .push(format!("could not read file: {}: {err}", path.display()));
            return extraction;
        }
    };

    let scan = regions::scan(&source);
    for warning in &scan.warnings {
        extraction.warnings.push(format!("{}: {warning}", path.display()));
    }

    extraction.snippets = extractor::extract_snippets(path, &source);
    add_region_tags_to_snippets(&mut extraction.snippets, &scan.regions);
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file(Path::new("proj/test_main.py")));
        assert!(is_test_file(Path::new("proj/main_test.py")));
        assert!(!is_test_file(Path::new("proj/main.py")));
        assert!(!is_test_file(Path::new("proj/test_main.pyc")));
    }

    #[test]
    fn test_extract_directory_correlates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("http_main.py"),
            "\
# [START functions_helloworld_get]
def hello_get(request):
    return 'Hello World!'
# [END functions_helloworld_get]
",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("http_test.py"),
            "\
import http_main

def test_hello():
    r = http_main.hello_get(None)
    assert r == 'Hello World!'
",
        )
        .unwrap();

        let output = extract_directory(dir.path()).unwrap();
        assert_eq!(output.snippets.len(), 1);
        let snippet = &output.snippets[0];
        assert_eq!(snippet.name, "hello_get");
        assert_eq!(snippet.region_tags, vec!["functions_helloworld_get"]);
        assert_eq!(snippet.test_methods.len(), 1);
        assert_eq!(snippet.test_methods[0].1, "test_hello");
    }

    #[test]
    fn test_extract_drops_untagged_and_collapses_duplicate_tag_sets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("dup_main.py"),
            "\
# [START shared_tag]
def first():
    pass


def second():
    pass
# [END shared_tag]


def untagged():
    pass
",
        )
        .unwrap();

        let output = extract_directory(dir.path()).unwrap();
        assert_eq!(output.snippets.len(), 1);
        assert_eq!(output.snippets[0].name, "first");
        assert_eq!(output.snippets[0].region_tags, vec!["shared_tag"]);
    }

    #[test]
    fn test_unreadable_root_yields_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = extract_directory(&dir.path().join("missing")).unwrap();
        assert!(output.snippets.is_empty());
    }
}
