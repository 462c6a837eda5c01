//! Report formatting for the listing subcommands

use clap::ValueEnum;
use eyre::{Result, WrapErr};
use owo_colors::OwoColorize;
use snipcov_core::Analysis;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Coverage filter for `list-source-files`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestedFilter {
    /// Every snippet in the file has at least one test
    All,
    /// At least one snippet in the file has a test
    Some,
    /// No snippet in the file has a test
    None,
}

/// What `list-region-tags` should include
#[derive(Debug, Clone, Copy)]
pub struct RegionTagOptions {
    pub detected: bool,
    pub undetected: bool,
    pub test_counts: bool,
    pub filenames: bool,
}

/// Write lines to a file, or to stdout when no path is given
pub fn write_output(lines: &[String], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut content = lines.join("\n");
            content.push('\n');
            std::fs::write(path, content)
                .wrap_err_with(|| format!("Failed to write output to {}", path.display()))?;
        }
        None => {
            for line in lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub fn format_region_tags(analysis: &Analysis, opts: &RegionTagOptions) -> Vec<String> {
    // Neither flag means both sections
    let (detected, undetected) = if !opts.detected && !opts.undetected {
        (true, true)
    } else {
        (opts.detected, opts.undetected)
    };

    let mut lines = Vec::new();

    if detected {
        lines.push(format!(
            "{} region tags detected by the snippet parser:",
            analysis.source_tags.len().green().bold()
        ));
        for tag in &analysis.source_tags {
            let mut line = format!("  {tag}");
            if opts.test_counts {
                line.push_str(&format!(" ({} test(s))", tests_for_tag(analysis, tag)));
            }
            if opts.filenames {
                let files = files_for_tag(analysis, tag);
                line.push_str(&format!(" [{}]", files.join(", ")));
            }
            lines.push(line);
        }
    }

    if undetected {
        let missed: Vec<&String> = analysis
            .detected_tags
            .iter()
            .filter(|tag| !analysis.source_tags.contains(tag))
            .collect();
        lines.push(format!(
            "{} region tags not detected by the snippet parser:",
            missed.len().yellow().bold()
        ));
        for tag in missed {
            lines.push(format!("  {tag}"));
        }
    }

    if !analysis.ignored_tags.is_empty() {
        lines.push(format!(
            "{} ignored region tags:",
            analysis.ignored_tags.len().dimmed()
        ));
        for tag in &analysis.ignored_tags {
            lines.push(format!("  {tag}"));
        }
    }

    lines
}

pub fn format_source_files(analysis: &Analysis, filter: Option<TestedFilter>) -> Vec<String> {
    // Distinct files, first-appearance order
    let mut files: Vec<&PathBuf> = Vec::new();
    for record in &analysis.snippets {
        if !files.contains(&&record.source_path) {
            files.push(&record.source_path);
        }
    }

    files
        .into_iter()
        .filter(|file| {
            let records = analysis
                .snippets
                .iter()
                .filter(|r| &&r.source_path == file);
            match filter {
                Some(TestedFilter::All) => records.clone().all(|r| !r.test_methods.is_empty()),
                Some(TestedFilter::Some) => records.clone().any(|r| !r.test_methods.is_empty()),
                Some(TestedFilter::None) => records.clone().all(|r| r.test_methods.is_empty()),
                None => true,
            }
        })
        .map(|file| file.display().to_string())
        .collect()
}

fn tests_for_tag(analysis: &Analysis, tag: &str) -> usize {
    analysis
        .snippets
        .iter()
        .filter(|r| r.region_tags.iter().any(|t| t == tag))
        .map(|r| r.test_methods.len())
        .sum()
}

fn files_for_tag(analysis: &Analysis, tag: &str) -> Vec<String> {
    let files: BTreeSet<String> = analysis
        .snippets
        .iter()
        .filter(|r| r.region_tags.iter().any(|t| t == tag))
        .map(|r| r.source_path.display().to_string())
        .collect();
    files.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipcov_core::{ArtifactRecord, TestLocation};
    use std::path::PathBuf;

    fn record(path: &str, tags: &[&str], tests: usize) -> ArtifactRecord {
        ArtifactRecord {
            source_path: PathBuf::from(path),
            start_line: 1,
            end_line: 2,
            region_tags: tags.iter().map(|t| t.to_string()).collect(),
            test_methods: (0..tests)
                .map(|i| TestLocation(PathBuf::from("a_test.py"), format!("test_{i}")))
                .collect(),
            extra: serde_json::Map::new(),
        }
    }

    fn analysis() -> Analysis {
        Analysis {
            detected_tags: vec!["covered".into(), "missed".into()],
            source_tags: vec!["covered".into()],
            ignored_tags: Vec::new(),
            snippets: vec![
                record("a.py", &["covered"], 2),
                record("b.py", &["other"], 0),
            ],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_region_tags_default_shows_both_sections() {
        let lines = format_region_tags(
            &analysis(),
            &RegionTagOptions {
                detected: false,
                undetected: false,
                test_counts: false,
                filenames: false,
            },
        );
        let joined = lines.join("\n");
        assert!(joined.contains("detected by the snippet parser"));
        assert!(joined.contains("not detected by the snippet parser"));
        assert!(joined.contains("  covered"));
        assert!(joined.contains("  missed"));
    }

    #[test]
    fn test_region_tags_test_counts_and_filenames() {
        let lines = format_region_tags(
            &analysis(),
            &RegionTagOptions {
                detected: true,
                undetected: false,
                test_counts: true,
                filenames: true,
            },
        );
        assert!(lines.iter().any(|l| l.contains("covered (2 test(s)) [a.py]")));
    }

    #[test]
    fn test_source_files_filters() {
        let analysis = analysis();
        assert_eq!(
            format_source_files(&analysis, None),
            vec!["a.py".to_string(), "b.py".to_string()]
        );
        assert_eq!(
            format_source_files(&analysis, Some(TestedFilter::All)),
            vec!["a.py".to_string()]
        );
        assert_eq!(
            format_source_files(&analysis, Some(TestedFilter::None)),
            vec!["b.py".to_string()]
        );
    }
}
