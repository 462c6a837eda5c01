//! Artifact-driven analysis
//!
//! Consumes a JSON artifact (a prior extraction run's snippet list), re-scans
//! each referenced source file for region tags, attaches intersecting tags,
//! deduplicates snippets, and applies the manually-curated YAML metadata.
//! This is the entry point the report/CLI layer builds on.

use crate::regions;
use crate::snippet::TestLocation;
use crate::yaml::TagMetadata;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One record of the input artifact
///
/// Only `source_path`, `region_tags`, and `test_methods` are required by the
/// join; extra fields (name, parser classification, ...) are carried through
/// untouched for the report layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub source_path: PathBuf,
    #[serde(default)]
    pub start_line: usize,
    #[serde(default)]
    pub end_line: usize,
    #[serde(default)]
    pub region_tags: Vec<String>,
    #[serde(default)]
    pub test_methods: Vec<TestLocation>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ArtifactRecord {
    fn tag_identity(&self) -> Vec<String> {
        let mut tags = self.region_tags.clone();
        tags.sort();
        tags.dedup();
        tags
    }
}

/// Output of [`analyze_artifact`]
#[derive(Debug, Default)]
pub struct Analysis {
    /// Tags found by scanning source text, ignored tags subtracted
    pub detected_tags: Vec<String>,
    /// Tags attached to surviving snippets, ignored tags subtracted
    pub source_tags: Vec<String>,
    /// Marker-ignored plus YAML-ignored tags
    pub ignored_tags: Vec<String>,
    /// Surviving snippet records, enriched with tags and manual tests
    pub snippets: Vec<ArtifactRecord>,
    /// Non-fatal problems encountered along the way
    pub warnings: Vec<String>,
}

/// Analyze an artifact file against a root directory
///
/// Unparseable JSON is fatal before any correlation. Unreadable source
/// files contribute zero regions and a warning.
pub fn analyze_artifact(artifact: &Path, root: &Path) -> Result<Analysis> {
    let content = std::fs::read_to_string(artifact)
        .wrap_err_with(|| format!("Failed to read artifact {}", artifact.display()))?;
    let records: Vec<ArtifactRecord> = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse artifact {}", artifact.display()))?;

    analyze_records(records, root)
}

/// Analysis over already-parsed records (the artifact body)
pub fn analyze_records(mut records: Vec<ArtifactRecord>, root: &Path) -> Result<Analysis> {
    let mut analysis = Analysis::default();
    let mut detected: BTreeSet<String> = BTreeSet::new();
    let mut marker_ignored: BTreeSet<String> = BTreeSet::new();

    // Distinct source files, first-appearance order
    let mut source_files: Vec<PathBuf> = Vec::new();
    for record in &records {
        if !source_files.contains(&record.source_path) {
            source_files.push(record.source_path.clone());
        }
    }

    for file in &source_files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                analysis
                    .warnings
                    .push(format!("could not read file: {}: {err}", file.display()));
                continue;
            }
        };
        let scan = regions::scan(&text);
        for warning in &scan.warnings {
            analysis.warnings.push(format!("{}: {warning}", file.display()));
        }
        detected.extend(scan.tag_names());
        marker_ignored.extend(scan.ignored.iter().cloned());

        for record in records.iter_mut().filter(|r| &r.source_path == file) {
            for region in &scan.regions {
                let intersects =
                    region.start_line <= record.end_line && record.start_line <= region.end_line;
                if intersects && !record.region_tags.contains(&region.tag) {
                    record.region_tags.push(region.tag.clone());
                }
            }
        }
    }

    // Snippets need at least one region tag; identical tag sets collapse to
    // the first occurrence.
    records.retain(|r| !r.region_tags.is_empty());
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    records.retain(|r| seen.insert(r.tag_identity()));

    // Manually-curated metadata: hand-declared tests and ignored tags
    let metadata = TagMetadata::load(root)?;
    for record in &mut records {
        for tag in record.region_tags.clone() {
            if let Some(meta) = metadata.get(&tag) {
                record.test_methods.extend(meta.tests.iter().cloned());
            }
        }
    }
    let yaml_ignored = metadata.untested_tags();

    let mut source_tags: BTreeSet<String> = BTreeSet::new();
    for record in &records {
        source_tags.extend(record.region_tags.iter().cloned());
    }

    let is_ignored =
        |tag: &String| marker_ignored.contains(tag) || yaml_ignored.contains(tag);
    analysis.detected_tags = detected.iter().filter(|t| !is_ignored(t)).cloned().collect();
    analysis.source_tags = source_tags.iter().filter(|t| !is_ignored(t)).cloned().collect();
    analysis.ignored_tags = marker_ignored.union(&yaml_ignored).cloned().collect();
    analysis.snippets = records;
    Ok(analysis)
}
