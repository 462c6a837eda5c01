//! Region-tag scanning over raw source text
//!
//! Region tags delimit documentation snippets with bracketed markers:
//!
//! ```python
//! # [START sample_route]
//! @app.route('/')
//! def hello():
//!     return 'Hello!'
//! # [END sample_route]
//! ```
//!
//! `[IGNORE tag]` marks a tag name as globally ignored, wherever the marker
//! appears. One tag name may open and close several times in a file; each
//! open/close pair is recorded as its own region, and regions may nest.

use std::collections::BTreeSet;

/// A single named span of source lines (1-indexed, inclusive on both ends)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTagRegion {
    /// The region tag name
    pub tag: String,
    /// Line carrying the `[START tag]` marker
    pub start_line: usize,
    /// Line carrying the `[END tag]` marker
    pub end_line: usize,
}

/// Result of scanning one file's text for region-tag markers
#[derive(Debug, Default)]
pub struct RegionScan {
    /// All closed regions, in close order
    pub regions: Vec<RegionTagRegion>,
    /// Tag names flagged with an `[IGNORE tag]` marker
    pub ignored: BTreeSet<String>,
    /// Non-fatal problems (unclosed regions, stray end markers)
    pub warnings: Vec<String>,
}

impl RegionScan {
    /// Tag names of all recorded regions, deduplicated
    pub fn tag_names(&self) -> BTreeSet<String> {
        self.regions.iter().map(|r| r.tag.clone()).collect()
    }
}

/// Scan source text for region-tag markers
pub fn scan(text: &str) -> RegionScan {
    let mut scan = RegionScan::default();
    // Stack of currently-open tags: (name, start line)
    let mut open: Vec<(String, usize)> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        for marker in markers_in_line(line) {
            match marker {
                Marker::Start(tag) => open.push((tag, line_num)),
                Marker::End(tag) => {
                    // Close the innermost matching open region
                    match open.iter().rposition(|(name, _)| *name == tag) {
                        Some(pos) => {
                            let (name, start_line) = open.remove(pos);
                            scan.regions.push(RegionTagRegion {
                                tag: name,
                                start_line,
                                end_line: line_num,
                            });
                        }
                        None => scan.warnings.push(format!(
                            "line {line_num}: [END {tag}] has no matching [START {tag}]"
                        )),
                    }
                }
                Marker::Ignore(tag) => {
                    scan.ignored.insert(tag);
                }
            }
        }
    }

    for (tag, start_line) in open {
        scan.warnings.push(format!(
            "[START {tag}] on line {start_line} is never closed; region dropped"
        ));
    }

    scan
}

enum Marker {
    Start(String),
    End(String),
    Ignore(String),
}

/// Parse every `[KEYWORD tag]` marker on a line
fn markers_in_line(line: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut rest = line;

    while let Some(open_idx) = rest.find('[') {
        rest = &rest[open_idx + 1..];
        let Some(close_idx) = rest.find(']') else {
            break;
        };
        let inner = &rest[..close_idx];
        rest = &rest[close_idx + 1..];

        let Some((keyword, tag)) = inner.split_once(' ') else {
            continue;
        };
        let tag = tag.trim();
        if tag.is_empty() || tag.contains(' ') {
            continue;
        }
        match keyword {
            "START" => markers.push(Marker::Start(tag.to_string())),
            "END" => markers.push(Marker::End(tag.to_string())),
            "IGNORE" => markers.push(Marker::Ignore(tag.to_string())),
            _ => {}
        }
    }

    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_region() {
        let scan = scan("# [START foo]\nx = 1\n# [END foo]\n");
        assert_eq!(
            scan.regions,
            vec![RegionTagRegion {
                tag: "foo".to_string(),
                start_line: 1,
                end_line: 3,
            }]
        );
        assert!(scan.warnings.is_empty());
        assert!(scan.ignored.is_empty());
    }

    #[test]
    fn test_nested_regions() {
        let text = "\
# [START root_tag]
def root():
    pass
# [START nested_tag]
def nested():
    pass
# [END nested_tag]
# [END root_tag]
";
        let scan = scan(text);
        assert_eq!(scan.regions.len(), 2);
        // Inner region closes first
        assert_eq!(scan.regions[0].tag, "nested_tag");
        assert_eq!((scan.regions[0].start_line, scan.regions[0].end_line), (4, 7));
        assert_eq!(scan.regions[1].tag, "root_tag");
        assert_eq!((scan.regions[1].start_line, scan.regions[1].end_line), (1, 8));
    }

    #[test]
    fn test_reopened_tag_records_disjoint_regions() {
        let text = "\
# [START root_tag]
def first():
    pass
# [END root_tag]

# [START root_tag]
def second():
    pass
# [END root_tag]
";
        let scan = scan(text);
        assert_eq!(scan.regions.len(), 2);
        assert_eq!((scan.regions[0].start_line, scan.regions[0].end_line), (1, 4));
        assert_eq!((scan.regions[1].start_line, scan.regions[1].end_line), (6, 9));
        assert!(scan.warnings.is_empty());
    }

    #[test]
    fn test_same_tag_open_twice_is_not_an_error() {
        let text = "\
# [START tag]
# [START tag]
x = 1
# [END tag]
# [END tag]
";
        let scan = scan(text);
        assert_eq!(scan.regions.len(), 2);
        assert!(scan.warnings.is_empty());
        // Innermost open closes first
        assert_eq!((scan.regions[0].start_line, scan.regions[0].end_line), (2, 4));
        assert_eq!((scan.regions[1].start_line, scan.regions[1].end_line), (1, 5));
    }

    #[test]
    fn test_unclosed_region_dropped_with_warning() {
        let scan = scan("# [START foo]\nx = 1\n");
        assert!(scan.regions.is_empty());
        assert_eq!(scan.warnings.len(), 1);
        assert!(scan.warnings[0].contains("never closed"));
    }

    #[test]
    fn test_stray_end_marker_warns() {
        let scan = scan("# [END foo]\n");
        assert!(scan.regions.is_empty());
        assert_eq!(scan.warnings.len(), 1);
        assert!(scan.warnings[0].contains("no matching"));
    }

    #[test]
    fn test_ignore_marker() {
        let scan = scan("# [IGNORE app]\n# [START app]\nx = 1\n# [END app]\n");
        assert!(scan.ignored.contains("app"));
        // The region is still recorded; consumers subtract ignored tags
        assert_eq!(scan.regions.len(), 1);
    }

    #[test]
    fn test_non_marker_brackets_ignored() {
        let scan = scan("x = arr[0]\n# [TODO maybe]\n# [not a marker at all]\n");
        assert!(scan.regions.is_empty());
        assert!(scan.warnings.is_empty());
    }
}
