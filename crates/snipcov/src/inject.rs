//! XUnit report rewriting
//!
//! Walks an XUnit XML document and stamps a `region_tags` attribute onto
//! every `<testcase>` whose (test file, test name) pair matches a correlated
//! snippet. Existing attributes, including a pre-existing `region_tags`,
//! are preserved; tag lists are unioned.

use eyre::{Result, WrapErr};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use snipcov_core::ArtifactRecord;
use std::collections::BTreeSet;

pub fn inject_region_tags(snippets: &[ArtifactRecord], xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());

    loop {
        match reader
            .read_event()
            .wrap_err("Failed to parse XUnit report")?
        {
            Event::Eof => break,
            Event::Start(elem) if elem.name().as_ref() == b"testcase" => {
                writer.write_event(Event::Start(rewrite_testcase(&elem, snippets)?))?;
            }
            Event::Empty(elem) if elem.name().as_ref() == b"testcase" => {
                writer.write_event(Event::Empty(rewrite_testcase(&elem, snippets)?))?;
            }
            event => writer.write_event(event)?,
        }
    }

    String::from_utf8(writer.into_inner()).wrap_err("Rewritten XUnit report is not valid UTF-8")
}

fn rewrite_testcase(
    elem: &BytesStart<'_>,
    snippets: &[ArtifactRecord],
) -> Result<BytesStart<'static>> {
    let mut attrs: Vec<(String, String)> = Vec::new();
    let mut classname = None;
    let mut test_name = None;
    let mut tags: BTreeSet<String> = BTreeSet::new();

    for attr in elem.attributes() {
        let attr = attr.wrap_err("Malformed testcase attribute")?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .wrap_err("Malformed testcase attribute value")?
            .into_owned();
        match key.as_str() {
            "classname" => classname = Some(value.clone()),
            "name" => test_name = Some(value.clone()),
            "region_tags" => {
                tags.extend(value.split(',').map(str::to_string));
            }
            _ => {}
        }
        attrs.push((key, value));
    }

    if let (Some(classname), Some(test_name)) = (&classname, &test_name) {
        if let Some(key) = report_key(classname, test_name) {
            for snippet in snippets {
                if snippet_keys(snippet).contains(&key) {
                    tags.extend(snippet.region_tags.iter().cloned());
                }
            }
        }
    }

    let mut out = BytesStart::new("testcase");
    for (key, value) in &attrs {
        if key != "region_tags" {
            out.push_attribute((key.as_str(), value.as_str()));
        }
    }
    if !tags.is_empty() {
        let joined = tags.into_iter().collect::<Vec<_>>().join(",");
        out.push_attribute(("region_tags", joined.as_str()));
    }
    Ok(out)
}

/// Identity of a report entry: the trailing module path segment plus the
/// test name. `TestXxx` wrapper-class segments are skipped, matching how
/// test methods are flattened out of their classes during extraction.
fn report_key(classname: &str, test_name: &str) -> Option<(String, String)> {
    let module = classname
        .split('.')
        .filter(|part| !part.starts_with("Test"))
        .next_back()?;
    Some((module.to_string(), test_name.to_string()))
}

fn snippet_keys(snippet: &ArtifactRecord) -> BTreeSet<(String, String)> {
    snippet
        .test_methods
        .iter()
        .filter_map(|location| {
            let stem = location.0.file_stem()?;
            Some((stem.to_string_lossy().into_owned(), location.1.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use snipcov_core::TestLocation;
    use std::path::PathBuf;

    fn snippet(tags: &[&str], test_file: &str, test_name: &str) -> ArtifactRecord {
        ArtifactRecord {
            source_path: PathBuf::from("http_main.py"),
            start_line: 1,
            end_line: 3,
            region_tags: tags.iter().map(|t| t.to_string()).collect(),
            test_methods: vec![TestLocation(PathBuf::from(test_file), test_name.into())],
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_matching_testcase_gains_region_tags() {
        let xml = r#"<testsuite><testcase classname="http.http_test.TestHello" name="test_hello_get" time="0.01"/></testsuite>"#;
        let snippets = vec![snippet(&["functions_helloworld_get"], "http_test.py", "test_hello_get")];

        let out = inject_region_tags(&snippets, xml).unwrap();
        assert!(out.contains(r#"region_tags="functions_helloworld_get""#));
        assert!(out.contains(r#"time="0.01""#));
    }

    #[test]
    fn test_non_matching_testcase_left_alone() {
        let xml = r#"<testcase classname="other.other_test" name="test_other"/>"#;
        let snippets = vec![snippet(&["some_tag"], "http_test.py", "test_hello_get")];

        let out = inject_region_tags(&snippets, xml).unwrap();
        assert!(!out.contains("region_tags"));
    }

    #[test]
    fn test_existing_tags_are_unioned() {
        let xml = r#"<testcase classname="http_test" name="test_hello_get" region_tags="already_there"/>"#;
        let snippets = vec![snippet(&["new_tag"], "http_test.py", "test_hello_get")];

        let out = inject_region_tags(&snippets, xml).unwrap();
        assert!(out.contains(r#"region_tags="already_there,new_tag""#));
    }

    #[test]
    fn test_wrapper_class_segments_are_skipped() {
        let xml = r#"<testcase classname="pkg.flask_test.TestFlaskApp" name="test_index"/>"#;
        let snippets = vec![snippet(&["sample_route"], "flask_test.py", "test_index")];

        let out = inject_region_tags(&snippets, xml).unwrap();
        assert!(out.contains(r#"region_tags="sample_route""#));
    }

    #[test]
    fn test_malformed_xml_is_fatal() {
        assert!(inject_region_tags(&[], "<testsuite><testcase").is_err());
    }
}
