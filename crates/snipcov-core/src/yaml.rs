//! Manually-curated region-tag metadata
//!
//! A `.snipcov.yml` file at the root directory supplies per-tag metadata
//! that the matcher cannot derive on its own: tags deliberately left
//! untested (with a reason), and hand-declared covering tests.
//!
//! ```yaml
//! storage_upload_file:
//!   untested: "covered by system tests only"
//! vision_label_detection:
//!   tests:
//!     - [vision/label_test.py, test_labels]
//! ```

use crate::snippet::TestLocation;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Metadata file name looked up in the root directory
pub const METADATA_FILENAME: &str = ".snipcov.yml";

/// Metadata for a single region tag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagMeta {
    /// Reason this tag is deliberately untested; marks it ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untested: Option<String>,
    /// Tests asserted by hand to cover this tag
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<TestLocation>,
}

/// All tag metadata loaded from one root directory
#[derive(Debug, Clone, Default)]
pub struct TagMetadata {
    tags: BTreeMap<String, TagMeta>,
}

impl TagMetadata {
    /// Load metadata from `<root>/.snipcov.yml`; a missing file is empty
    /// metadata, an unparseable one is an error
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(METADATA_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let tags: BTreeMap<String, TagMeta> = serde_yaml::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self { tags })
    }

    /// Tags marked `untested` (manually ignored)
    pub fn untested_tags(&self) -> BTreeSet<String> {
        self.tags
            .iter()
            .filter(|(_, meta)| meta.untested.is_some())
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// Metadata for one tag, if declared
    pub fn get(&self, tag: &str) -> Option<&TagMeta> {
        self.tags.get(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
