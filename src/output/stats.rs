//! Merged rollup statistics
//!
//! For every crawled exposition a rollup record is derived: page count,
//! default page type (with its metrics promoted for graphical default
//! pages), tool counts per kind and link counts per category. Rollups
//! accumulate in one merged JSON file consumed by the downstream stats
//! aggregator and query API; its field names are load-bearing.

use crate::model::{Exposition, LayoutMetrics, LinkCategory, PageType, ToolKind};
use crate::url::page_number;
use crate::{Result, WeaveError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Per-exposition rollup record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpoRollup {
    #[serde(rename = "number-of-pages")]
    pub number_of_pages: usize,

    #[serde(rename = "default-page")]
    pub default_page: String,

    #[serde(rename = "default-page-type")]
    pub default_page_type: Option<PageType>,

    #[serde(rename = "tool-counts")]
    pub tool_counts: BTreeMap<ToolKind, usize>,

    #[serde(rename = "total-number-of-tools")]
    pub total_number_of_tools: usize,

    #[serde(rename = "link-counts")]
    pub link_counts: BTreeMap<LinkCategory, usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<LayoutMetrics>,
}

/// Derives the rollup record of one exposition
pub fn rollup(exposition: &Exposition) -> ExpoRollup {
    let default_page_id = page_number(&exposition.url).ok();
    let default_page = default_page_id.and_then(|id| exposition.pages.get(&id));
    let default_page_type = default_page.map(|page| page.page_type);

    // Metrics are promoted only for graphical default pages
    let metrics = default_page
        .filter(|page| page.page_type == PageType::Graphical)
        .and_then(|page| page.metrics.clone());

    let mut tool_counts: BTreeMap<ToolKind, usize> = BTreeMap::new();
    let mut total_number_of_tools = 0;
    let mut link_counts: BTreeMap<LinkCategory, usize> = BTreeMap::new();

    for page in exposition.pages.values() {
        if let Some(tools) = page.tools.as_ref() {
            for (kind, tool_list) in tools {
                *tool_counts.entry(*kind).or_default() += tool_list.len();
                total_number_of_tools += tool_list.len();
            }
        }
        if let Some(links) = page.hyperlinks.as_ref() {
            for (category, urls) in links {
                *link_counts.entry(*category).or_default() += urls.len();
            }
        }
    }

    ExpoRollup {
        number_of_pages: exposition.pages.len(),
        default_page: exposition.url.clone(),
        default_page_type,
        tool_counts,
        total_number_of_tools,
        link_counts,
        metrics,
    }
}

/// The merged stats file, updated incrementally after every exposition
pub struct MergedStats {
    path: PathBuf,
    entries: BTreeMap<String, ExpoRollup>,
}

impl MergedStats {
    /// Loads the merged stats file, or starts empty if it doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| WeaveError::Persistence(format!("parse {}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Inserts or replaces one exposition's rollup and persists the file
    pub fn upsert(&mut self, exposition_id: u64, record: ExpoRollup) -> Result<()> {
        self.entries.insert(exposition_id.to_string(), record);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, exposition_id: u64) -> Option<&ExpoRollup> {
        self.entries.get(&exposition_id.to_string())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Page, Placement, Rect, Tool, ToolDetail};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn sample_exposition() -> Exposition {
        let mut expo = Exposition::new(42, "https://x/view/42/1");

        let mut default_page = Page::bare(1, PageType::Graphical);
        let mut tools = BTreeMap::new();
        tools.insert(
            ToolKind::Picture,
            vec![Tool {
                id: "p1".to_string(),
                placement: Placement::absolute(Rect::new(0, 0, 10, 10)),
                raw_content: String::new(),
                last_modified_by: None,
                last_modified_at: None,
                detail: ToolDetail::Source { src: None },
                copyright_ref: None,
                attribution: BTreeMap::new(),
            }],
        );
        default_page.tools = Some(tools);
        default_page.metrics = Some(crate::extract::calc_metrics(&[Rect::new(0, 0, 10, 10)]));
        let mut links = BTreeMap::new();
        links.insert(
            LinkCategory::External,
            BTreeSet::from(["https://a".to_string(), "https://b".to_string()]),
        );
        default_page.hyperlinks = Some(links);

        expo.pages.insert(1, default_page);
        expo.pages.insert(2, Page::bare(2, PageType::Undefined));
        expo
    }

    #[test]
    fn test_rollup_counts() {
        let record = rollup(&sample_exposition());
        assert_eq!(record.number_of_pages, 2);
        assert_eq!(record.default_page_type, Some(PageType::Graphical));
        assert_eq!(record.tool_counts[&ToolKind::Picture], 1);
        assert_eq!(record.total_number_of_tools, 1);
        assert_eq!(record.link_counts[&LinkCategory::External], 2);
        assert!(record.metrics.is_some());
    }

    #[test]
    fn test_rollup_without_default_page() {
        let expo = Exposition::new(9, "https://x/not-a-view-url");
        let record = rollup(&expo);
        assert_eq!(record.default_page_type, None);
        assert!(record.metrics.is_none());
    }

    #[test]
    fn test_rollup_serialized_field_names() {
        let record = rollup(&sample_exposition());
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();
        for field in [
            "number-of-pages",
            "default-page",
            "default-page-type",
            "tool-counts",
            "total-number-of-tools",
            "link-counts",
        ] {
            assert!(obj.contains_key(field), "missing field {}", field);
        }
        assert!(obj["tool-counts"].get("tool-picture").is_some());
    }

    #[test]
    fn test_merged_stats_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("merged_stats.json");

        let mut stats = MergedStats::load(&path).unwrap();
        assert!(stats.is_empty());
        stats.upsert(42, rollup(&sample_exposition())).unwrap();

        let reloaded = MergedStats::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(42).unwrap().number_of_pages, 2);
    }
}
