//! Data model for crawled expositions
//!
//! This module defines the serde types that make up the persisted
//! exposition record. The serialized field names are load-bearing: the
//! downstream stats aggregator and query API read these documents.

mod tool;

pub use tool::{Placement, Rect, Tool, ToolDetail, ToolKind};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One crawled exposition: the terminal artifact of the pipeline,
/// written as a single JSON document keyed by exposition id.
#[derive(Debug, Clone, Serialize)]
pub struct Exposition {
    pub id: u64,
    pub url: String,
    pub pages: BTreeMap<u64, Page>,
    pub meta: ExpoMeta,
    pub hyperlinks: BTreeMap<LinkCategory, BTreeSet<String>>,
    pub copyrights: Vec<CopyrightEntry>,
    pub text: TextStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Exposition {
    /// Creates an empty exposition shell for the given id and root URL
    pub fn new(id: u64, url: &str) -> Self {
        Self {
            id,
            url: url.to_string(),
            pages: BTreeMap::new(),
            meta: ExpoMeta::default(),
            hyperlinks: BTreeMap::new(),
            copyrights: Vec::new(),
            text: TextStats::default(),
            error: None,
        }
    }
}

/// One fetched sub-document of an exposition
///
/// Which optional fields are populated is determined by the page type:
/// graphical pages carry tools, metrics and hyperlinks; block pages carry
/// tools and hyperlinks; iframe pages carry the embedded frame URL;
/// undefined pages carry the type only.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: u64,
    #[serde(rename = "type")]
    pub page_type: PageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<BTreeMap<ToolKind, Vec<Tool>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<LayoutMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlinks: Option<BTreeMap<LinkCategory, BTreeSet<String>>>,
    #[serde(rename = "url", skip_serializing_if = "Option::is_none")]
    pub iframe_url: Option<String>,
}

impl Page {
    /// Creates a page record carrying only its id and type
    ///
    /// This is the degraded form used when classification or dispatch
    /// fails for a page.
    pub fn bare(id: u64, page_type: PageType) -> Self {
        Self {
            id,
            page_type,
            tools: None,
            metrics: None,
            hyperlinks: None,
            iframe_url: None,
        }
    }
}

/// Layout mode of a page, read from the root element's class marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageType {
    /// Free absolute positioning (`weave-graphical`)
    #[serde(rename = "weave-graphical")]
    Graphical,

    /// Grid-based rows and columns (`weave-block`)
    #[serde(rename = "weave-block")]
    Block,

    /// A single embedded frame
    #[serde(rename = "iframe")]
    Iframe,

    /// No recognized type marker
    #[serde(rename = "undefined")]
    Undefined,
}

impl PageType {
    /// Parses a page type from the root element's first class token
    pub fn from_class_token(token: &str) -> Self {
        match token {
            "weave-graphical" => Self::Graphical,
            "weave-block" => Self::Block,
            "iframe" => Self::Iframe,
            _ => Self::Undefined,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graphical => "weave-graphical",
            Self::Block => "weave-block",
            Self::Iframe => "iframe",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The mutually exclusive buckets a collected URL can land in
///
/// `InText` is not produced by the categorizer; it is the aggregator's
/// bucket for bare URLs matched out of the concatenated text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkCategory {
    #[serde(rename = "same_exposition")]
    SameExposition,

    #[serde(rename = "other_expositions")]
    OtherExpositions,

    #[serde(rename = "references")]
    References,

    #[serde(rename = "external")]
    External,

    #[serde(rename = "in_text")]
    InText,
}

impl LinkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SameExposition => "same_exposition",
            Self::OtherExpositions => "other_expositions",
            Self::References => "references",
            Self::External => "external",
            Self::InText => "in_text",
        }
    }
}

impl fmt::Display for LinkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Layout-quality metrics of a graphical page
///
/// Pure functions of the page's rectangle set; see `extract::metrics`
/// for the formulas. `horizontal_vertical_ratio` is `None` when the
/// rectangle set is empty or has zero bounding height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub alignment_score: f64,
    pub spacing_score: f64,
    pub size_uniformity_score: f64,
    pub overlap_percentage: f64,
    pub white_space_percentage: f64,
    pub horizontal_vertical_ratio: Option<f64>,
    pub overall_regular_score: f64,
}

/// Concatenated plain text of an exposition with derived counts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextStats {
    pub content: String,
    pub charcount: usize,
    pub wordcount: usize,
}

/// One attribution record from the meta page's copyright section
///
/// `tool_ids` and `tool_refs` are parallel lists: position `i` of both
/// describes the same usage of the underlying medium.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CopyrightEntry {
    #[serde(rename = "id")]
    pub tool_ids: Vec<String>,

    #[serde(rename = "tool")]
    pub tool_refs: Vec<String>,

    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl CopyrightEntry {
    /// Returns the position of the given tool id in this entry, if any
    pub fn position_of(&self, tool_id: &str) -> Option<usize> {
        self.tool_ids.iter().position(|id| id == tool_id)
    }
}

/// A person credited on an exposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
}

/// A DOI assigned to an exposition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doi {
    pub id: String,
    pub url: String,
}

/// Bibliographic metadata of an exposition
///
/// Populated either from the upstream exposition feed or by parsing the
/// exposition's meta page. Fields not modeled explicitly are kept in the
/// flattened `extra` map so nothing the platform serves is dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpoMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,

    #[serde(rename = "default-page", skip_serializing_if = "Option::is_none")]
    pub default_page: Option<String>,

    #[serde(rename = "meta-data-page", skip_serializing_if = "Option::is_none")]
    pub meta_data_page: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(rename = "last-modified", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Person>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coauthors: Vec<Person>,

    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<Doi>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_type_from_class_token() {
        assert_eq!(
            PageType::from_class_token("weave-graphical"),
            PageType::Graphical
        );
        assert_eq!(PageType::from_class_token("weave-block"), PageType::Block);
        assert_eq!(PageType::from_class_token("iframe"), PageType::Iframe);
        assert_eq!(
            PageType::from_class_token("something-else"),
            PageType::Undefined
        );
    }

    #[test]
    fn test_link_category_serialized_names() {
        let json = serde_json::to_string(&LinkCategory::OtherExpositions).unwrap();
        assert_eq!(json, "\"other_expositions\"");
        let json = serde_json::to_string(&LinkCategory::SameExposition).unwrap();
        assert_eq!(json, "\"same_exposition\"");
    }

    #[test]
    fn test_exposition_serializes_load_bearing_fields() {
        let expo = Exposition::new(42, "https://example.net/view/42/100");
        let value = serde_json::to_value(&expo).unwrap();
        let obj = value.as_object().unwrap();
        for field in ["id", "url", "pages", "meta", "hyperlinks", "copyrights", "text"] {
            assert!(obj.contains_key(field), "missing field {}", field);
        }
        // error is omitted unless set
        assert!(!obj.contains_key("error"));
        let text = obj.get("text").unwrap().as_object().unwrap();
        for field in ["content", "charcount", "wordcount"] {
            assert!(text.contains_key(field), "missing text field {}", field);
        }
    }

    #[test]
    fn test_copyright_entry_position_of() {
        let entry = CopyrightEntry {
            tool_ids: vec!["a".into(), "b".into()],
            tool_refs: vec!["/view/1#a".into(), "/view/1#b".into()],
            attributes: BTreeMap::new(),
        };
        assert_eq!(entry.position_of("b"), Some(1));
        assert_eq!(entry.position_of("c"), None);
    }

    #[test]
    fn test_expo_meta_roundtrip_keeps_extra_fields() {
        let json = r#"{
            "id": 7,
            "title": "A Study",
            "default-page": "https://example.net/view/7/10",
            "last-modified": 1700000000,
            "published in": "Journal of Examples"
        }"#;
        let meta: ExpoMeta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.id, Some(7));
        assert_eq!(meta.last_modified, Some(1700000000));
        assert!(meta.extra.contains_key("published in"));
    }
}
