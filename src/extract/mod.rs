//! Page extraction: classification, dispatch, tools, geometry, metrics
//!
//! A fetched page is classified by the type marker on its root element
//! and dispatched to the matching extraction strategy: graphical pages
//! get tools, layout metrics and link categorization; block pages get
//! tools and links; iframe pages get the embedded frame URL; unknown
//! pages are recorded with their type only.

pub mod geometry;
pub mod metrics;
pub mod tools;

pub use geometry::parse_style;
pub use metrics::calc_metrics;
pub use tools::{extract_block_tools, extract_tools, plain_text, ExtractionWarning};

use crate::config::PlatformConfig;
use crate::model::{Page, PageType, Rect, Tool, ToolKind};
use crate::url::categorize_page_links;
use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Reads the page type marker from the root element's class attribute
///
/// The marker is the first class token of the `<html>` element; pages
/// without a recognized marker classify as [`PageType::Undefined`].
pub fn classify_page(document: &Html) -> PageType {
    document
        .root_element()
        .value()
        .attr("class")
        .and_then(|class| class.split_whitespace().next())
        .map(PageType::from_class_token)
        .unwrap_or(PageType::Undefined)
}

/// Classifies a page and runs the matching extraction strategy
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `page_id` - The page number from the page's URL segment
/// * `exposition_base` - The exposition's base URL prefix
/// * `platform` - Platform identity for link categorization
///
/// # Returns
///
/// The assembled [`Page`] record. Extraction failures of a single tool
/// kind degrade that kind to an empty list; they never abort the page.
pub fn extract_page(
    document: &Html,
    page_id: u64,
    exposition_base: &str,
    platform: &PlatformConfig,
) -> Page {
    let page_type = classify_page(document);
    let mut page = Page::bare(page_id, page_type);

    match page_type {
        PageType::Graphical => {
            let tools = extract_all_kinds(document, page_id, extract_tools);
            page.metrics = Some(calc_metrics(&pooled_rects(&tools)));
            page.tools = non_empty(tools);
            page.hyperlinks = non_empty(categorize_page_links(
                document,
                exposition_base,
                platform,
            ));
        }
        PageType::Block => {
            let tools = extract_all_kinds(document, page_id, extract_block_tools);
            page.tools = non_empty(tools);
            page.hyperlinks = non_empty(categorize_page_links(
                document,
                exposition_base,
                platform,
            ));
        }
        PageType::Iframe => {
            page.iframe_url = iframe_url(document);
        }
        PageType::Undefined => {}
    }

    page
}

/// Runs one extraction strategy over all ten tool kinds
///
/// A kind that fails yields no entry; the warning is logged at debug
/// level, matching the soft-fail policy.
fn extract_all_kinds(
    document: &Html,
    page_id: u64,
    extract: fn(&Html, ToolKind) -> Result<Vec<Tool>, ExtractionWarning>,
) -> BTreeMap<ToolKind, Vec<Tool>> {
    let mut tools = BTreeMap::new();
    for kind in ToolKind::all() {
        match extract(document, kind) {
            Ok(extracted) if !extracted.is_empty() => {
                tracing::debug!("found {} {} on page {}", extracted.len(), kind, page_id);
                tools.insert(kind, extracted);
            }
            Ok(_) => {}
            Err(warning) => {
                tracing::debug!("page {}: {}", page_id, warning);
            }
        }
    }
    tools
}

/// Pools the rectangles of all absolutely positioned tools on a page
fn pooled_rects(tools: &BTreeMap<ToolKind, Vec<Tool>>) -> Vec<Rect> {
    tools
        .values()
        .flatten()
        .filter_map(|tool| tool.placement.rect())
        .copied()
        .collect()
}

/// Extracts the single embedded frame's URL from an iframe page
fn iframe_url(document: &Html) -> Option<String> {
    let iframe = Selector::parse("iframe[src]").ok()?;
    document
        .select(&iframe)
        .next()
        .and_then(|e| e.value().attr("src"))
        .map(str::to_string)
}

fn non_empty<K: Ord, V>(map: BTreeMap<K, V>) -> Option<BTreeMap<K, V>> {
    (!map.is_empty()).then_some(map)
}
