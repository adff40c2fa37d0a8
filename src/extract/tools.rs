//! Tool extractor
//!
//! Locates every content element of each of the ten tool kinds on a page
//! and builds a typed [`Tool`] record per element. Kind-specific source
//! resolution is dispatched through a fixed kind→handler table. A failure
//! while extracting one kind never aborts the page: the kind degrades to
//! an empty list and the warning is surfaced to the caller.

use crate::extract::geometry::parse_style;
use crate::model::{Placement, Tool, ToolDetail, ToolKind};
use crate::ExtractError;
use chrono::{DateTime, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeSet;
use std::fmt;

/// Soft-fail outcome of extracting one tool kind
///
/// Call sites log these instead of aborting the page.
#[derive(Debug, Clone)]
pub struct ExtractionWarning {
    pub kind: ToolKind,
    pub message: String,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Kind-specific detail handler, resolved once from the dispatch table
type DetailFn = fn(ElementRef) -> Result<ToolDetail, ExtractError>;

/// The fixed kind→handler dispatch table
const DISPATCH: [(ToolKind, DetailFn); 10] = [
    (ToolKind::Text, text_detail),
    (ToolKind::SimpleText, text_detail),
    (ToolKind::Picture, picture_detail),
    (ToolKind::Audio, audio_detail),
    (ToolKind::Video, video_detail),
    (ToolKind::Shape, plain_detail),
    (ToolKind::Pdf, pdf_detail),
    (ToolKind::Slideshow, slideshow_detail),
    (ToolKind::Embed, plain_detail),
    (ToolKind::Iframe, plain_detail),
];

fn handler_for(kind: ToolKind) -> DetailFn {
    DISPATCH
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, f)| *f)
        .unwrap_or(plain_detail)
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::MissingElement(css.to_string()))
}

/// Extracts all tools of one kind from an absolutely positioned page
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `kind` - The tool kind to locate
///
/// # Returns
///
/// * `Ok(Vec<Tool>)` - All tools of this kind, possibly empty
/// * `Err(ExtractionWarning)` - Extraction failed; the kind degrades to
///   an empty list at the call site
pub fn extract_tools(document: &Html, kind: ToolKind) -> Result<Vec<Tool>, ExtractionWarning> {
    let run = || -> Result<Vec<Tool>, ExtractError> {
        let tool_selector = selector(&format!(".{}", kind.class_name()))?;
        let mut tools = Vec::new();
        for element in document.select(&tool_selector) {
            let style = element
                .value()
                .attr("style")
                .ok_or_else(|| ExtractError::MissingElement("style attribute".to_string()))?;
            let placement = Placement::absolute(parse_style(style)?);
            tools.push(build_tool(element, kind, placement)?);
        }
        Ok(tools)
    };

    run().map_err(|e| ExtractionWarning {
        kind,
        message: e.to_string(),
    })
}

/// Extracts all tools of one kind from a block-layout page
///
/// Block pages arrange tools in `row` groupings over a twelve-column
/// grid; each tool's geometry is replaced by the percentage width of its
/// `cell-N` ancestor plus the index of the row it sits in. A row that
/// fails to extract is skipped; the remaining rows still contribute.
pub fn extract_block_tools(
    document: &Html,
    kind: ToolKind,
) -> Result<Vec<Tool>, ExtractionWarning> {
    let warn = |e: ExtractError| ExtractionWarning {
        kind,
        message: e.to_string(),
    };

    let row_selector = selector(".row").map_err(warn)?;
    let tool_selector = selector(&format!(".{}", kind.class_name())).map_err(warn)?;

    let mut tools = Vec::new();
    for (row_index, row) in document.select(&row_selector).enumerate() {
        let mut row_tools = Vec::new();
        let result = row.select(&tool_selector).try_for_each(|element| {
            let span = cell_column_span(element)?;
            let placement = Placement::grid(span, row_index);
            row_tools.push(build_tool(element, kind, placement)?);
            Ok::<(), ExtractError>(())
        });

        match result {
            Ok(()) => tools.append(&mut row_tools),
            Err(e) => {
                tracing::debug!("Skipping row {} for {}: {}", row_index, kind, e);
            }
        }
    }

    Ok(tools)
}

/// Reads the column span from the nearest ancestor div's `cell-N` class
fn cell_column_span(element: ElementRef) -> Result<u32, ExtractError> {
    let mut node = element.parent();
    while let Some(current) = node {
        if let Some(candidate) = ElementRef::wrap(current) {
            if candidate.value().name() == "div" {
                return candidate
                    .value()
                    .classes()
                    .find_map(|class| class.strip_prefix("cell-"))
                    .and_then(|span| span.parse().ok())
                    .ok_or_else(|| {
                        ExtractError::MissingElement("cell-N grid class".to_string())
                    });
            }
        }
        node = current.parent();
    }
    Err(ExtractError::MissingElement("grid cell ancestor".to_string()))
}

/// Builds the shared base of a tool record and dispatches its detail
fn build_tool(
    element: ElementRef,
    kind: ToolKind,
    placement: Placement,
) -> Result<Tool, ExtractError> {
    let anchor = selector("a")?;
    let id = element
        .select(&anchor)
        .find_map(|a| a.value().attr("id"))
        .ok_or_else(|| ExtractError::MissingElement("tool anchor id".to_string()))?
        .to_string();

    let content = content_element(element)?;
    let detail = handler_for(kind)(content)?;

    Ok(Tool {
        id,
        placement,
        raw_content: content.html(),
        last_modified_by: element
            .value()
            .attr("data-last-modified-by")
            .map(str::to_string),
        last_modified_at: element
            .value()
            .attr("data-last-modified-at")
            .and_then(parse_timestamp),
        detail,
        copyright_ref: None,
        attribution: Default::default(),
    })
}

/// Finds the tool's content container
fn content_element(element: ElementRef) -> Result<ElementRef, ExtractError> {
    let content = selector("div.tool-content")?;
    element
        .select(&content)
        .next()
        .ok_or_else(|| ExtractError::MissingElement("tool-content".to_string()))
}

/// Parses an ISO-8601 modification stamp into a POSIX timestamp
fn parse_timestamp(raw: &str) -> Option<i64> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.timestamp());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}

// ----- kind-specific detail handlers -----

/// text / simpletext: plain text with script and style content stripped
fn text_detail(content: ElementRef) -> Result<ToolDetail, ExtractError> {
    Ok(ToolDetail::Text {
        text: plain_text(content),
    })
}

/// picture: first of img src, any src-bearing element, object data (SVGs)
fn picture_detail(content: ElementRef) -> Result<ToolDetail, ExtractError> {
    let img = selector("img[src]")?;
    let any_src = selector("[src]")?;
    let object = selector("object[data]")?;

    let src = content
        .select(&img)
        .find_map(|e| e.value().attr("src"))
        .or_else(|| content.select(&any_src).find_map(|e| e.value().attr("src")))
        .or_else(|| content.select(&object).find_map(|e| e.value().attr("data")))
        .map(str::to_string);

    Ok(ToolDetail::Source { src })
}

/// slideshow: the deduplicated sources of all src-bearing descendants
fn slideshow_detail(content: ElementRef) -> Result<ToolDetail, ExtractError> {
    let any_src = selector("[src]")?;
    let sources: BTreeSet<String> = content
        .select(&any_src)
        .filter_map(|e| e.value().attr("src"))
        .map(str::to_string)
        .collect();

    Ok(ToolDetail::Slideshow {
        src: sources.into_iter().collect(),
    })
}

/// audio: the first child element's data-file attribute
fn audio_detail(content: ElementRef) -> Result<ToolDetail, ExtractError> {
    Ok(ToolDetail::Source {
        src: media_file(content),
    })
}

/// video: data-file source plus the same element's data-image poster
fn video_detail(content: ElementRef) -> Result<ToolDetail, ExtractError> {
    Ok(ToolDetail::Video {
        src: media_file(content),
        poster: first_div_attr(content, "data-image"),
    })
}

/// pdf: object data, falling back to an anchor's href
fn pdf_detail(content: ElementRef) -> Result<ToolDetail, ExtractError> {
    let object = selector("object[data]")?;
    let anchor = selector("a[href]")?;

    let src = content
        .select(&object)
        .find_map(|e| e.value().attr("data"))
        .or_else(|| content.select(&anchor).find_map(|e| e.value().attr("href")))
        .map(str::to_string);

    Ok(ToolDetail::Source { src })
}

/// shape / embed / iframe: geometry and raw content only
fn plain_detail(_content: ElementRef) -> Result<ToolDetail, ExtractError> {
    Ok(ToolDetail::Plain {})
}

fn media_file(content: ElementRef) -> Option<String> {
    first_div_attr(content, "data-file")
}

/// Reads an attribute from the first div descendant of the content
fn first_div_attr(content: ElementRef, attr: &str) -> Option<String> {
    let div = Selector::parse("div").ok()?;
    content
        .select(&div)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(str::to_string)
}

/// Collects the text of an element, skipping script and style subtrees
pub fn plain_text(element: ElementRef) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if name != "script" && name != "style" {
                collect_text(child_element, out);
            }
        } else if let scraper::Node::Text(text) = child.value() {
            out.push_str(text);
        }
    }
}
