//! URL handling for platform exposition pages
//!
//! Exposition page URLs follow the shape
//! `https://<host>/view/<exposition-id>/<page-id>[/<x>/<y>]`, where the
//! optional trailing pair is an anchor position on the page. This module
//! provides the segment parsing, cleaning and normalization helpers the
//! page graph discoverer and link categorizer are built on.

pub mod categorize;

pub use categorize::{categorize_page_links, categorize_url, clean_link};

use crate::UrlError;
use percent_encoding::percent_decode_str;
use url::Url;

/// Percent-decodes and trims a URL's path component
///
/// The platform occasionally hands out links with percent-encoded or
/// whitespace-padded paths; fetching works either way, but page-set
/// deduplication needs one canonical spelling.
pub fn clean_url(raw: &str) -> Result<String, UrlError> {
    let mut url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
    let decoded = percent_decode_str(url.path())
        .decode_utf8_lossy()
        .trim()
        .to_string();
    url.set_path(&decoded);
    Ok(url.to_string())
}

/// Extracts the exposition id segment from a page URL
///
/// # Arguments
///
/// * `raw` - An absolute page URL (`.../view/<exposition-id>/...`)
///
/// # Returns
///
/// * `Ok(u64)` - The numeric exposition id
/// * `Err(UrlError)` - The URL has no numeric id segment
pub fn exposition_id(raw: &str) -> Result<u64, UrlError> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.nth(1))
        .ok_or_else(|| UrlError::MissingExpositionId(raw.to_string()))?
        .to_string();
    segment
        .parse()
        .map_err(|_| UrlError::MissingExpositionId(raw.to_string()))
}

/// Extracts the page number from a page URL's page segment
///
/// Non-digit characters in the segment are ignored, so anchored segments
/// like `120543#toolbar` still resolve. A segment without digits is an
/// error.
pub fn page_number(raw: &str) -> Result<u64, UrlError> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(e.to_string()))?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.nth(2))
        .ok_or_else(|| UrlError::MissingPageSegment(raw.to_string()))?;

    let digits: String = segment.chars().filter(|c| c.is_ascii_digit()).collect();
    digits
        .parse()
        .map_err(|_| UrlError::MissingPageSegment(raw.to_string()))
}

/// Returns true when both URLs belong to the same exposition
pub fn is_subpage(exposition_url: &str, candidate: &str) -> bool {
    match (exposition_id(exposition_url), exposition_id(candidate)) {
        (Ok(root), Ok(other)) => root == other,
        _ => false,
    }
}

/// Returns true for the page/0/0 self-loop anchor with no remaining path
///
/// These anchors point at the origin of the page they appear on and are
/// not real navigable pages.
pub fn is_anchor_at_origin(raw: &str) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    let Some(segments) = url.path_segments() else {
        return false;
    };
    let tail: Vec<&str> = segments.skip(3).collect();
    tail == ["0", "0"]
}

/// Removes the fragment from a URL
pub fn strip_fragment(raw: &str) -> String {
    match raw.split_once('#') {
        Some((before, _)) => before.to_string(),
        None => raw.to_string(),
    }
}

/// Resolves an href against a base URL, returning an absolute URL
///
/// Relative platform links (`/view/...`, `/profile/...`) join against the
/// base; absolute links pass through. Unresolvable hrefs yield `None`.
pub fn absolutize(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|url| url.to_string())
}
