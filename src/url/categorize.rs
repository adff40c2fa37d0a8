//! Link categorizer
//!
//! Collects the outbound links of a page and sorts each into exactly one
//! of four buckets: same-exposition, other-exposition, reference, or
//! external. Links into the platform's media server and local files are
//! not page links and are dropped before classification.

use crate::config::PlatformConfig;
use crate::model::LinkCategory;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Cleans a collected href into a canonical absolute URL
///
/// Quoting artifacts are stripped, relative links resolve against the
/// page base, and the trailing slash is dropped so equal targets compare
/// equal. Returns `None` for hrefs that cannot resolve to a URL.
pub fn clean_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim().trim_matches(|c| c == '"' || c == '\'');
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = base.join(href).ok()?;
    let mut cleaned = resolved.to_string();
    while cleaned.ends_with('/') && !cleaned.ends_with("//") {
        cleaned.pop();
    }
    Some(cleaned)
}

/// Classifies a cleaned URL into its link category
///
/// Rules apply in fixed priority order; the first match wins:
/// 1. the literal substring `reference` → References
/// 2. the exposition's own base prefix → SameExposition
/// 3. the platform's domain or a subdomain of it, or the platform's DOI
///    namespace token → OtherExpositions
/// 4. anything else → External
///
/// Media-server and non-HTTP URLs are dropped (`None`).
pub fn categorize_url(
    url: &str,
    exposition_base: &str,
    platform: &PlatformConfig,
) -> Option<LinkCategory> {
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    if url.starts_with(platform.media_url.trim_end_matches('/')) {
        return None;
    }

    if url.contains("reference") {
        return Some(LinkCategory::References);
    }

    if url.starts_with(exposition_base) {
        return Some(LinkCategory::SameExposition);
    }

    let domain = platform.domain();
    let host = parsed.host_str().unwrap_or("");
    let on_platform = host == domain || host.ends_with(&format!(".{}", domain));
    if on_platform || url.contains(&platform.doi_token) {
        return Some(LinkCategory::OtherExpositions);
    }

    Some(LinkCategory::External)
}

/// Collects and categorizes every outbound link of a page
///
/// Anchors contribute their `href`; picture tools additionally contribute
/// their `data-follow-link` target. The result maps each category to its
/// deduplicated URL set.
pub fn categorize_page_links(
    document: &Html,
    exposition_base: &str,
    platform: &PlatformConfig,
) -> BTreeMap<LinkCategory, BTreeSet<String>> {
    let Ok(base) = Url::parse(&platform.base_url) else {
        return BTreeMap::new();
    };

    let mut hrefs: Vec<String> = Vec::new();

    if let Ok(anchors) = Selector::parse("a[href]") {
        for element in document.select(&anchors) {
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href.to_string());
            }
        }
    }

    if let Ok(pictures) = Selector::parse(".tool-picture[data-follow-link]") {
        for element in document.select(&pictures) {
            if let Some(target) = element.value().attr("data-follow-link") {
                hrefs.push(target.to_string());
            }
        }
    }

    let mut buckets: BTreeMap<LinkCategory, BTreeSet<String>> = BTreeMap::new();
    for href in hrefs {
        let Some(cleaned) = clean_link(&href, &base) else {
            continue;
        };
        if let Some(category) = categorize_url(&cleaned, exposition_base, platform) {
            buckets.entry(category).or_default().insert(cleaned);
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> PlatformConfig {
        PlatformConfig {
            base_url: "https://www.researchcatalogue.net".to_string(),
            media_url: "https://media.researchcatalogue.net".to_string(),
            feed_url: "https://map.rcdata.org/internal_research.json".to_string(),
            doi_token: "10.22501".to_string(),
        }
    }

    const EXPO_BASE: &str = "https://www.researchcatalogue.net/view/1234";

    #[test]
    fn test_reference_beats_same_exposition() {
        // A URL matching both rule 1 and rule 2 must land in References
        let url = "https://www.researchcatalogue.net/view/1234/reference/99";
        assert_eq!(
            categorize_url(url, EXPO_BASE, &platform()),
            Some(LinkCategory::References)
        );
    }

    #[test]
    fn test_same_exposition() {
        let url = "https://www.researchcatalogue.net/view/1234/5678";
        assert_eq!(
            categorize_url(url, EXPO_BASE, &platform()),
            Some(LinkCategory::SameExposition)
        );
    }

    #[test]
    fn test_other_exposition_by_host() {
        let url = "https://www.researchcatalogue.net/view/9999/1";
        assert_eq!(
            categorize_url(url, EXPO_BASE, &platform()),
            Some(LinkCategory::OtherExpositions)
        );
    }

    #[test]
    fn test_other_exposition_by_subdomain() {
        let url = "https://map.researchcatalogue.net/something";
        assert_eq!(
            categorize_url(url, EXPO_BASE, &platform()),
            Some(LinkCategory::OtherExpositions)
        );
    }

    #[test]
    fn test_other_exposition_by_doi_token() {
        let url = "https://doi.org/10.22501/rc.12345";
        assert_eq!(
            categorize_url(url, EXPO_BASE, &platform()),
            Some(LinkCategory::OtherExpositions)
        );
    }

    #[test]
    fn test_external() {
        let url = "https://example.com/article";
        assert_eq!(
            categorize_url(url, EXPO_BASE, &platform()),
            Some(LinkCategory::External)
        );
    }

    #[test]
    fn test_media_url_dropped() {
        let url = "https://media.researchcatalogue.net/rc/master/12345.jpg";
        assert_eq!(categorize_url(url, EXPO_BASE, &platform()), None);
    }

    #[test]
    fn test_non_http_dropped() {
        assert_eq!(
            categorize_url("file:///tmp/local.pdf", EXPO_BASE, &platform()),
            None
        );
        assert_eq!(
            categorize_url("mailto:someone@example.com", EXPO_BASE, &platform()),
            None
        );
    }

    #[test]
    fn test_clean_link_strips_quotes_and_trailing_slash() {
        let base = Url::parse("https://www.researchcatalogue.net").unwrap();
        assert_eq!(
            clean_link("\"https://example.com/page/\"", &base).unwrap(),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_clean_link_resolves_relative() {
        let base = Url::parse("https://www.researchcatalogue.net").unwrap();
        assert_eq!(
            clean_link("/view/1234/5678", &base).unwrap(),
            "https://www.researchcatalogue.net/view/1234/5678"
        );
    }

    #[test]
    fn test_categorize_page_links_dedups_and_buckets() {
        let html = r#"
            <html><body>
                <a href="/view/1234/5678">internal</a>
                <a href="/view/1234/5678">internal again</a>
                <a href="/view/9999/1">other expo</a>
                <a href="https://example.com/paper">external</a>
                <a href="https://media.researchcatalogue.net/x.png">media</a>
                <div class="tool tool-picture" data-follow-link="https://example.com/art"></div>
            </body></html>
        "#;
        let document = Html::parse_document(html);
        let buckets = categorize_page_links(&document, EXPO_BASE, &platform());

        assert_eq!(
            buckets.get(&LinkCategory::SameExposition).unwrap().len(),
            1
        );
        assert_eq!(
            buckets.get(&LinkCategory::OtherExpositions).unwrap().len(),
            1
        );
        let external = buckets.get(&LinkCategory::External).unwrap();
        assert_eq!(external.len(), 2);
        assert!(external.contains("https://example.com/art"));
        // media link appears nowhere
        for urls in buckets.values() {
            assert!(urls.iter().all(|u| !u.contains("media.researchcatalogue")));
        }
    }
}
