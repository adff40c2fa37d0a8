//! Page graph discoverer
//!
//! An exposition is an unbounded set of linked sub-pages. Discovery
//! collects every anchor on the root page and on the meta page, keeps the
//! URLs that belong to the same exposition, drops self-loop anchors,
//! strips fragments, and returns the deduplicated page set. If the meta
//! page cannot be fetched the discoverer fails soft and returns just the
//! root URL; a partial merge of an incomplete set is never produced.

use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::url::{absolutize, is_anchor_at_origin, is_subpage, strip_fragment};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Collects the sub-page URLs referenced by one page body
///
/// # Arguments
///
/// * `body` - Raw HTML of the page
/// * `exposition_url` - The exposition's root page URL
/// * `base` - Base URL for resolving relative hrefs
pub fn pages_in(body: &str, exposition_url: &str, base: &Url) -> BTreeSet<String> {
    let document = Html::parse_document(body);
    let mut pages = BTreeSet::new();

    let Ok(anchors) = Selector::parse("a[href]") else {
        return pages;
    };

    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(resolved) = absolutize(href, base) else {
            continue;
        };
        if !is_subpage(exposition_url, &resolved) {
            continue;
        }
        if is_anchor_at_origin(&resolved) {
            continue;
        }
        pages.insert(strip_fragment(&resolved));
    }

    pages
}

/// Finds the meta page link on an exposition's root page
///
/// The link sits in the `menu-meta` entry of the page menu.
pub fn find_meta_link(body: &str, base: &Url) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("li.menu-meta a[href]").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolutize(href, base))
}

/// Discovers the full page set of an exposition
///
/// The root page body is already fetched; the meta page is fetched here
/// because its link set routinely references sub-pages the root page
/// does not. The result is the set union of both sources plus the root
/// URL itself. On meta fetch failure only the root URL is returned.
///
/// Discovery is deterministic: identical root and meta content produce
/// the identical page set.
pub async fn discover_pages<F: PageFetcher>(
    fetcher: &F,
    exposition_url: &str,
    root_body: &str,
    meta_page_url: &str,
    base: &Url,
) -> BTreeSet<String> {
    let mut pages = pages_in(root_body, exposition_url, base);

    match fetcher.fetch(meta_page_url).await {
        FetchOutcome::Success { body, .. } => {
            pages.extend(pages_in(&body, exposition_url, base));
        }
        outcome => {
            tracing::warn!(
                "meta page fetch failed for {}: {:?}; using root page only",
                meta_page_url,
                outcome
            );
            pages.clear();
        }
    }

    pages.insert(strip_fragment(exposition_url));
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "https://www.researchcatalogue.net/view/1234/5678";

    fn base() -> Url {
        Url::parse("https://www.researchcatalogue.net").unwrap()
    }

    struct StaticFetcher {
        body: Option<String>,
    }

    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> FetchOutcome {
            match &self.body {
                Some(body) => FetchOutcome::Success {
                    status: 200,
                    body: body.clone(),
                },
                None => FetchOutcome::NetworkError {
                    error: "unreachable".to_string(),
                },
            }
        }
    }

    #[test]
    fn test_pages_in_keeps_same_exposition_only() {
        let body = r#"
            <a href="/view/1234/1111">one</a>
            <a href="/view/1234/2222">two</a>
            <a href="/view/9999/3333">other exposition</a>
            <a href="https://example.com/">external</a>
        "#;
        let pages = pages_in(body, ROOT, &base());
        assert_eq!(pages.len(), 2);
        assert!(pages.contains("https://www.researchcatalogue.net/view/1234/1111"));
    }

    #[test]
    fn test_pages_in_drops_anchor_at_origin() {
        let body = r#"
            <a href="/view/1234/5678/0/0">self anchor</a>
            <a href="/view/1234/5678/100/200">positioned anchor</a>
        "#;
        let pages = pages_in(body, ROOT, &base());
        assert!(!pages
            .iter()
            .any(|p| p.ends_with("/0/0")));
        assert!(pages
            .contains("https://www.researchcatalogue.net/view/1234/5678/100/200"));
    }

    #[test]
    fn test_pages_in_strips_fragments_and_dedups() {
        let body = r#"
            <a href="/view/1234/1111#tool-5">a</a>
            <a href="/view/1234/1111#tool-9">b</a>
            <a href="/view/1234/1111">c</a>
        "#;
        let pages = pages_in(body, ROOT, &base());
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_find_meta_link() {
        let body = r#"
            <ul><li class="menu menu-meta">
              <a href="/profile/show-exposition?exposition=1234">meta</a>
            </li></ul>
        "#;
        let link = find_meta_link(body, &base()).unwrap();
        assert_eq!(
            link,
            "https://www.researchcatalogue.net/profile/show-exposition?exposition=1234"
        );
    }

    #[test]
    fn test_find_meta_link_absent() {
        assert_eq!(find_meta_link("<p>no menu</p>", &base()), None);
    }

    #[tokio::test]
    async fn test_discover_merges_root_and_meta() {
        let root_body = r#"<a href="/view/1234/1111">one</a>"#;
        let fetcher = StaticFetcher {
            body: Some(r#"<a href="/view/1234/2222">two</a>"#.to_string()),
        };

        let pages = discover_pages(&fetcher, ROOT, root_body, "https://m", &base()).await;
        assert_eq!(pages.len(), 3); // root + one + two
        assert!(pages.contains(ROOT));
    }

    #[tokio::test]
    async fn test_discover_fails_soft_on_meta_error() {
        let root_body = r#"<a href="/view/1234/1111">one</a>"#;
        let fetcher = StaticFetcher { body: None };

        let pages = discover_pages(&fetcher, ROOT, root_body, "https://m", &base()).await;
        assert_eq!(pages.len(), 1);
        assert!(pages.contains(ROOT));
    }

    #[tokio::test]
    async fn test_discovery_is_deterministic() {
        let root_body = r#"
            <a href="/view/1234/3333">c</a>
            <a href="/view/1234/1111">a</a>
            <a href="/view/1234/2222">b</a>
        "#;
        let fetcher = StaticFetcher {
            body: Some(root_body.to_string()),
        };

        let first = discover_pages(&fetcher, ROOT, root_body, "https://m", &base()).await;
        let second = discover_pages(&fetcher, ROOT, root_body, "https://m", &base()).await;
        assert_eq!(first, second);
    }
}
