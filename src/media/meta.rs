//! Meta page parser
//!
//! Each exposition has a side document carrying its bibliographic
//! metadata: title, abstract, authorship, dates, license, DOI. The feed
//! normally supplies this record; parsing the meta page directly covers
//! single-exposition crawls and expositions missing from the feed.

use crate::crawler::fetcher::PageFetcher;
use crate::model::{Doi, ExpoMeta, Person};
use crate::Result;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Parses a meta page body into a metadata record
///
/// # Arguments
///
/// * `body` - Raw HTML of the meta page
/// * `meta_page_url` - The meta page's own URL; its `exposition` query
///   parameter is the exposition id
pub fn parse_meta_page(body: &str, meta_page_url: &str) -> ExpoMeta {
    let document = Html::parse_document(body);
    let table = meta_table(&document);

    let mut meta = ExpoMeta {
        id: exposition_query_param(meta_page_url),
        kind: table.get("type").cloned(),
        title: headline(&document),
        thumb: thumbnail(&document),
        default_page: table.get("url").cloned(),
        meta_data_page: Some(meta_page_url.to_string()),
        created: table.get("date").cloned(),
        last_modified: table.get("last modified").and_then(|d| parse_date(d)),
        status: table.get("status").cloned(),
        license: table.get("license").map(|l| l.to_lowercase()),
        abstract_text: abstract_text(&document),
        ..ExpoMeta::default()
    };

    let people = credited_people(&document);
    let mut people = people.into_iter();
    meta.author = people.next();
    meta.coauthors = people.collect();

    if let Some(keywords) = table.get("keywords") {
        meta.keywords = keywords
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }

    if let Some(doi_url) = table.get("doi") {
        meta.doi = parse_doi(doi_url);
    }

    meta
}

/// Fetches and parses a meta page
pub async fn fetch_meta_page<F: PageFetcher>(
    fetcher: &F,
    meta_page_url: &str,
) -> Result<ExpoMeta> {
    tracing::debug!("parsing meta page {}", meta_page_url);
    let body = fetcher.fetch(meta_page_url).await.into_body(meta_page_url)?;
    Ok(parse_meta_page(&body, meta_page_url))
}

/// The exposition id from the meta page URL's query string
fn exposition_query_param(meta_page_url: &str) -> Option<u64> {
    let url = Url::parse(meta_page_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "exposition")
        .and_then(|(_, value)| value.parse().ok())
}

/// The headline, with any "(last edited: ...)" suffix removed
fn headline(document: &Html) -> Option<String> {
    let selector = Selector::parse("h2.meta-headline").ok()?;
    let raw = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let cleaned = match Regex::new(r"\s*\(last edited:.*\)") {
        Ok(re) => re.replace(&raw, "").to_string(),
        Err(_) => raw,
    };
    let cleaned = cleaned.trim().to_string();
    (!cleaned.is_empty()).then_some(cleaned)
}

fn abstract_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("div.meta-right-col div.meta-description").ok()?;
    let text = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    (!text.is_empty()).then_some(text)
}

fn thumbnail(document: &Html) -> Option<String> {
    let selector = Selector::parse("img[src]").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string)
}

/// The key/value rows of the meta table, keys lowercased
fn meta_table(document: &Html) -> BTreeMap<String, String> {
    let mut table = BTreeMap::new();

    let Ok(rows) = Selector::parse("div.meta-right-col table.meta-table tr") else {
        return table;
    };
    let Ok(header) = Selector::parse("th") else {
        return table;
    };
    let Ok(data) = Selector::parse("td") else {
        return table;
    };

    for row in document.select(&rows) {
        let key = row
            .select(&header)
            .next()
            .map(|th| th.text().collect::<String>().trim().to_lowercase());
        let value = row
            .select(&data)
            .next()
            .map(|td| td.text().collect::<String>().trim().to_string());
        if let (Some(key), Some(value)) = (key, value) {
            table.insert(key, value);
        }
    }

    table
}

/// Authors and coauthors, collected from profile links in page order
fn credited_people(document: &Html) -> Vec<Person> {
    let mut people = Vec::new();

    let Ok(anchors) = Selector::parse("a[href]") else {
        return people;
    };
    let Ok(person_re) = Regex::new(r"person=(\d+)") else {
        return people;
    };

    for link in document.select(&anchors) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.starts_with("/profile/?person=") {
            continue;
        }
        let Some(id) = person_re
            .captures(href)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok())
        else {
            continue;
        };
        let name = link.text().collect::<String>().trim().to_string();
        if people.iter().all(|p: &Person| p.id != id) {
            people.push(Person { id, name });
        }
    }

    people
}

/// Parses the meta table's day/month/year date into an epoch
fn parse_date(raw: &str) -> Option<i64> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

fn parse_doi(doi_url: &str) -> Option<Doi> {
    let id = doi_url.trim().strip_prefix("https://doi.org/")?;
    Some(Doi {
        id: id.to_string(),
        url: doi_url.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const META_URL: &str =
        "https://www.researchcatalogue.net/profile/show-exposition?exposition=1234";

    const META_BODY: &str = r#"
        <html><body>
          <h2 class="meta-headline">Sounding Spaces (last edited: 2024)</h2>
          <img src="https://media.example/thumb.png">
          <a href="/profile/?person=11">Lead Author</a>
          <div class="meta-right-col">
            <div class="meta-description">An inquiry into resonance.</div>
            <table class="meta-table">
              <tr><th>Type</th><td>exposition</td></tr>
              <tr><th>Date</th><td>03/02/2023</td></tr>
              <tr><th>Last Modified</th><td>15/06/2024</td></tr>
              <tr><th>Status</th><td>published</td></tr>
              <tr><th>License</th><td>CC BY-NC-ND</td></tr>
              <tr><th>Keywords</th><td>sound, space , listening</td></tr>
              <tr><th>DOI</th><td>https://doi.org/10.22501/rc.1234</td></tr>
              <tr><th>URL</th><td>https://www.researchcatalogue.net/view/1234/1</td></tr>
            </table>
          </div>
          <a href="/profile/?person=22">Second Author</a>
        </body></html>
    "#;

    #[test]
    fn test_parse_meta_page_core_fields() {
        let meta = parse_meta_page(META_BODY, META_URL);
        assert_eq!(meta.id, Some(1234));
        assert_eq!(meta.title.as_deref(), Some("Sounding Spaces"));
        assert_eq!(meta.kind.as_deref(), Some("exposition"));
        assert_eq!(meta.status.as_deref(), Some("published"));
        assert_eq!(meta.license.as_deref(), Some("cc by-nc-nd"));
        assert_eq!(meta.abstract_text.as_deref(), Some("An inquiry into resonance."));
        assert_eq!(
            meta.default_page.as_deref(),
            Some("https://www.researchcatalogue.net/view/1234/1")
        );
        assert_eq!(meta.meta_data_page.as_deref(), Some(META_URL));
    }

    #[test]
    fn test_parse_meta_page_people() {
        let meta = parse_meta_page(META_BODY, META_URL);
        let author = meta.author.unwrap();
        assert_eq!(author.id, 11);
        assert_eq!(author.name, "Lead Author");
        assert_eq!(meta.coauthors.len(), 1);
        assert_eq!(meta.coauthors[0].id, 22);
    }

    #[test]
    fn test_parse_meta_page_dates_and_doi() {
        let meta = parse_meta_page(META_BODY, META_URL);
        // 15 June 2024 midnight UTC
        assert_eq!(meta.last_modified, Some(1_718_409_600));
        let doi = meta.doi.unwrap();
        assert_eq!(doi.id, "10.22501/rc.1234");
    }

    #[test]
    fn test_parse_meta_page_keywords_trimmed() {
        let meta = parse_meta_page(META_BODY, META_URL);
        assert_eq!(meta.keywords, vec!["sound", "space", "listening"]);
    }

    #[test]
    fn test_parse_meta_page_empty_body() {
        let meta = parse_meta_page("<html></html>", META_URL);
        assert_eq!(meta.id, Some(1234));
        assert!(meta.title.is_none());
        assert!(meta.author.is_none());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("01/01/1970"), Some(0));
        assert_eq!(parse_date("not a date"), None);
    }
}
