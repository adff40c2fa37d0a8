//! Attribution fetcher
//!
//! The exposition's meta page carries a copyright section listing every
//! simple-media entry with its attribution table and the tools that use
//! it. Parsing yields [`CopyrightEntry`] records whose parallel
//! `tool_ids`/`tool_refs` lists the merger joins back onto extracted
//! tools.

use crate::crawler::fetcher::PageFetcher;
use crate::model::CopyrightEntry;
use crate::Result;
use scraper::{ElementRef, Html, Selector};

/// Parses the copyright section of a meta page body
///
/// Each direct child of the `simple-media-copyright` container is one
/// medium; its `meta-table` rows become attributes, and the `usages` row
/// contributes the parallel tool-ref/tool-id lists (a tool id is the
/// fragment of its usage link).
pub fn parse_copyrights(body: &str) -> Vec<CopyrightEntry> {
    let document = Html::parse_document(body);
    let mut entries = Vec::new();

    let Ok(section) = Selector::parse("div.simple-media-copyright > div") else {
        return entries;
    };
    let Ok(table) = Selector::parse("table.meta-table") else {
        return entries;
    };
    let Ok(row) = Selector::parse("tr") else {
        return entries;
    };

    for media in document.select(&section) {
        let Some(meta_table) = media.select(&table).next() else {
            continue;
        };

        let mut entry = CopyrightEntry::default();
        for table_row in meta_table.select(&row) {
            if let Some((key, value)) = parse_row(table_row, &mut entry) {
                entry.attributes.insert(key, value);
            }
        }

        entries.push(entry);
    }

    entries
}

/// Parses one th/td row; usages rows also fill the parallel tool lists
fn parse_row(row: ElementRef, entry: &mut CopyrightEntry) -> Option<(String, String)> {
    let header = Selector::parse("th").ok()?;
    let data = Selector::parse("td").ok()?;
    let anchor = Selector::parse("a[href]").ok()?;

    let key = row
        .select(&header)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_lowercase();
    let cell = row.select(&data).next()?;
    let value = cell.text().collect::<String>().trim().to_string();

    if key.contains("usages") {
        for link in cell.select(&anchor) {
            if let Some(href) = link.value().attr("href") {
                entry.tool_refs.push(href.to_string());
                let id = href.rsplit('#').next().unwrap_or(href);
                entry.tool_ids.push(id.to_string());
            }
        }
    }

    Some((key, value))
}

/// Fetches a meta page and extracts its copyright entries
pub async fn fetch_copyrights<F: PageFetcher>(
    fetcher: &F,
    meta_page_url: &str,
) -> Result<Vec<CopyrightEntry>> {
    tracing::debug!("fetching copyrights from {}", meta_page_url);
    let body = fetcher.fetch(meta_page_url).await.into_body(meta_page_url)?;
    Ok(parse_copyrights(&body))
}
