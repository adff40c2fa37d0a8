//! Exposition aggregator
//!
//! The terminal transform before persistence: folds all processed pages
//! into the exposition-level hyperlink map, the concatenated text record
//! with character and word counts, and a best-effort sweep for bare URLs
//! inside the text (collected under the `in_text` bucket).

use crate::model::{Exposition, LinkCategory, ToolDetail};
use regex::Regex;
use std::collections::BTreeSet;

/// Matches bare URLs inside concatenated plain text
const URL_PATTERN: &str = r#"https?://[^\s"'<>]+"#;

/// Finalizes an exposition record from its extracted pages
pub fn finalize(exposition: &mut Exposition) {
    collect_hyperlinks(exposition);
    collect_text(exposition);
    collect_text_urls(exposition);
}

/// Unions every page's category buckets into the exposition map
fn collect_hyperlinks(exposition: &mut Exposition) {
    for page in exposition.pages.values() {
        let Some(links) = page.hyperlinks.as_ref() else {
            continue;
        };
        for (category, urls) in links {
            exposition
                .hyperlinks
                .entry(*category)
                .or_default()
                .extend(urls.iter().cloned());
        }
    }
}

/// Concatenates the plain text of all text tools, in page order
fn collect_text(exposition: &mut Exposition) {
    let mut content = String::new();

    for page in exposition.pages.values() {
        let Some(tools) = page.tools.as_ref() else {
            continue;
        };
        for (kind, tool_list) in tools {
            if !kind.is_text() {
                continue;
            }
            for tool in tool_list {
                if let ToolDetail::Text { text } = &tool.detail {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(trimmed);
                }
            }
        }
    }

    exposition.text.charcount = content.chars().count();
    exposition.text.wordcount = content.split_whitespace().count();
    exposition.text.content = content;
}

/// Sweeps the concatenated text for bare URLs
fn collect_text_urls(exposition: &mut Exposition) {
    let Ok(url_re) = Regex::new(URL_PATTERN) else {
        return;
    };

    let found: BTreeSet<String> = url_re
        .find_iter(&exposition.text.content)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')']).to_string())
        .collect();

    if !found.is_empty() {
        exposition
            .hyperlinks
            .entry(LinkCategory::InText)
            .or_default()
            .extend(found);
    }
}
