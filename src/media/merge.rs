//! Copyright merger
//!
//! Joins the attribution records fetched from the meta page onto the
//! extracted tools of an exposition. A tool matches the copyright entry
//! whose id list contains the tool's id; the entry's attributes merge
//! into the tool and the tool's canonical reference comes from the
//! parallel position in the entry's ref list.
//!
//! Several tools can share one underlying medium (successive slideshow
//! frames, the same recording on two pages). Resolution work for a
//! medium runs once through a per-media cache and is reused for every
//! tool sharing it.

use crate::model::{CopyrightEntry, Page, Tool, ToolDetail};
use std::collections::{BTreeMap, HashMap};

/// Follow-on resolution for a matched medium
///
/// The production pipeline treats media download/storage as an external
/// collaborator; implementations return a local reference (a stored
/// path, a cache key) for the medium's source, or `None` when nothing is
/// resolved.
pub trait MediaResolver {
    fn resolve(&mut self, source: &str) -> Option<String>;
}

/// A resolver that performs no resolution
///
/// Used when media handling is disabled; the merge itself still runs.
pub struct NullResolver;

impl MediaResolver for NullResolver {
    fn resolve(&mut self, _source: &str) -> Option<String> {
        None
    }
}

/// Merges copyright entries into every tool of every page
///
/// # Arguments
///
/// * `pages` - The exposition's extracted pages, mutated in place
/// * `copyrights` - Attribution records from the meta page
/// * `resolver` - Follow-on resolution for matched media
pub fn merge_copyrights<R: MediaResolver>(
    pages: &mut BTreeMap<u64, Page>,
    copyrights: &[CopyrightEntry],
    resolver: &mut R,
) {
    // Cache keyed by entry index: one resolution per underlying medium
    let mut resolved: HashMap<usize, Option<String>> = HashMap::new();

    for page in pages.values_mut() {
        let Some(tools) = page.tools.as_mut() else {
            continue;
        };

        for tool_list in tools.values_mut() {
            for tool in tool_list {
                merge_into_tool(tool, copyrights, resolver, &mut resolved);
            }
        }
    }
}

fn merge_into_tool<R: MediaResolver>(
    tool: &mut Tool,
    copyrights: &[CopyrightEntry],
    resolver: &mut R,
    resolved: &mut HashMap<usize, Option<String>>,
) {
    for (entry_index, entry) in copyrights.iter().enumerate() {
        let Some(position) = entry.position_of(&tool.id) else {
            continue;
        };

        for (key, value) in &entry.attributes {
            tool.attribution.insert(key.clone(), value.clone());
        }
        tool.copyright_ref = entry.tool_refs.get(position).cloned();

        let path = resolved
            .entry(entry_index)
            .or_insert_with(|| tool.source().and_then(|src| resolver.resolve(src)))
            .clone();
        if let Some(path) = path {
            tool.attribution.insert("path".to_string(), path);
        }

        return;
    }
}

impl Tool {
    /// The tool's primary media source, if it has one
    pub fn source(&self) -> Option<&str> {
        match &self.detail {
            ToolDetail::Source { src } => src.as_deref(),
            ToolDetail::Video { src, .. } => src.as_deref(),
            ToolDetail::Slideshow { src } => src.first().map(String::as_str),
            ToolDetail::Text { .. } | ToolDetail::Plain {} => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageType, Placement, Rect, ToolKind};

    fn picture(id: &str, src: &str) -> Tool {
        Tool {
            id: id.to_string(),
            placement: Placement::absolute(Rect::new(0, 0, 10, 10)),
            raw_content: String::new(),
            last_modified_by: None,
            last_modified_at: None,
            detail: ToolDetail::Source {
                src: Some(src.to_string()),
            },
            copyright_ref: None,
            attribution: BTreeMap::new(),
        }
    }

    fn page_with(tools: Vec<Tool>) -> BTreeMap<u64, Page> {
        let mut page = Page::bare(1, PageType::Graphical);
        let mut map = BTreeMap::new();
        map.insert(ToolKind::Picture, tools);
        page.tools = Some(map);
        let mut pages = BTreeMap::new();
        pages.insert(1, page);
        pages
    }

    fn entry(ids: &[&str], refs: &[&str], license: &str) -> CopyrightEntry {
        let mut attributes = BTreeMap::new();
        attributes.insert("license".to_string(), license.to_string());
        CopyrightEntry {
            tool_ids: ids.iter().map(|s| s.to_string()).collect(),
            tool_refs: refs.iter().map(|s| s.to_string()).collect(),
            attributes,
        }
    }

    /// Resolver that counts invocations, to observe the per-media cache
    struct CountingResolver {
        calls: usize,
    }

    impl MediaResolver for CountingResolver {
        fn resolve(&mut self, source: &str) -> Option<String> {
            self.calls += 1;
            Some(format!("stored:{}", source))
        }
    }

    #[test]
    fn test_merge_sets_attributes_and_ref() {
        let mut pages = page_with(vec![picture("t1", "a.png")]);
        let copyrights = vec![entry(&["t1"], &["/view/9#t1"], "CC BY")];

        merge_copyrights(&mut pages, &copyrights, &mut NullResolver);

        let tool = &pages[&1].tools.as_ref().unwrap()[&ToolKind::Picture][0];
        assert_eq!(tool.copyright_ref.as_deref(), Some("/view/9#t1"));
        assert_eq!(
            tool.attribution.get("license").map(String::as_str),
            Some("CC BY")
        );
    }

    #[test]
    fn test_merge_uses_parallel_position() {
        let mut pages = page_with(vec![picture("t2", "b.png")]);
        let copyrights = vec![entry(&["t1", "t2"], &["/v#t1", "/v#t2"], "CC0")];

        merge_copyrights(&mut pages, &copyrights, &mut NullResolver);

        let tool = &pages[&1].tools.as_ref().unwrap()[&ToolKind::Picture][0];
        assert_eq!(tool.copyright_ref.as_deref(), Some("/v#t2"));
    }

    #[test]
    fn test_unmatched_tool_is_untouched() {
        let mut pages = page_with(vec![picture("lonely", "c.png")]);
        let copyrights = vec![entry(&["t1"], &["/v#t1"], "CC BY")];

        merge_copyrights(&mut pages, &copyrights, &mut NullResolver);

        let tool = &pages[&1].tools.as_ref().unwrap()[&ToolKind::Picture][0];
        assert!(tool.copyright_ref.is_none());
        assert!(tool.attribution.is_empty());
    }

    #[test]
    fn test_shared_medium_resolves_once() {
        // Two slideshow frames listed in one entry share one medium
        let mut pages = page_with(vec![picture("f1", "frames.png"), picture("f2", "frames.png")]);
        let copyrights = vec![entry(&["f1", "f2"], &["/v#f1", "/v#f2"], "CC BY")];

        let mut resolver = CountingResolver { calls: 0 };
        merge_copyrights(&mut pages, &copyrights, &mut resolver);

        assert_eq!(resolver.calls, 1);
        let tools = &pages[&1].tools.as_ref().unwrap()[&ToolKind::Picture];
        for tool in tools.iter() {
            assert_eq!(
                tool.attribution.get("path").map(String::as_str),
                Some("stored:frames.png")
            );
        }
    }
}
