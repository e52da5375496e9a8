//! Deduplicated reference numbering
//!
//! Reference numbers are the 1-based ordinals shown to readers in place of raw
//! citation ids. Only papers are deduplicated (same normalized title and first
//! author); every other citation gets its own number.

use crate::ids;
use crate::types::{CitationRecord, Paper, ToolType};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Citation id (and `<id>-<n>` per paper) to reference number
pub type RefNumberMap = BTreeMap<String, usize>;

/// Key deciding whether two citations point at the same source
///
/// `paper` selects one paper of a paper-search citation; without it the
/// record's top-level paper fields are used.
pub fn dedup_key(citation: &CitationRecord, paper: Option<&Paper>) -> String {
    if citation.tool_type == ToolType::PaperSearch {
        if let Some(paper) = paper.or_else(|| citation.primary_paper()) {
            let title = paper.title.trim().to_lowercase();
            let first_author = paper.first_author().to_lowercase();
            if !title.is_empty() {
                return format!("paper:{}|{}", title, first_author);
            }
        }
    }
    format!("unique:{}", citation.citation_id)
}

/// Synthetic map key for the `index`-th (0-based) paper of a citation
pub fn paper_ref_key(citation_id: &str, index: usize) -> String {
    format!("{}-{}", citation_id, index + 1)
}

/// Split a [`paper_ref_key`] back into citation id and 0-based paper index
pub fn split_paper_ref_key(key: &str) -> Option<(&str, usize)> {
    let (citation_id, n) = key.rsplit_once('-')?;
    let n: usize = n.parse().ok()?;
    Some((citation_id, n.checked_sub(1)?))
}

/// Build the reference-number map for a set of citations
///
/// Pure: depends only on the citations passed in, so rebuilding is always safe.
pub fn build_ref_number_map<'a, I>(citations: I) -> RefNumberMap
where
    I: IntoIterator<Item = (&'a String, &'a CitationRecord)>,
{
    let mut sorted: Vec<(&String, &CitationRecord)> = citations.into_iter().collect();
    sorted.sort_by(|(a, _), (b, _)| {
        ids::sort_key(a)
            .cmp(&ids::sort_key(b))
            .then_with(|| a.cmp(b))
    });

    let mut numbering = Numbering::default();
    let mut map = RefNumberMap::new();

    for (citation_id, citation) in sorted {
        let papers = citation.papers();
        if citation.tool_type == ToolType::PaperSearch && !papers.is_empty() {
            for (index, paper) in papers.iter().enumerate() {
                let number = numbering.assign(dedup_key(citation, Some(paper)));
                if index == 0 {
                    map.insert(citation_id.clone(), number);
                }
                map.insert(paper_ref_key(citation_id, index), number);
            }
        } else {
            let number = numbering.assign(dedup_key(citation, None));
            map.insert(citation_id.clone(), number);
        }
    }

    debug!(
        "Built reference map: {} keys, {} distinct sources",
        map.len(),
        numbering.next
    );
    map
}

#[derive(Default)]
struct Numbering {
    seen: HashMap<String, usize>,
    next: usize,
}

impl Numbering {
    fn assign(&mut self, key: String) -> usize {
        if let Some(&number) = self.seen.get(&key) {
            return number;
        }
        self.next += 1;
        self.seen.insert(key, self.next);
        self.next
    }
}
