//! One-line rendering of citations for the final report

use crate::types::lenient::scalar_text;
use crate::types::{CitationRecord, Paper, Payload};

/// Sources or URLs listed after a RAG / web citation
const LISTED_SOURCES: usize = 3;

/// Render a citation as a reference-list line
///
/// Paper citations come out academic style,
/// `Author (Year) "Title" arXiv:ID <url> [+N more papers]`; RAG and web
/// citations name their query plus the first few sources. `None` when a paper
/// citation carries nothing to show.
pub fn format_citation(citation: &CitationRecord) -> Option<String> {
    match &citation.payload {
        Payload::Paper { papers, primary } => {
            let mut parts = primary.as_ref().map(paper_parts).unwrap_or_default();
            if papers.len() > 1 {
                parts.push(format!("[+{} more papers]", papers.len() - 1));
            }
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        Payload::Rag { kb_name, sources } => {
            let mut parts = vec![format!(
                "{}: {}",
                citation.tool_type.display_name(),
                citation.query
            )];
            if let Some(kb_name) = kb_name.as_deref().filter(|name| !name.is_empty()) {
                parts.push(format!("[KB: {}]", kb_name));
            }
            let titles: Vec<&str> = sources
                .iter()
                .take(LISTED_SOURCES)
                .map(|s| {
                    if s.title.is_empty() {
                        s.source_file.as_str()
                    } else {
                        s.title.as_str()
                    }
                })
                .filter(|t| !t.is_empty())
                .collect();
            if !titles.is_empty() {
                parts.push(format!("[Sources: {}]", titles.join(", ")));
            }
            Some(parts.join(" "))
        }
        Payload::Web { web_sources } => {
            let mut parts = vec![format!("Web Search: {}", citation.query)];
            let urls: Vec<&str> = web_sources
                .iter()
                .take(LISTED_SOURCES)
                .map(|s| s.url.as_str())
                .filter(|u| !u.is_empty())
                .collect();
            if !urls.is_empty() {
                parts.push(format!("[URLs: {}]", urls.join(", ")));
            }
            Some(parts.join(" "))
        }
        Payload::Plain => Some(format!(
            "{}: {}",
            citation.tool_type.display_name(),
            citation.query
        )),
    }
}

/// Render the `index`-th (0-based) paper of a paper-search citation
pub fn format_paper(citation: &CitationRecord, index: usize) -> Option<String> {
    let parts = paper_parts(citation.papers().get(index)?);
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn paper_parts(paper: &Paper) -> Vec<String> {
    let mut parts = Vec::new();
    if !paper.authors.is_empty() {
        parts.push(paper.authors.clone());
    }
    let year = scalar_text(&paper.year);
    if !year.is_empty() {
        parts.push(format!("({})", year));
    }
    if !paper.title.is_empty() {
        parts.push(format!("\"{}\"", paper.title));
    }
    if !paper.arxiv_id.is_empty() {
        parts.push(format!("arXiv:{}", paper.arxiv_id));
    }
    if !paper.url.is_empty() {
        parts.push(format!("<{}>", paper.url));
    }
    parts
}
