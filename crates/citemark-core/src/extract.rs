//! Payload extraction from raw tool answers
//!
//! Tool answers arrive as JSON strings whose shape depends on the upstream
//! tool and has drifted over time. Each family has an ordered list of field
//! names to look for; the first one present wins. Anything unparseable
//! degrades to an empty payload instead of failing.

use crate::types::lenient::scalar_text;
use crate::types::{Paper, Payload, RagSource, ToolType, WebSource};
use serde_json::{Map, Value};
use tracing::warn;

/// Where RAG answers keep their retrieved documents
pub const RAG_SOURCE_FIELDS: &[&str] = &[
    "chunks",
    "documents",
    "sources",
    "context",
    "retrieved_docs",
];

/// Where web-search answers keep their results
pub const WEB_RESULT_FIELDS: &[&str] = &["results", "web_results", "search_results", "urls"];

/// Where paper-search answers keep their papers
pub const PAPER_FIELDS: &[&str] = &["papers"];

// Per-item aliases, most specific first
const DOC_TITLE: &[&str] = &["title", "doc_title"];
const DOC_CONTENT: &[&str] = &["content", "text"];
const DOC_SOURCE_FILE: &[&str] = &["source", "file_path", "filename"];
const DOC_PAGE: &[&str] = &["page", "page_number"];
const DOC_CHUNK_ID: &[&str] = &["chunk_id", "id"];
const DOC_SCORE: &[&str] = &["score", "similarity"];
const WEB_URL: &[&str] = &["url", "link"];
const WEB_SNIPPET: &[&str] = &["snippet", "description"];
const PAPER_VENUE: &[&str] = &["venue", "journal"];

/// Sources kept per citation
pub const MAX_SOURCES: usize = 5;
/// Characters kept from a chunk's content
pub const CONTENT_PREVIEW_CHARS: usize = 200;
/// Characters kept from a web snippet
pub const SNIPPET_CHARS: usize = 200;
/// Characters kept from a paper abstract
pub const ABSTRACT_CHARS: usize = 300;
/// Authors named before "et al."
pub const MAX_DISPLAY_AUTHORS: usize = 3;

/// Build the tool-specific payload for a citation
pub fn extract_payload(tool_type: &ToolType, raw_answer: &str) -> Payload {
    match tool_type {
        t if t.is_rag() => rag_payload(parse_answer(raw_answer, t).as_ref()),
        ToolType::WebSearch => web_payload(parse_answer(raw_answer, tool_type).as_ref()),
        ToolType::PaperSearch => paper_payload(parse_answer(raw_answer, tool_type).as_ref()),
        _ => Payload::Plain,
    }
}

/// Parse a raw answer into a JSON object, logging why when that fails
fn parse_answer(raw_answer: &str, tool_type: &ToolType) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw_answer) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!(
                "Answer for {} is not a JSON object (got {}), keeping basic citation info",
                tool_type,
                json_kind(&other)
            );
            None
        }
        Err(e) => {
            warn!(
                "Failed to parse {} answer, keeping basic citation info: {}",
                tool_type, e
            );
            None
        }
    }
}

/// RAG payload: knowledge base name plus up to five retrieved chunks
pub fn rag_payload(answer: Option<&Map<String, Value>>) -> Payload {
    let Some(answer) = answer else {
        return Payload::Rag {
            kb_name: None,
            sources: Vec::new(),
        };
    };

    let sources = first_list(answer, RAG_SOURCE_FIELDS)
        .iter()
        .take(MAX_SOURCES)
        .enumerate()
        .filter_map(|(i, doc)| match doc {
            Value::Object(doc) => Some(RagSource {
                title: text(doc, DOC_TITLE),
                content_preview: truncate(&text(doc, DOC_CONTENT), CONTENT_PREVIEW_CHARS),
                source_file: text(doc, DOC_SOURCE_FILE),
                page: value(doc, DOC_PAGE).unwrap_or(Value::Null),
                chunk_id: value(doc, DOC_CHUNK_ID).unwrap_or_else(|| Value::from(i)),
                score: value(doc, DOC_SCORE).unwrap_or(Value::Null),
            }),
            Value::String(content) => Some(RagSource {
                content_preview: truncate(content, CONTENT_PREVIEW_CHARS),
                ..RagSource::default()
            }),
            _ => None,
        })
        .collect();

    Payload::Rag {
        kb_name: Some(text(answer, &["kb_name"])),
        sources,
    }
}

/// Web payload: up to five results, each with a URL
pub fn web_payload(answer: Option<&Map<String, Value>>) -> Payload {
    let web_sources = answer
        .map(|answer| {
            first_list(answer, WEB_RESULT_FIELDS)
                .iter()
                .take(MAX_SOURCES)
                .filter_map(|result| match result {
                    Value::Object(result) => Some(WebSource {
                        title: text(result, &["title"]),
                        url: text(result, WEB_URL),
                        snippet: truncate(&text(result, WEB_SNIPPET), SNIPPET_CHARS),
                        domain: text(result, &["domain"]),
                    }),
                    // Bare URL lists
                    Value::String(url) => Some(WebSource {
                        url: url.clone(),
                        ..WebSource::default()
                    }),
                    _ => None,
                })
                .filter(|source| !source.url.trim().is_empty())
                .collect()
        })
        .unwrap_or_default();

    Payload::Web { web_sources }
}

/// Paper payload: up to five papers, the first mirrored as primary
pub fn paper_payload(answer: Option<&Map<String, Value>>) -> Payload {
    let papers: Vec<Paper> = answer
        .map(|answer| {
            first_list(answer, PAPER_FIELDS)
                .iter()
                .take(MAX_SOURCES)
                .filter_map(Value::as_object)
                .map(paper_from)
                .collect()
        })
        .unwrap_or_default();

    let primary = papers.first().cloned();
    Payload::Paper { papers, primary }
}

fn paper_from(paper: &Map<String, Value>) -> Paper {
    let authors_list = author_names(paper.get("authors"));
    Paper {
        title: text(paper, &["title"]),
        authors: display_authors(&authors_list),
        authors_list,
        year: value(paper, &["year"]).unwrap_or(Value::Null),
        url: text(paper, &["url"]),
        arxiv_id: text(paper, &["arxiv_id"]),
        abstract_text: truncate(&text(paper, &["abstract"]), ABSTRACT_CHARS),
        doi: text(paper, &["doi"]),
        venue: text(paper, PAPER_VENUE),
    }
}

/// Author names from a list of strings or `{ "name": .. }` objects
fn author_names(authors: Option<&Value>) -> Vec<String> {
    match authors {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.clone()),
                Value::Object(obj) => obj.get("name").map(scalar_text),
                _ => None,
            })
            .filter(|name| !name.trim().is_empty())
            .collect(),
        Some(Value::String(name)) if !name.trim().is_empty() => vec![name.clone()],
        _ => Vec::new(),
    }
}

/// "A, B, C et al." style author line
pub fn display_authors(authors: &[String]) -> String {
    let mut line = authors
        .iter()
        .take(MAX_DISPLAY_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > MAX_DISPLAY_AUTHORS {
        line.push_str(" et al.");
    }
    line
}

/// The list under the first alias present; empty if that value is not a list
fn first_list<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> &'a [Value] {
    aliases
        .iter()
        .find_map(|field| obj.get(*field))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// First non-null value among the aliases
fn value(obj: &Map<String, Value>, aliases: &[&str]) -> Option<Value> {
    aliases
        .iter()
        .filter_map(|field| obj.get(*field))
        .find(|v| !v.is_null())
        .cloned()
}

/// First non-null value among the aliases, as text
fn text(obj: &Map<String, Value>, aliases: &[&str]) -> String {
    value(obj, aliases)
        .map(|v| scalar_text(&v))
        .unwrap_or_default()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
