//! Citation record types
//!
//! A [`CitationRecord`] is held in memory as a tool-specific [`Payload`] but
//! persisted as one flat JSON object, the shape downstream report renderers
//! already read. [`RecordWire`] is that flat shape.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

/// Tool that produced the evidence behind a citation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolType {
    /// Naive vector RAG over a knowledge base
    RagNaive,
    /// Hybrid (graph + vector) RAG
    RagHybrid,
    /// Direct knowledge-base item lookup
    QueryItem,
    /// Web search provider
    WebSearch,
    /// Academic paper search
    PaperSearch,
    /// Code execution
    RunCode,
    /// Anything else; keeps the identifier exactly as received
    Other(String),
}

impl ToolType {
    /// Parse a tool identifier (case-insensitive); never fails
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "rag_naive" => ToolType::RagNaive,
            "rag_hybrid" => ToolType::RagHybrid,
            "query_item" => ToolType::QueryItem,
            "web_search" => ToolType::WebSearch,
            "paper_search" => ToolType::PaperSearch,
            "run_code" => ToolType::RunCode,
            _ => ToolType::Other(s.to_string()),
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &str {
        match self {
            ToolType::RagNaive => "rag_naive",
            ToolType::RagHybrid => "rag_hybrid",
            ToolType::QueryItem => "query_item",
            ToolType::WebSearch => "web_search",
            ToolType::PaperSearch => "paper_search",
            ToolType::RunCode => "run_code",
            ToolType::Other(raw) => raw,
        }
    }

    /// True for the knowledge-base retrieval tools
    pub fn is_rag(&self) -> bool {
        matches!(
            self,
            ToolType::RagNaive | ToolType::RagHybrid | ToolType::QueryItem
        )
    }

    /// Label used when rendering a citation for a report
    ///
    /// Unrecognized tools are shown by their lower-cased identifier.
    pub fn display_name(&self) -> Cow<'_, str> {
        match self {
            ToolType::RagNaive => Cow::Borrowed("RAG Retrieval"),
            ToolType::RagHybrid => Cow::Borrowed("Hybrid RAG Retrieval"),
            ToolType::QueryItem => Cow::Borrowed("Knowledge Base Query"),
            ToolType::WebSearch => Cow::Borrowed("Web Search"),
            ToolType::PaperSearch => Cow::Borrowed("Paper Search"),
            ToolType::RunCode => Cow::Borrowed("Code Execution"),
            ToolType::Other(raw) => Cow::Owned(raw.trim().to_lowercase()),
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for ToolType {
    fn from(s: String) -> Self {
        ToolType::parse(&s)
    }
}

impl From<ToolType> for String {
    fn from(tool_type: ToolType) -> Self {
        tool_type.as_str().to_string()
    }
}

impl Serialize for ToolType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::string(deserializer).map(|s| ToolType::parse(&s))
    }
}

/// The tool invocation a citation is attached to
///
/// Supplied by the research pipeline; the store only reads it.
pub trait ToolTrace {
    /// Query or content the tool was called with
    fn query(&self) -> &str;
    /// Short description of what the call found
    fn summary(&self) -> &str;
    /// ISO-8601 time of the call
    fn timestamp(&self) -> &str;
}

/// Owned [`ToolTrace`] for callers without their own trace type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub query: String,
    pub summary: String,
    pub timestamp: String,
}

impl TraceRecord {
    /// Create a trace stamped with the current local time
    pub fn new(query: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            summary: summary.into(),
            timestamp: crate::persist::now_iso(),
        }
    }

    /// Replace the timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

impl ToolTrace for TraceRecord {
    fn query(&self) -> &str {
        &self.query
    }

    fn summary(&self) -> &str {
        &self.summary
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// One retrieved chunk backing a RAG citation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RagSource {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub content_preview: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub source_file: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub page: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub chunk_id: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub score: Value,
}

/// One web result backing a web-search citation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WebSource {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub snippet: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub domain: String,
}

/// One paper backing a paper-search citation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Paper {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    /// Display form: at most three names, then "et al."
    #[serde(default, deserialize_with = "lenient::string")]
    pub authors: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub authors_list: Vec<String>,
    #[serde(default)]
    pub year: Value,
    #[serde(default, deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub arxiv_id: String,
    #[serde(rename = "abstract", default, deserialize_with = "lenient::string")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub doi: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub venue: String,
}

impl Paper {
    /// First author taken from the display string
    pub fn first_author(&self) -> &str {
        self.authors.split(',').next().unwrap_or("").trim()
    }
}

/// Tool-specific part of a citation
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// RAG family; `kb_name` is absent when the answer could not be parsed
    Rag {
        kb_name: Option<String>,
        sources: Vec<RagSource>,
    },
    /// Web search
    Web { web_sources: Vec<WebSource> },
    /// Paper search; `primary` mirrors the first paper at the top level
    Paper {
        papers: Vec<Paper>,
        primary: Option<Paper>,
    },
    /// Code execution and unrecognized tools
    #[default]
    Plain,
}

/// One stored citation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordWire", into = "RecordWire")]
pub struct CitationRecord {
    pub citation_id: String,
    pub tool_type: ToolType,
    pub query: String,
    pub summary: String,
    pub timestamp: String,
    pub payload: Payload,
    /// Keys this version does not know about, kept for the next save
    pub extra: Map<String, Value>,
}

impl CitationRecord {
    /// Record with only the common fields populated
    pub fn from_trace<T: ToolTrace + ?Sized>(
        citation_id: impl Into<String>,
        tool_type: ToolType,
        trace: &T,
    ) -> Self {
        Self {
            citation_id: citation_id.into(),
            tool_type,
            query: trace.query().to_string(),
            summary: trace.summary().to_string(),
            timestamp: trace.timestamp().to_string(),
            payload: Payload::Plain,
            extra: Map::new(),
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Papers of a paper-search citation (empty otherwise)
    pub fn papers(&self) -> &[Paper] {
        match &self.payload {
            Payload::Paper { papers, .. } => papers,
            _ => &[],
        }
    }

    /// Top-level paper fields of a paper-search citation
    pub fn primary_paper(&self) -> Option<&Paper> {
        match &self.payload {
            Payload::Paper { primary, .. } => primary.as_ref(),
            _ => None,
        }
    }

    /// Retrieved chunks of a RAG citation (empty otherwise)
    pub fn rag_sources(&self) -> &[RagSource] {
        match &self.payload {
            Payload::Rag { sources, .. } => sources,
            _ => &[],
        }
    }

    /// Web results of a web-search citation (empty otherwise)
    pub fn web_sources(&self) -> &[WebSource] {
        match &self.payload {
            Payload::Web { web_sources } => web_sources,
            _ => &[],
        }
    }

    /// Knowledge base name of a RAG citation
    pub fn kb_name(&self) -> Option<&str> {
        match &self.payload {
            Payload::Rag { kb_name, .. } => kb_name.as_deref(),
            _ => None,
        }
    }
}

impl JsonSchema for CitationRecord {
    fn schema_name() -> String {
        "CitationRecord".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        RecordWire::json_schema(gen)
    }
}

/// Flat on-disk shape of a [`CitationRecord`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecordWire {
    #[serde(default, deserialize_with = "lenient::string")]
    pub citation_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tool_type: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub query: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub timestamp: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub kb_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<RagSource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_sources: Option<Vec<WebSource>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_sources: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub papers: Option<Vec<Paper>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_papers: Option<Value>,

    // First paper mirrored at the top level
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors_list: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub arxiv_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordWire {
    fn has_primary_fields(&self) -> bool {
        self.title.is_some()
            || self.authors.is_some()
            || self.authors_list.is_some()
            || self.year.is_some()
            || self.url.is_some()
            || self.arxiv_id.is_some()
    }
}

impl From<RecordWire> for CitationRecord {
    fn from(mut wire: RecordWire) -> Self {
        let tool_type = ToolType::parse(&wire.tool_type);

        let payload = if tool_type.is_rag() {
            wire.total_sources = None;
            Payload::Rag {
                kb_name: wire.kb_name.take(),
                sources: wire.sources.take().unwrap_or_default(),
            }
        } else if tool_type == ToolType::WebSearch {
            wire.total_sources = None;
            Payload::Web {
                web_sources: wire.web_sources.take().unwrap_or_default(),
            }
        } else if tool_type == ToolType::PaperSearch {
            wire.total_papers = None;
            let primary = wire.has_primary_fields().then(|| Paper {
                title: wire.title.take().unwrap_or_default(),
                authors: wire.authors.take().unwrap_or_default(),
                authors_list: wire
                    .authors_list
                    .take()
                    .unwrap_or_default()
                    .iter()
                    .map(lenient::scalar_text)
                    .collect(),
                year: wire.year.take().unwrap_or(Value::Null),
                url: wire.url.take().unwrap_or_default(),
                arxiv_id: wire.arxiv_id.take().unwrap_or_default(),
                ..Paper::default()
            });
            Payload::Paper {
                papers: wire.papers.take().unwrap_or_default(),
                primary,
            }
        } else {
            Payload::Plain
        };

        // Fields the payload did not claim go back out on save untouched
        let mut extra = std::mem::take(&mut wire.extra);
        stash(&mut extra, "kb_name", wire.kb_name.take());
        stash(&mut extra, "sources", wire.sources.take());
        stash(&mut extra, "web_sources", wire.web_sources.take());
        stash(&mut extra, "total_sources", wire.total_sources.take());
        stash(&mut extra, "papers", wire.papers.take());
        stash(&mut extra, "total_papers", wire.total_papers.take());
        stash(&mut extra, "title", wire.title.take());
        stash(&mut extra, "authors", wire.authors.take());
        stash(&mut extra, "authors_list", wire.authors_list.take());
        stash(&mut extra, "year", wire.year.take());
        stash(&mut extra, "url", wire.url.take());
        stash(&mut extra, "arxiv_id", wire.arxiv_id.take());

        Self {
            citation_id: wire.citation_id,
            tool_type,
            query: wire.query,
            summary: wire.summary,
            timestamp: wire.timestamp,
            payload,
            extra,
        }
    }
}

fn stash<T: Serialize>(extra: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value.and_then(|v| serde_json::to_value(v).ok()) {
        extra.insert(key.to_string(), value);
    }
}

impl From<CitationRecord> for RecordWire {
    fn from(record: CitationRecord) -> Self {
        let mut wire = RecordWire {
            citation_id: record.citation_id,
            tool_type: record.tool_type.into(),
            query: record.query,
            summary: record.summary,
            timestamp: record.timestamp,
            extra: record.extra,
            ..RecordWire::default()
        };

        match record.payload {
            Payload::Rag { kb_name, sources } => {
                wire.kb_name = kb_name;
                wire.total_sources = Some(Value::from(sources.len()));
                wire.sources = Some(sources);
            }
            Payload::Web { web_sources } => {
                wire.total_sources = Some(Value::from(web_sources.len()));
                wire.web_sources = Some(web_sources);
            }
            Payload::Paper { papers, primary } => {
                if !papers.is_empty() {
                    wire.total_papers = Some(Value::from(papers.len()));
                }
                if let Some(primary) = primary {
                    wire.title = Some(primary.title);
                    wire.authors = Some(primary.authors);
                    wire.authors_list =
                        Some(primary.authors_list.into_iter().map(Value::from).collect());
                    wire.year = Some(primary.year);
                    wire.url = Some(primary.url);
                    wire.arxiv_id = Some(primary.arxiv_id);
                }
                wire.papers = Some(papers);
            }
            Payload::Plain => {}
        }

        wire
    }
}

/// Deserializers that accept any JSON scalar where text is expected
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Text form of a JSON value; null becomes empty
    pub fn scalar_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(&Value::deserialize(deserializer)?))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            other => Ok(Some(scalar_text(&other))),
        }
    }

    pub fn string_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => Ok(items.iter().map(scalar_text).collect()),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trace() -> TraceRecord {
        TraceRecord::new("what is RAG", "overview").with_timestamp("2025-01-01T00:00:00")
    }

    #[test]
    fn test_tool_type_conversion() {
        assert_eq!(ToolType::parse("RAG_HYBRID"), ToolType::RagHybrid);
        assert_eq!(ToolType::parse("web_search"), ToolType::WebSearch);
        assert_eq!(
            ToolType::parse("Calculator"),
            ToolType::Other("Calculator".to_string())
        );
        assert_eq!(ToolType::Other("Calculator".into()).as_str(), "Calculator");
        assert!(ToolType::QueryItem.is_rag());
        assert!(!ToolType::RunCode.is_rag());
        assert_eq!(ToolType::RunCode.display_name(), "Code Execution");
        assert_eq!(ToolType::parse("Calculator").display_name(), "calculator");
    }

    #[test]
    fn test_plain_record_serializes_common_fields_only() {
        let record = CitationRecord::from_trace("CIT-1-01", ToolType::RunCode, &trace());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "citation_id": "CIT-1-01",
                "tool_type": "run_code",
                "query": "what is RAG",
                "summary": "overview",
                "timestamp": "2025-01-01T00:00:00",
            })
        );
    }

    #[test]
    fn test_paper_record_mirrors_primary_fields() {
        let paper = Paper {
            title: "Attention Is All You Need".into(),
            authors: "Vaswani, Shazeer".into(),
            authors_list: vec!["Vaswani".into(), "Shazeer".into()],
            year: json!(2017),
            ..Paper::default()
        };
        let record = CitationRecord::from_trace("CIT-1-01", ToolType::PaperSearch, &trace())
            .with_payload(Payload::Paper {
                papers: vec![paper.clone()],
                primary: Some(paper),
            });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["title"], "Attention Is All You Need");
        assert_eq!(value["year"], 2017);
        assert_eq!(value["total_papers"], 1);
        assert_eq!(value["papers"][0]["authors"], "Vaswani, Shazeer");

        let parsed: CitationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_unknown_keys_survive() {
        let value = json!({
            "citation_id": "PLAN-01",
            "tool_type": "calculator",
            "query": 42,
            "summary": null,
            "timestamp": "t",
            "confidence": 0.9,
        });
        let record: CitationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.query, "42");
        assert_eq!(record.summary, "");
        assert_eq!(record.tool_type, ToolType::Other("calculator".into()));
        assert_eq!(record.extra["confidence"], json!(0.9));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["confidence"], json!(0.9));
    }

    #[test]
    fn test_legacy_paper_without_list_keeps_primary() {
        let value = json!({
            "citation_id": "CIT-2-01",
            "tool_type": "paper_search",
            "query": "q",
            "summary": "s",
            "timestamp": "t",
            "title": "Deep Residual Learning",
            "authors": "He, Zhang",
        });
        let record: CitationRecord = serde_json::from_value(value).unwrap();
        assert!(record.papers().is_empty());
        let primary = record.primary_paper().unwrap();
        assert_eq!(primary.first_author(), "He");
    }

    #[test]
    fn test_fields_of_other_families_are_kept() {
        let value = json!({
            "citation_id": "CIT-1-01",
            "tool_type": "run_code",
            "query": "q",
            "summary": "",
            "timestamp": "",
            "title": "notebook",
            "url": "https://example.com/run/1",
            "total_sources": 2,
        });
        let record: CitationRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.payload, Payload::Plain);
        assert_eq!(record.extra["title"], "notebook");

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_web_record_keeps_paper_fields() {
        let value = json!({
            "citation_id": "CIT-1-02",
            "tool_type": "web_search",
            "query": "q",
            "summary": "",
            "timestamp": "",
            "web_sources": [],
            "kb_name": "legacy",
            "year": 2020,
        });
        let record: CitationRecord = serde_json::from_value(value).unwrap();
        assert!(record.web_sources().is_empty());

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["kb_name"], "legacy");
        assert_eq!(back["year"], 2020);
        assert_eq!(back["total_sources"], 0);
    }
}
