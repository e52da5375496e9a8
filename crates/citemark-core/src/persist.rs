//! On-disk citation document
//!
//! One pretty-printed JSON file per research session:
//!
//! ```json
//! {
//!   "research_id": "...",
//!   "updated_at": "2025-01-01T12:00:00.000000",
//!   "citations": { "CIT-1-01": { ... } },
//!   "counters": { "plan_counter": 2, "block_counters": { "1": 1 } }
//! }
//! ```
//!
//! Records are decoded one at a time. A record this version cannot read is
//! kept as raw JSON and written back unchanged, so one bad entry never costs
//! the rest of the session.
//!
//! Writes go to a sibling temp file that is then renamed over the target, so
//! a crash mid-write leaves the previous document intact.

use crate::ids::Counters;
use crate::types::{lenient, CitationRecord};
use crate::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Full persisted document
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CitationDocument {
    #[serde(default, deserialize_with = "lenient::string")]
    pub research_id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub updated_at: String,
    #[serde(default)]
    pub citations: BTreeMap<String, CitationRecord>,
    /// Absent in documents written before counters were persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counters: Option<Counters>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Records that failed to decode, kept verbatim
    #[serde(skip)]
    pub unreadable: BTreeMap<String, Value>,
}

impl CitationDocument {
    /// Decode a document, setting aside records and counters of the wrong shape
    pub fn from_json(content: &str) -> Result<Self> {
        let mut root: Value = serde_json::from_str(content)?;
        let (citations, counters) = match root.as_object_mut() {
            Some(object) => (object.remove("citations"), object.remove("counters")),
            None => (None, None),
        };
        let mut document: CitationDocument = serde_json::from_value(root)?;

        if let Some(value) = counters {
            match serde_json::from_value::<Option<Counters>>(value) {
                Ok(counters) => document.counters = counters,
                Err(e) => warn!("Ignoring unreadable counters, rebuilding from ids: {}", e),
            }
        }

        match citations {
            Some(Value::Object(entries)) => {
                for (citation_id, value) in entries {
                    match serde_json::from_value::<CitationRecord>(value.clone()) {
                        Ok(record) => {
                            document.citations.insert(citation_id, record);
                        }
                        Err(e) => {
                            warn!("Keeping unreadable citation {} as-is: {}", citation_id, e);
                            document.unreadable.insert(citation_id, value);
                        }
                    }
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => warn!("Ignoring citations that are not an object: {}", other),
        }

        Ok(document)
    }

    /// Counters to resume from: the saved ones if present, otherwise rebuilt
    /// from the stored ids. Either way never below an id already on disk.
    pub fn resume_counters(&self) -> Counters {
        let ids = self
            .citations
            .keys()
            .chain(self.unreadable.keys())
            .map(String::as_str);
        match &self.counters {
            Some(saved) => {
                let mut counters = saved.clone();
                counters.raise_to(ids);
                counters
            }
            None => Counters::from_ids(ids),
        }
    }
}

/// Borrowed view of the store used for saving
#[derive(Serialize)]
pub(crate) struct DocumentRef<'a> {
    pub research_id: &'a str,
    pub updated_at: String,
    pub citations: CitationTable<'a>,
    pub counters: &'a Counters,
    #[serde(flatten)]
    pub extra: &'a Map<String, Value>,
}

impl DocumentRef<'_> {
    /// Encode as pretty JSON, stamping `updated_at` with the current local time
    pub fn encode(mut self) -> Result<Vec<u8>> {
        self.updated_at = now_iso();
        Ok(serde_json::to_vec_pretty(&self)?)
    }
}

/// Decoded and unreadable records, saved as one id-ordered map
pub(crate) struct CitationTable<'a> {
    pub records: &'a BTreeMap<String, CitationRecord>,
    pub unreadable: &'a BTreeMap<String, Value>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredEntry<'a> {
    Record(&'a CitationRecord),
    Raw(&'a Value),
}

impl Serialize for CitationTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut entries: BTreeMap<&str, StoredEntry<'_>> = self
            .unreadable
            .iter()
            .map(|(id, value)| (id.as_str(), StoredEntry::Raw(value)))
            .collect();
        // A decoded record replaces an unreadable one with the same id
        entries.extend(
            self.records
                .iter()
                .map(|(id, record)| (id.as_str(), StoredEntry::Record(record))),
        );
        serializer.collect_map(entries)
    }
}

/// Read a citation document; `Ok(None)` when the file does not exist
pub fn load(path: &Path) -> Result<Option<CitationDocument>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let document = CitationDocument::from_json(&content)?;
    debug!(
        "Loaded {} citations from {} ({} unreadable)",
        document.citations.len(),
        path.display(),
        document.unreadable.len()
    );
    Ok(Some(document))
}

/// Write encoded bytes to `path` via a temp file and rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    debug!("Saved citation document: {}", path.display());
    Ok(())
}

/// Async counterpart of [`write_atomic`]
pub async fn write_atomic_async(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!("Saved citation document: {}", path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Local time in the ISO form used for `updated_at` and trace timestamps
pub fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}
