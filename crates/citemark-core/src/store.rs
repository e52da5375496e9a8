//! Per-session citation store
//!
//! [`CitationStore`] is shared by every research worker of one session. Plain
//! methods are for a single caller; the `_async` variants take a session-wide
//! lock first, so concurrent workers never collide on an id and never
//! interleave writes to the citation file.

use crate::config::StoreConfig;
use crate::ids::{Counters, Stage};
use crate::markers::{self, ValidationReport};
use crate::persist::{self, CitationTable, DocumentRef};
use crate::refmap::{self, RefNumberMap};
use crate::types::{CitationRecord, ToolTrace, ToolType};
use crate::{extract, format, ids, Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Mutable session state guarded by one mutex
#[derive(Debug, Default)]
struct SessionState {
    citations: BTreeMap<String, CitationRecord>,
    counters: Counters,
    /// Unknown top-level document keys, written back on save
    extra: Map<String, Value>,
    /// Persisted records that could not be decoded, written back on save
    unreadable: BTreeMap<String, Value>,
}

impl SessionState {
    /// True if `citation_id` is on disk, readable or not
    fn knows(&self, citation_id: &str) -> bool {
        self.citations.contains_key(citation_id) || self.unreadable.contains_key(citation_id)
    }
}

/// Durable citation table for one research session
pub struct CitationStore {
    research_id: String,
    citations_file: PathBuf,
    auto_invalidate_refs: bool,
    state: Mutex<SessionState>,
    session_lock: tokio::sync::Mutex<()>,
    ref_numbers: RwLock<Option<Arc<RefNumberMap>>>,
}

impl CitationStore {
    /// Open the store for `research_id` under the configured cache root
    ///
    /// # Example
    ///
    /// ```no_run
    /// use citemark_core::{CitationStore, StoreConfig, TraceRecord};
    ///
    /// fn main() -> citemark_core::Result<()> {
    ///     let store = CitationStore::open("research-42", &StoreConfig::default())?;
    ///     let id = store.next_research_id("block_1");
    ///     let trace = TraceRecord::new("transformer scaling laws", "found 3 papers");
    ///     store.add_citation(&id, "paper_search", &trace, r#"{"papers": []}"#);
    ///     Ok(())
    /// }
    /// ```
    pub fn open(research_id: &str, config: &StoreConfig) -> Result<Self> {
        Self::open_at(
            research_id,
            config.session_dir(research_id),
            config.auto_invalidate_refs,
        )
    }

    /// Open the store with an explicit session directory
    pub fn open_in<P: AsRef<Path>>(research_id: &str, session_dir: P) -> Result<Self> {
        Self::open_at(
            research_id,
            session_dir.as_ref().to_path_buf(),
            StoreConfig::default().auto_invalidate_refs,
        )
    }

    fn open_at(
        research_id: &str,
        session_dir: PathBuf,
        auto_invalidate_refs: bool,
    ) -> Result<Self> {
        std::fs::create_dir_all(&session_dir)?;
        let citations_file = session_dir.join(crate::config::CITATIONS_FILE);

        let state = match persist::load(&citations_file) {
            Ok(Some(document)) => SessionState {
                counters: document.resume_counters(),
                citations: document.citations,
                extra: document.extra,
                unreadable: document.unreadable,
            },
            Ok(None) => SessionState::default(),
            Err(e) => {
                warn!(
                    "Failed to load citation file {}, starting empty: {}",
                    citations_file.display(),
                    e
                );
                SessionState::default()
            }
        };

        if !state.unreadable.is_empty() {
            warn!(
                "{} unreadable citations in {} kept as-is",
                state.unreadable.len(),
                citations_file.display()
            );
        }
        info!(
            "Opened citation store for {} ({} citations)",
            research_id,
            state.citations.len()
        );

        Ok(Self {
            research_id: research_id.to_string(),
            citations_file,
            auto_invalidate_refs,
            state: Mutex::new(state),
            session_lock: tokio::sync::Mutex::new(()),
            ref_numbers: RwLock::new(None),
        })
    }

    /// Research session this store belongs to
    pub fn research_id(&self) -> &str {
        &self.research_id
    }

    /// Path of the persisted citation document
    pub fn citations_file_path(&self) -> &Path {
        &self.citations_file
    }

    /// Number of stored citations
    pub fn len(&self) -> usize {
        self.state().citations.len()
    }

    /// True when no citation has been stored
    pub fn is_empty(&self) -> bool {
        self.state().citations.is_empty()
    }

    /// Last issued planning sequence number
    pub fn plan_counter(&self) -> u32 {
        self.state().counters.plan_counter
    }

    /// Last issued sequence number for a block id such as `block_3`
    pub fn block_counter(&self, block_id: &str) -> u32 {
        self.state().counters.block(ids::block_number(block_id))
    }

    // ========== Id generation ==========

    /// Issue the next `PLAN-<NN>` id
    pub fn next_plan_id(&self) -> String {
        let mut state = self.state();
        let id = state.counters.next_plan().to_string();
        self.flush_locked(&state);
        debug!("Issued planning citation id {}", id);
        id
    }

    /// Issue the next `CIT-<B>-<NN>` id for a block id such as `block_3`
    pub fn next_research_id(&self, block_id: &str) -> String {
        let mut state = self.state();
        let id = state.counters.next_research(block_id).to_string();
        self.flush_locked(&state);
        debug!("Issued research citation id {} for {}", id, block_id);
        id
    }

    /// Issue an id for `stage` (`planning` or `research`)
    ///
    /// Unknown stage names are treated as research.
    pub fn next_id(&self, stage: &str, block_id: &str) -> String {
        match parse_stage(stage) {
            Stage::Planning => self.next_plan_id(),
            Stage::Research => self.next_research_id(block_id),
        }
    }

    /// [`next_plan_id`](Self::next_plan_id) under the session lock
    pub async fn next_plan_id_async(&self) -> String {
        let _guard = self.session_lock.lock().await;
        let (id, encoded) = {
            let mut state = self.state();
            let id = state.counters.next_plan().to_string();
            (id, self.encode(&state))
        };
        self.flush_async(encoded).await;
        debug!("Issued planning citation id {}", id);
        id
    }

    /// [`next_research_id`](Self::next_research_id) under the session lock
    pub async fn next_research_id_async(&self, block_id: &str) -> String {
        let _guard = self.session_lock.lock().await;
        let (id, encoded) = {
            let mut state = self.state();
            let id = state.counters.next_research(block_id).to_string();
            (id, self.encode(&state))
        };
        self.flush_async(encoded).await;
        debug!("Issued research citation id {} for {}", id, block_id);
        id
    }

    /// [`next_id`](Self::next_id) under the session lock
    pub async fn next_id_async(&self, stage: &str, block_id: &str) -> String {
        match parse_stage(stage) {
            Stage::Planning => self.next_plan_id_async().await,
            Stage::Research => self.next_research_id_async(block_id).await,
        }
    }

    // ========== Citations ==========

    /// True if `citation_id` is stored
    pub fn exists(&self, citation_id: &str) -> bool {
        self.state().citations.contains_key(citation_id)
    }

    /// Copy of one stored citation
    pub fn get_citation(&self, citation_id: &str) -> Option<CitationRecord> {
        self.state().citations.get(citation_id).cloned()
    }

    /// Copy of one stored citation, or [`Error::NotFound`]
    pub fn require_citation(&self, citation_id: &str) -> Result<CitationRecord> {
        self.get_citation(citation_id)
            .ok_or_else(|| Error::NotFound(citation_id.to_string()))
    }

    /// Copy of every stored citation, in reference order
    pub fn get_all_citations(&self) -> Vec<CitationRecord> {
        let mut citations: Vec<CitationRecord> =
            self.state().citations.values().cloned().collect();
        citations.sort_by(|a, b| {
            ids::sort_key(&a.citation_id)
                .cmp(&ids::sort_key(&b.citation_id))
                .then_with(|| a.citation_id.cmp(&b.citation_id))
        });
        citations
    }

    /// Extract a citation from a tool answer, store it and persist the store
    ///
    /// A malformed `raw_answer` still stores the common fields. Returns
    /// `false` only when the store could not be persisted, in which case the
    /// citation is not added. Re-adding an existing id overwrites it. Counters
    /// are raised to cover `citation_id`, so later ids never reuse it.
    pub fn add_citation<T: ToolTrace + ?Sized>(
        &self,
        citation_id: &str,
        tool_type: &str,
        trace: &T,
        raw_answer: &str,
    ) -> bool {
        let record = build_record(citation_id, tool_type, trace, raw_answer);

        let mut state = self.state();
        let result = self
            .encode_with(&mut state, &record)
            .and_then(|bytes| persist::write_atomic(&self.citations_file, &bytes));
        self.finish_add(&mut state, record, result)
    }

    /// [`add_citation`](Self::add_citation) under the session lock
    pub async fn add_citation_async<T: ToolTrace + Sync + ?Sized>(
        &self,
        citation_id: &str,
        tool_type: &str,
        trace: &T,
        raw_answer: &str,
    ) -> bool {
        let _guard = self.session_lock.lock().await;
        let record = build_record(citation_id, tool_type, trace, raw_answer);

        let encoded = {
            let mut state = self.state();
            self.encode_with(&mut state, &record)
        };
        let result = match encoded {
            Ok(bytes) => persist::write_atomic_async(&self.citations_file, &bytes).await,
            Err(e) => Err(e),
        };

        let mut state = self.state();
        self.finish_add(&mut state, record, result)
    }

    fn finish_add(
        &self,
        state: &mut SessionState,
        record: CitationRecord,
        result: Result<()>,
    ) -> bool {
        match result {
            Ok(()) => {
                debug!(
                    "Added citation {} ({})",
                    record.citation_id, record.tool_type
                );
                state.counters.raise_to([record.citation_id.as_str()]);
                state.unreadable.remove(&record.citation_id);
                state.citations.insert(record.citation_id.clone(), record);
                if self.auto_invalidate_refs {
                    self.invalidate_ref_numbers();
                }
                true
            }
            Err(e) => {
                warn!(
                    "Failed to add citation (citation_id={}): {}",
                    record.citation_id, e
                );
                false
            }
        }
    }

    // ========== Inline references ==========

    /// Check every `[[ID]]` marker in `text` against the store
    ///
    /// Ids of persisted records that could not be decoded still count as known.
    pub fn validate_references(&self, text: &str) -> ValidationReport {
        let state = self.state();
        markers::validate_with(text, |id| state.knows(id))
    }

    /// Remove `[[ID]](#ref-...)` links whose id is not stored
    pub fn fix_invalid_citations(&self, text: &str) -> String {
        let state = self.state();
        markers::strip_unknown_links(text, |id| state.knows(id))
    }

    // ========== Reference numbers ==========

    /// Dedup key of a stored citation (its first paper, for paper searches)
    pub fn dedup_key(&self, citation_id: &str) -> Option<String> {
        let state = self.state();
        let citation = state.citations.get(citation_id)?;
        Some(refmap::dedup_key(citation, citation.papers().first()))
    }

    /// Rebuild the reference-number map from scratch and cache it
    pub fn build_ref_number_map(&self) -> RefNumberMap {
        let state = self.state();
        let map = Arc::new(refmap::build_ref_number_map(&state.citations));
        *self
            .ref_numbers
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&map));
        RefNumberMap::clone(&map)
    }

    /// Reference number of a citation id (or `<id>-<n>` paper key)
    pub fn get_ref_number(&self, citation_id: &str) -> Option<usize> {
        self.ref_numbers().get(citation_id).copied()
    }

    /// The full reference-number map, building it on first use
    pub fn get_ref_number_map(&self) -> RefNumberMap {
        RefNumberMap::clone(&self.ref_numbers())
    }

    /// Drop the cached reference-number map
    pub fn invalidate_ref_numbers(&self) {
        *self
            .ref_numbers
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn ref_numbers(&self) -> Arc<RefNumberMap> {
        let cached = self
            .ref_numbers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match cached {
            Some(map) => map,
            None => {
                let state = self.state();
                let map = Arc::new(refmap::build_ref_number_map(&state.citations));
                *self
                    .ref_numbers
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&map));
                map
            }
        }
    }

    // ========== Rendering ==========

    /// Render a stored citation as a reference-list line
    ///
    /// Also accepts the `<id>-<n>` keys of the reference-number map, rendering
    /// the n-th paper of that citation.
    pub fn format_citation_for_report(&self, citation_id: &str) -> Option<String> {
        let state = self.state();
        if let Some(citation) = state.citations.get(citation_id) {
            return format::format_citation(citation);
        }
        let (parent, index) = refmap::split_paper_ref_key(citation_id)?;
        format::format_paper(state.citations.get(parent)?, index)
    }

    // ========== Internals ==========

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn encode(&self, state: &SessionState) -> Result<Vec<u8>> {
        DocumentRef {
            research_id: &self.research_id,
            updated_at: String::new(),
            citations: CitationTable {
                records: &state.citations,
                unreadable: &state.unreadable,
            },
            counters: &state.counters,
            extra: &state.extra,
        }
        .encode()
    }

    /// Encode the document as it would be with `record` added, leaving the
    /// visible state untouched
    fn encode_with(
        &self,
        state: &mut SessionState,
        record: &CitationRecord,
    ) -> Result<Vec<u8>> {
        let id = record.citation_id.clone();
        let counters = state.counters.clone();
        state.counters.raise_to([id.as_str()]);
        let previous = state.citations.insert(id.clone(), record.clone());
        let encoded = self.encode(state);
        state.counters = counters;
        match previous {
            Some(previous) => {
                state.citations.insert(id, previous);
            }
            None => {
                state.citations.remove(&id);
            }
        }
        encoded
    }

    fn flush_locked(&self, state: &SessionState) {
        let result = self
            .encode(state)
            .and_then(|bytes| persist::write_atomic(&self.citations_file, &bytes));
        if let Err(e) = result {
            warn!("Failed to save citation file: {}", e);
        }
    }

    async fn flush_async(&self, encoded: Result<Vec<u8>>) {
        let result = match encoded {
            Ok(bytes) => persist::write_atomic_async(&self.citations_file, &bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!("Failed to save citation file: {}", e);
        }
    }
}

fn parse_stage(stage: &str) -> Stage {
    Stage::from_str(stage).unwrap_or_else(|e| {
        debug!("{}, issuing a research id", e);
        Stage::Research
    })
}

fn build_record<T: ToolTrace + ?Sized>(
    citation_id: &str,
    tool_type: &str,
    trace: &T,
    raw_answer: &str,
) -> CitationRecord {
    let tool_type = ToolType::parse(tool_type);
    let payload = extract::extract_payload(&tool_type, raw_answer);
    CitationRecord::from_trace(citation_id, tool_type, trace).with_payload(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TraceRecord;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup_store() -> (CitationStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store =
            CitationStore::open_in("test-research", temp_dir.path().join("session")).unwrap();
        (store, temp_dir)
    }

    fn trace() -> TraceRecord {
        TraceRecord::new("query", "summary").with_timestamp("2025-01-01T00:00:00")
    }

    #[test]
    fn test_open_creates_session_dir() {
        let (store, temp) = setup_store();
        assert!(temp.path().join("session").is_dir());
        assert!(store.is_empty());
        assert_eq!(store.research_id(), "test-research");
        assert!(!store.citations_file_path().exists());
    }

    #[test]
    fn test_open_with_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::new().cache_root(temp_dir.path());
        let store = CitationStore::open("r-7", &config).unwrap();
        assert_eq!(
            store.citations_file_path(),
            temp_dir.path().join("r-7").join("citations.json")
        );
    }

    #[test]
    fn test_plan_ids_increase() {
        let (store, _temp) = setup_store();
        let ids: Vec<String> = (0..3).map(|_| store.next_plan_id()).collect();
        assert_eq!(ids, vec!["PLAN-01", "PLAN-02", "PLAN-03"]);
        assert_eq!(store.plan_counter(), 3);
    }

    #[test]
    fn test_research_ids_per_block() {
        let (store, _temp) = setup_store();
        assert_eq!(store.next_research_id("block_1"), "CIT-1-01");
        assert_eq!(store.next_research_id("block_2"), "CIT-2-01");
        assert_eq!(store.next_research_id("block_1"), "CIT-1-02");
        assert_eq!(store.next_research_id("block_oops"), "CIT-0-01");
        assert_eq!(store.block_counter("block_1"), 2);
    }

    #[test]
    fn test_next_id_dispatch() {
        let (store, _temp) = setup_store();
        assert_eq!(store.next_id("planning", ""), "PLAN-01");
        assert_eq!(store.next_id("research", "block_4"), "CIT-4-01");
        assert_eq!(store.next_id("unknown", "block_4"), "CIT-4-02");
    }

    #[test]
    fn test_add_and_get() {
        let (store, _temp) = setup_store();
        let raw = json!({"results": [{"title": "T", "url": "https://t.example"}]}).to_string();
        assert!(store.add_citation("CIT-1-01", "web_search", &trace(), &raw));

        assert!(store.exists("CIT-1-01"));
        assert!(!store.exists("CIT-1-02"));
        let record = store.get_citation("CIT-1-01").unwrap();
        assert_eq!(record.tool_type, ToolType::WebSearch);
        assert_eq!(record.web_sources()[0].url, "https://t.example");
        assert!(store.citations_file_path().exists());
    }

    #[test]
    fn test_require_citation() {
        let (store, _temp) = setup_store();
        assert!(store.add_citation("PLAN-01", "run_code", &trace(), ""));
        assert_eq!(store.require_citation("PLAN-01").unwrap().query, "query");
        assert!(matches!(
            store.require_citation("PLAN-02"),
            Err(Error::NotFound(id)) if id == "PLAN-02"
        ));
    }

    #[test]
    fn test_add_overwrites() {
        let (store, _temp) = setup_store();
        assert!(store.add_citation("PLAN-01", "run_code", &trace(), ""));
        let replacement = TraceRecord::new("print(2)", "second run");
        assert!(store.add_citation("PLAN-01", "run_code", &replacement, ""));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_citation("PLAN-01").unwrap().query, "print(2)");
    }

    #[test]
    fn test_add_fails_when_file_cannot_be_written() {
        let (store, _temp) = setup_store();
        // A directory where the document should be makes the rename fail
        std::fs::create_dir_all(store.citations_file_path()).unwrap();
        assert!(!store.add_citation("CIT-1-01", "run_code", &trace(), ""));
        assert!(!store.exists("CIT-1-01"));
    }

    #[test]
    fn test_validate_and_fix() {
        let (store, _temp) = setup_store();
        store.add_citation("CIT-1-01", "rag_naive", &trace(), "{}");

        let report = store.validate_references("see [[CIT-1-01]] and [[CIT-9-99]]");
        assert_eq!(report.valid_citations, vec!["CIT-1-01"]);
        assert_eq!(report.invalid_citations, vec!["CIT-9-99"]);

        let fixed =
            store.fix_invalid_citations("[[CIT-1-01]](#ref-rag-1-01)[[CIT-9-99]](#ref-rag-9-99)");
        assert_eq!(fixed, "[[CIT-1-01]](#ref-rag-1-01)");
    }

    #[test]
    fn test_ref_map_auto_invalidates() {
        let (store, _temp) = setup_store();
        store.add_citation("CIT-1-01", "run_code", &trace(), "");
        assert_eq!(store.get_ref_number("CIT-1-01"), Some(1));
        assert_eq!(store.get_ref_number("CIT-1-02"), None);

        store.add_citation("PLAN-01", "run_code", &trace(), "");
        assert_eq!(store.get_ref_number("PLAN-01"), Some(1));
        assert_eq!(store.get_ref_number("CIT-1-01"), Some(2));
    }

    #[test]
    fn test_ref_map_stale_without_auto_invalidate() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::new()
            .cache_root(temp_dir.path())
            .auto_invalidate_refs(false);
        let store = CitationStore::open("r", &config).unwrap();

        store.add_citation("CIT-1-01", "run_code", &trace(), "");
        assert_eq!(store.get_ref_number_map().len(), 1);

        store.add_citation("CIT-1-02", "run_code", &trace(), "");
        assert_eq!(store.get_ref_number("CIT-1-02"), None);

        store.build_ref_number_map();
        assert_eq!(store.get_ref_number("CIT-1-02"), Some(2));
    }

    #[test]
    fn test_dedup_key_and_format() {
        let (store, _temp) = setup_store();
        let raw = json!({
            "papers": [{"title": "Graph RAG", "authors": ["Edge", "Trinh"], "year": 2024}]
        })
        .to_string();
        store.add_citation("CIT-3-01", "paper_search", &trace(), &raw);

        assert_eq!(
            store.dedup_key("CIT-3-01").as_deref(),
            Some("paper:graph rag|edge")
        );
        assert_eq!(
            store.format_citation_for_report("CIT-3-01").as_deref(),
            Some("Edge, Trinh (2024) \"Graph RAG\"")
        );
        assert!(store.format_citation_for_report("CIT-3-02").is_none());
        assert!(store.dedup_key("CIT-3-02").is_none());
    }

    #[test]
    fn test_unreadable_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let session = temp_dir.path().join("session");
        std::fs::create_dir_all(&session).unwrap();
        std::fs::write(session.join("citations.json"), "{{{{").unwrap();

        let store = CitationStore::open_in("r", &session).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.next_plan_id(), "PLAN-01");
    }

    #[tokio::test]
    async fn test_async_variants() {
        let (store, _temp) = setup_store();
        assert_eq!(store.next_plan_id_async().await, "PLAN-01");
        assert_eq!(store.next_id_async("research", "block_2").await, "CIT-2-01");
        assert!(
            store
                .add_citation_async("CIT-2-01", "web_search", &trace(), "not json")
                .await
        );
        assert!(store.get_citation("CIT-2-01").unwrap().web_sources().is_empty());
    }

    #[test]
    fn test_format_paper_ref_keys() {
        let (store, _temp) = setup_store();
        let raw = json!({
            "papers": [
                {"title": "Graph RAG", "authors": ["Edge"], "year": 2024},
                {"title": "LightRAG", "authors": ["Guo"], "year": 2024}
            ]
        })
        .to_string();
        store.add_citation("CIT-3-01", "paper_search", &trace(), &raw);

        let map = store.build_ref_number_map();
        assert_eq!(
            store.format_citation_for_report("CIT-3-01-2").as_deref(),
            Some("Guo (2024) \"LightRAG\"")
        );
        for key in map.keys() {
            assert!(store.format_citation_for_report(key).is_some(), "{}", key);
        }
        assert!(store.format_citation_for_report("CIT-3-01-3").is_none());
    }

    #[test]
    fn test_unreadable_record_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let session = temp_dir.path().join("session");
        std::fs::create_dir_all(&session).unwrap();
        let document = json!({
            "research_id": "r",
            "citations": {
                "CIT-1-01": {"citation_id": "CIT-1-01", "tool_type": "web_search", "query": "ok"},
                "CIT-1-02": {
                    "citation_id": "CIT-1-02",
                    "tool_type": "paper_search",
                    "papers": "oops"
                }
            }
        });
        std::fs::write(session.join("citations.json"), document.to_string()).unwrap();

        let store = CitationStore::open_in("r", &session).unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.exists("CIT-1-02"));
        assert!(store.validate_references("[[CIT-1-02]]").is_valid);
        assert_eq!(store.next_research_id("block_1"), "CIT-1-03");

        // Overwriting the unreadable id replaces the raw entry
        assert!(store.add_citation("CIT-1-02", "run_code", &trace(), ""));
        let reopened = CitationStore::open_in("r", &session).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.get_citation("CIT-1-02").unwrap().query, "query");
    }
}
