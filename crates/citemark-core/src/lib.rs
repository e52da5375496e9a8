//! # citemark-core
//!
//! Citation bookkeeping for deep-research agent pipelines.
//!
//! ## Features
//!
//! - Collision-free citation ids (`PLAN-01`, `CIT-3-02`) issued to concurrent research workers
//! - Durable per-session JSON store with counter recovery on restart
//! - Payload extraction from RAG, web-search and paper-search tool answers
//! - Inline `[[ID]]` marker validation and repair
//! - Deduplicated reference numbering for the final report
//!
//! ## Example
//!
//! ```no_run
//! use citemark_core::{CitationStore, StoreConfig, TraceRecord};
//!
//! #[tokio::main]
//! async fn main() -> citemark_core::Result<()> {
//!     let store = CitationStore::open("research-42", &StoreConfig::from_env()?)?;
//!
//!     // Issued under the session lock, safe across workers
//!     let id = store.next_research_id_async("block_2").await;
//!     let trace = TraceRecord::new("retrieval augmented generation", "two surveys");
//!     store
//!         .add_citation_async(&id, "paper_search", &trace, r#"{"papers": []}"#)
//!         .await;
//!
//!     let report = store.validate_references("As shown in [[CIT-2-01]] ...");
//!     assert!(report.is_valid);
//!
//!     let numbers = store.get_ref_number_map();
//!     println!("{} is reference [{}]", id, numbers[&id]);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod ids;
pub mod markers;
pub mod persist;
pub mod refmap;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use ids::{CitationId, Counters, Stage};
pub use markers::ValidationReport;
pub use persist::CitationDocument;
pub use refmap::RefNumberMap;
pub use store::CitationStore;
pub use types::{
    CitationRecord, Paper, Payload, RagSource, ToolTrace, ToolType, TraceRecord, WebSource,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
