//! Show command

use crate::state::AppState;
use citemark_core::{CitationRecord, Payload};
use clap::Parser;
use sen::{Args, CliError, CliResult, State};
use std::path::PathBuf;

/// Show detailed information about a citation
///
/// Usage:
///   citemark show research-42 CIT-2-01
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Research session ID
    pub research_id: String,

    /// Citation ID to display
    pub citation_id: String,

    /// Cache root holding the session directories
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[sen::handler]
pub async fn show(state: State<AppState>, Args(args): Args<ShowArgs>) -> CliResult<String> {
    let app = state.read().await;
    let store = app.open_store(&args.research_id, args.cache_dir.as_ref())?;

    let citation = store
        .require_citation(&args.citation_id)
        .map_err(|e| CliError::user(e.to_string()))?;

    // Format output
    let mut output = String::new();
    output.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    output.push_str(&format!("  Citation: {}\n", citation.citation_id));
    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    output.push_str(&format!("Tool:        {}\n", citation.tool_type));
    output.push_str(&format!("Timestamp:   {}\n", citation.timestamp));
    if let Some(number) = store.get_ref_number(&citation.citation_id) {
        output.push_str(&format!("Reference:   [{}]\n", number));
    }
    if let Some(key) = store.dedup_key(&citation.citation_id) {
        output.push_str(&format!("Dedup key:   {}\n", key));
    }

    output.push_str(&format!("\nQuery:\n{}\n", citation.query));
    output.push_str(&format!("\nSummary:\n{}\n", citation.summary));

    let sources = describe_sources(&citation);
    if !sources.is_empty() {
        output.push_str("\n────────────────────────────────────────\n");
        output.push_str("  Sources\n");
        output.push_str("────────────────────────────────────────\n\n");
        for (i, line) in sources.iter().enumerate() {
            output.push_str(&format!("#{} {}\n", i + 1, line));
        }
    }

    if let Some(line) = store.format_citation_for_report(&citation.citation_id) {
        output.push_str(&format!("\nReport line:\n{}\n", line));
    }

    output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    Ok(output)
}

fn describe_sources(citation: &CitationRecord) -> Vec<String> {
    match &citation.payload {
        Payload::Rag { kb_name, sources } => {
            let kb = kb_name.as_deref().unwrap_or("");
            sources
                .iter()
                .map(|s| {
                    let name = if s.title.is_empty() { &s.source_file } else { &s.title };
                    format!("[{}] {} {}", kb, name, super::truncate(&s.content_preview, 80))
                })
                .collect()
        }
        Payload::Web { web_sources } => web_sources
            .iter()
            .map(|s| format!("{} <{}>", s.title, s.url))
            .collect(),
        Payload::Paper { papers, .. } => papers
            .iter()
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "{} - {} ({}-{})",
                    p.title,
                    p.authors,
                    citation.citation_id,
                    i + 1
                )
            })
            .collect(),
        Payload::Plain => Vec::new(),
    }
}
