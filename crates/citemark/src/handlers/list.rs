//! List command

use super::truncate;
use crate::state::AppState;
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use sen::{Args, CliResult, State};
use std::path::PathBuf;

/// List all citations of a research session
///
/// Usage:
///   citemark list research-42
///   citemark list research-42 --tool paper_search
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Research session ID
    pub research_id: String,

    /// Only show citations from this tool
    #[arg(short, long)]
    pub tool: Option<String>,

    /// Cache root holding the session directories
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[sen::handler]
pub async fn list(state: State<AppState>, Args(args): Args<ListArgs>) -> CliResult<String> {
    let app = state.read().await;
    let store = app.open_store(&args.research_id, args.cache_dir.as_ref())?;

    let tool_filter = args.tool.as_deref().map(citemark_core::ToolType::parse);
    let citations: Vec<_> = store
        .get_all_citations()
        .into_iter()
        .filter(|c| tool_filter.as_ref().map_or(true, |t| &c.tool_type == t))
        .collect();

    if citations.is_empty() {
        return Ok(format!("No citations found for: {}", args.research_id));
    }

    // Build table
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(Color::Green),
            Cell::new("Ref").fg(Color::Green),
            Cell::new("Tool").fg(Color::Green),
            Cell::new("Query").fg(Color::Green),
            Cell::new("Summary").fg(Color::Green),
        ]);

    for citation in &citations {
        let ref_number = store
            .get_ref_number(&citation.citation_id)
            .map(|n| format!("[{}]", n))
            .unwrap_or_else(|| "-".to_string());

        table.add_row(vec![
            citation.citation_id.clone(),
            ref_number,
            citation.tool_type.to_string(),
            truncate(&citation.query, 50),
            truncate(&citation.summary, 50),
        ]);
    }

    Ok(format!(
        "\n{}\n\nTotal: {} citations",
        table,
        citations.len()
    ))
}
