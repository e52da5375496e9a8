//! Reference numbering command

use crate::state::AppState;
use citemark_core::ids::sort_key;
use clap::Parser;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use sen::{Args, CliResult, State};
use std::path::PathBuf;

/// Show the deduplicated reference numbers of a research session
///
/// Usage:
///   citemark refs research-42
#[derive(Parser, Debug)]
pub struct RefsArgs {
    /// Research session ID
    pub research_id: String,

    /// Cache root holding the session directories
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[sen::handler]
pub async fn refs(state: State<AppState>, Args(args): Args<RefsArgs>) -> CliResult<String> {
    let app = state.read().await;
    let store = app.open_store(&args.research_id, args.cache_dir.as_ref())?;

    let map = store.build_ref_number_map();
    if map.is_empty() {
        return Ok(format!("No citations found for: {}", args.research_id));
    }

    let mut entries: Vec<(&String, &usize)> = map.iter().collect();
    entries.sort_by(|(a_id, a_ref), (b_id, b_ref)| {
        a_ref
            .cmp(b_ref)
            .then_with(|| sort_key(a_id).cmp(&sort_key(b_id)))
            .then_with(|| a_id.cmp(b_id))
    });

    // Build table
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Ref").fg(Color::Cyan),
            Cell::new("Key").fg(Color::Cyan),
            Cell::new("Report line").fg(Color::Cyan),
        ]);

    for (key, number) in &entries {
        let line = store
            .format_citation_for_report(key)
            .unwrap_or_default();
        table.add_row(vec![format!("[{}]", number), key.to_string(), line]);
    }

    let distinct = map.values().max().copied().unwrap_or(0);
    Ok(format!(
        "\n{}\n\nTotal: {} references ({} keys)",
        table,
        distinct,
        entries.len()
    ))
}
