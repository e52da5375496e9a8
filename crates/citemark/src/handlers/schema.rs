//! Schema command

use crate::state::AppState;
use citemark_core::CitationDocument;
use sen::{CliError, CliResult, State};

/// Print the JSON Schema of a session's citations.json
///
/// Usage:
///   citemark schema
pub async fn schema(_state: State<AppState>) -> CliResult<String> {
    let schema = schemars::schema_for!(CitationDocument);
    serde_json::to_string_pretty(&schema)
        .map_err(|e| CliError::system(format!("Failed to render schema: {}", e)))
}
