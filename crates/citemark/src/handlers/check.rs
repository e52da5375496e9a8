//! Draft checking commands

use crate::state::AppState;
use clap::Parser;
use sen::{Args, CliError, CliResult, State};
use std::path::{Path, PathBuf};
use tracing::info;

/// Check the `[[ID]]` markers of a report draft against a session
///
/// Usage:
///   citemark validate research-42 --file report.md
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Research session ID
    pub research_id: String,

    /// Draft to check
    #[arg(short, long)]
    pub file: PathBuf,

    /// Cache root holding the session directories
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[sen::handler]
pub async fn validate(
    state: State<AppState>,
    Args(args): Args<ValidateArgs>,
) -> CliResult<String> {
    let app = state.read().await;
    let store = app.open_store(&args.research_id, args.cache_dir.as_ref())?;
    let text = read_draft(&args.file)?;

    let report = store.validate_references(&text);

    let mut output = format!(
        "Found {} citation markers in {}\n",
        report.total_found,
        args.file.display()
    );
    output.push_str(&format!("  Valid:   {}\n", report.valid_citations.len()));
    output.push_str(&format!("  Invalid: {}\n", report.invalid_citations.len()));

    if report.is_valid {
        output.push_str("\n✓ All citation markers resolve");
        return Ok(output);
    }

    output.push_str("\nUnknown citation ids:\n");
    for id in &report.invalid_citations {
        output.push_str(&format!("  ✗ {}\n", id));
    }
    Err(CliError::user(output))
}

/// Remove links to unknown citations from a report draft
///
/// Usage:
///   citemark fix research-42 --file report.md
///   citemark fix research-42 --file report.md --write
#[derive(Parser, Debug)]
pub struct FixArgs {
    /// Research session ID
    pub research_id: String,

    /// Draft to repair
    #[arg(short, long)]
    pub file: PathBuf,

    /// Rewrite the file in place instead of printing the result
    #[arg(short, long)]
    pub write: bool,

    /// Cache root holding the session directories
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,
}

#[sen::handler]
pub async fn fix(state: State<AppState>, Args(args): Args<FixArgs>) -> CliResult<String> {
    let app = state.read().await;
    let store = app.open_store(&args.research_id, args.cache_dir.as_ref())?;
    let text = read_draft(&args.file)?;

    let fixed = store.fix_invalid_citations(&text);

    if !args.write {
        return Ok(fixed);
    }

    if fixed == text {
        return Ok(format!("✓ No invalid citation links in {}", args.file.display()));
    }

    std::fs::write(&args.file, &fixed)
        .map_err(|e| CliError::system(format!("Failed to write draft: {}", e)))?;
    info!("Rewrote {}", args.file.display());

    Ok(format!(
        "✓ Removed invalid citation links from {} ({} → {} bytes)",
        args.file.display(),
        text.len(),
        fixed.len()
    ))
}

fn read_draft(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::user(format!("Failed to read draft {}: {}", path.display(), e)))
}
