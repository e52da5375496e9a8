//! citemark CLI - Research citation stores
//!
//! A command-line tool for inspecting and repairing the citation store of a
//! research session.

mod handlers;
mod state;

use handlers::{check, list, refs, schema, show};
use sen::Router;
use state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Initialize application state
    let state = match AppState::new() {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to initialize citemark: {}", e);
            std::process::exit(1);
        }
    };

    // Build router
    let router = Router::new()
        // Inspection commands
        .route("list", list::list())
        .route("show", show::show())
        .route("refs", refs::refs())
        .route("schema", schema::schema)

        // Draft checking commands
        .route("validate", check::validate())
        .route("fix", check::fix())

        .with_state(state)
        .with_agent_mode(); // JSON output for LLM integration

    // Execute
    let response = router.execute().await;

    // Output
    if response.agent_mode {
        println!("{}", response.to_agent_json());
    } else if !response.output.is_empty() {
        println!("{}", response.output);
    }

    std::process::exit(response.exit_code);
}
