//! SmartDoc server binary
//!
//! Run with: cargo run -p smartdoc --bin smartdoc-server

use smartdoc::{config::AppConfig, server::SmartDocServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartdoc=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         SmartDoc                          ║
║            Ask questions about your PDF documents         ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Optional config path as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM backend: {:?}", config.llm.backend);
    tracing::info!("  - LLM model: {}", config.llm.model_name());
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!(
        "  - Context: {} chunks x {} chars",
        config.context.max_chunks,
        config.context.max_chars_per_chunk
    );

    let server = SmartDocServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/sessions              - Create a session");
    println!("  POST /api/sessions/:id/document - Upload a PDF");
    println!("  POST /api/sessions/:id/ask      - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
