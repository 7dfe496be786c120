//! docqa: upload PDFs, ask questions about them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_core::config::DEFAULT_TOP_K;
use docqa_core::{ChunkingConfig, DocQaConfig};
use docqa_server::{cli, routes, AppState};

fn resolve_data_dir() -> PathBuf {
    std::env::var("DOCQA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "index" => {
                if args.len() < 4 {
                    eprintln!("Usage: docqa index <pdf> <out.json>");
                    std::process::exit(1);
                }
                let chunks = cli::index_pdf(
                    Path::new(&args[2]),
                    Path::new(&args[3]),
                    &ChunkingConfig::from_env(),
                )?;
                println!("Indexed {} chunks into {}", chunks, args[3]);
                return Ok(());
            }
            "search" => {
                if args.len() < 4 {
                    eprintln!("Usage: docqa search <index.json> <query> [top_k]");
                    std::process::exit(1);
                }
                let top_k = match args.get(4) {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| anyhow::anyhow!("top_k must be a positive integer, got {raw}"))?,
                    None => DEFAULT_TOP_K,
                };
                let hits = cli::search_index(Path::new(&args[2]), &args[3], top_k)?;
                println!("{}", cli::format_hits(&hits));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("{}", cli::USAGE);
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'docqa help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = DocQaConfig::from_env(&data_dir)?;
    let port = config.port;

    let state = Arc::new(
        AppState::open(config).map_err(|e| anyhow::anyhow!("Failed to open state: {}", e))?,
    );
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("docqa server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
