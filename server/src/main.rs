use anyhow::Result;
use axum::Router;
use boolsearch_core::SearchConfig;
use boolsearch_server::build_app;
use clap::Parser;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Collection file or directory (SMART format)
    #[arg(long)]
    collection: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Gram length for spelling correction
    #[arg(long = "k-gram", default_value_t = 2)]
    k_gram: usize,
    /// Minimum Jaccard similarity for correction candidates
    #[arg(long, default_value_t = 0.5)]
    jaccard: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = SearchConfig { k_gram_length: args.k_gram, jaccard_threshold: args.jaccard, ..SearchConfig::default() };
    let app: Router = build_app(&args.collection, config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
