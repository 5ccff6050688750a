use anyhow::Result;
use axum::Router;
use clap::Parser;
use marquee_core::CorpusConfig;
use marquee_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use tokio::net::TcpListener;

#[derive(Parser)]
struct Args {
    /// Title store directory built by marquee-indexer
    #[arg(long, default_value = "./store")]
    store: PathBuf,
    /// Multistream .xml.bz2 dump
    #[arg(long)]
    archive: PathBuf,
    /// Redirect hops followed before a title is reported unavailable
    #[arg(long, default_value_t = marquee_core::config::DEFAULT_MAX_REDIRECT_DEPTH)]
    max_depth: usize,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = CorpusConfig::new(args.archive, args.store).with_max_redirect_depth(args.max_depth);
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
