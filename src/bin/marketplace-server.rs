// ABOUTME: HTTP server binary for the startup marketplace API
// ABOUTME: Loads configuration, opens the database, and serves routes until interrupted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Startup Marketplace Server Binary
//!
//! Configuration comes from the environment; a few values can be overridden
//! on the command line.
//!
//! ```bash
//! cargo run --bin marketplace-server -- --http-port 8080
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use startup_marketplace::{
    config::ServerConfig, database::Database, logging, resources::ServerResources,
    routes::build_router, services::mentor::MentorChatbot,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "marketplace-server")]
#[command(about = "Startup marketplace API with products, orders, and a mentor chatbot")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override bind address
    #[arg(long)]
    host: Option<String>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    info!("{}", config.summary());

    if let Some(parent) = config
        .database_file_path()
        .as_deref()
        .and_then(std::path::Path::parent)
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    let database = Database::new(&config.database_url).await?;
    let faq_count = database.chat().active_faqs().await?.len();
    if faq_count == 0 {
        warn!("No FAQ entries found; run seed-mentor-faqs to populate the mentor chatbot");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.http_port))?;

    let resources = Arc::new(ServerResources::new(database, config, MentorChatbot::new()));
    let router = build_router(resources);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Marketplace server listening on http://{addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Marketplace server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
