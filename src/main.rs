use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{net::TcpListener, sync::{broadcast, RwLock}};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod blog;
mod config;
mod content_loader;
mod content_store;
mod error;
mod front_matter;
mod helpers;
mod hot_reload;
mod markdown;
mod models;
mod pages;
mod portfolio;
mod routes;
mod state;

use crate::blog::BlogRepository;
use crate::config::SiteConfig;
use crate::content_loader::load_content;
use crate::content_store::FsContentStore;
use crate::markdown::Highlighter;
use crate::state::{AppState, RouterState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SiteConfig::load().context("Failed to load site configuration")?;
    info!("RUST_ENV is set to development: {}", config.is_development);

    let site = load_content(&config.content_dir)
        .await
        .context("Failed to load initial content files")?;

    let blog_path = config.blog_path();
    info!("Serving posts from {}", blog_path.display());

    let state = Arc::new(AppState {
        blog: BlogRepository::new(Arc::new(FsContentStore::new(blog_path))),
        highlighter: Highlighter::new(&config.highlight_theme),
        site: RwLock::new(site),
        config,
    });

    // Hot-reload setup
    let (tx, _rx) = broadcast::channel(1);
    if state.config.is_development {
        info!("Hot reload enabled. Check logs for file change events.");
        hot_reload::start_content_watcher(tx.clone(), state.clone());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = routes::build_router(RouterState {
        app_state: state,
        broadcaster: tx,
    });

    info!(%addr, "listening");
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
