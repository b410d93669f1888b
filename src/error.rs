use std::{io, path::PathBuf};

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("failed to list blog directory {path}: {source}")]
    ListEntries {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read post {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SiteContentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid portfolio data in {path}: {source}")]
    Portfolio {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Request-level failure. Missing posts are not errors; handlers map `None` to 404.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Blog(#[from] BlogError),
}

const INTERNAL_ERROR_HTML: &str =
    "<!DOCTYPE html><html><body><h1>Something went wrong</h1><p>Please try again later.</p></body></html>";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, Html(INTERNAL_ERROR_HTML)).into_response()
    }
}
