use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "site.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub site_title: String,
    /// Templates, portfolio data and static assets live here.
    pub content_dir: PathBuf,
    /// Blog posts, relative to `content_dir`.
    pub blog_dir: PathBuf,
    pub port: u16,
    /// Posts shown on the home page and the default for `/api/posts/latest`.
    pub latest_posts: usize,
    pub highlight_theme: String,
    pub is_development: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: "Portfolio".to_string(),
            content_dir: PathBuf::from("content"),
            blog_dir: PathBuf::from("blog"),
            port: 8080,
            latest_posts: 4,
            highlight_theme: "base16-ocean.dark".to_string(),
            is_development: false,
        }
    }
}

impl SiteConfig {
    /// Reads `SITE_CONFIG` (or `site.toml`) if present, then applies
    /// `PORT`, `RUST_ENV` and `CONTENT_DIR` from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("SITE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(port) = var("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(env) = var("RUST_ENV") {
            self.is_development = env == "development";
        }
        if let Some(dir) = var("CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
    }

    pub fn blog_path(&self) -> PathBuf {
        self.content_dir.join(&self.blog_dir)
    }

    pub fn static_path(&self) -> PathBuf {
        self.content_dir.join("static")
    }
}
