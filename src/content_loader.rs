use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info};

use crate::error::SiteContentError;
use crate::portfolio::Portfolio;
use crate::state::AppState;

/// Templates and portfolio data. Posts are not part of this; they are read per request.
#[derive(Debug, Clone, Default)]
pub struct SiteContent {
    pub banner_html: String,
    /// Supports `{{ title }}`, `{{ banner }}` and `{{ content }}`.
    pub layout_html: String,
    /// Supports a `{{slug}}` placeholder.
    pub not_found_html: String,
    pub portfolio: Portfolio,
}

async fn read(path: PathBuf) -> Result<String, SiteContentError> {
    fs::read_to_string(&path)
        .await
        .map_err(|source| SiteContentError::Read { path, source })
}

pub async fn load_content(content_dir: &Path) -> Result<SiteContent, SiteContentError> {
    let banner_html = read(content_dir.join("banner.html")).await?;
    let layout_html = read(content_dir.join("layout.html")).await?;
    let not_found_html = read(content_dir.join("not_found.html")).await?;

    let portfolio_path = content_dir.join("portfolio.toml");
    let portfolio = toml::from_str(&read(portfolio_path.clone()).await?).map_err(|source| {
        SiteContentError::Portfolio {
            path: portfolio_path,
            source,
        }
    })?;

    Ok(SiteContent {
        banner_html,
        layout_html,
        not_found_html,
        portfolio,
    })
}

/// Swaps in freshly loaded content. On failure the previous content stays live.
pub async fn reload_content(app_state: &AppState) {
    info!("Reloading site content...");
    match load_content(&app_state.config.content_dir).await {
        Ok(content) => {
            *app_state.site.write().await = content;
            info!("Content successfully reloaded.");
        }
        Err(e) => {
            error!("Failed to reload content: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_site(dir: &Path, portfolio: &str) {
        std::fs::write(dir.join("banner.html"), "<header>Banner</header>").unwrap();
        std::fs::write(dir.join("layout.html"), "<body>{{ content }}</body>").unwrap();
        std::fs::write(dir.join("not_found.html"), "<p>No {{slug}}</p>").unwrap();
        std::fs::write(dir.join("portfolio.toml"), portfolio).unwrap();
    }

    #[tokio::test]
    async fn loads_templates_and_portfolio() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path(), "[hero]\nname = \"Jane\"\n");

        let content = load_content(dir.path()).await.unwrap();

        assert_eq!(content.banner_html, "<header>Banner</header>");
        assert_eq!(content.portfolio.hero.name, "Jane");
    }

    #[tokio::test]
    async fn missing_template_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path(), "");
        std::fs::remove_file(dir.path().join("layout.html")).unwrap();

        match load_content(dir.path()).await {
            Err(SiteContentError::Read { path, .. }) => assert!(path.ends_with("layout.html")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_portfolio_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path(), "[[projects]]\ntitle = 3\n");

        assert!(matches!(
            load_content(dir.path()).await,
            Err(SiteContentError::Portfolio { .. })
        ));
    }
}
