use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, get_service},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::error::AppError;
use crate::hot_reload::ws_handler;
use crate::models::{Post, PostMeta};
use crate::pages;
use crate::state::{AppState, RouterState};

pub fn build_router(router_state: RouterState) -> Router {
    let static_path = router_state.app_state.config.static_path();
    let static_dir = get_service(ServeDir::new(&static_path));
    let favicon_ico = get_service(ServeFile::new(static_path.join("favicon.ico")));

    Router::new()
        .route("/", get(homepage))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(render_post))
        .route("/api/posts", get(api_all_posts))
        .route("/api/posts/latest", get(api_latest_posts))
        .route("/api/posts/{slug}", get(api_post))
        .nest_service("/static", static_dir)
        .route_service("/favicon.ico", favicon_ico)
        .route("/ws", get(ws_handler))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(router_state)
}

async fn page(state: &AppState, title: &str, body: &str) -> Html<String> {
    let site = state.site.read().await;
    Html(pages::render_with_layout(
        &site,
        title,
        body,
        state.config.is_development,
    ))
}

async fn not_found_page(state: &AppState, slug: &str) -> Response {
    let body = pages::not_found_body(&*state.site.read().await, slug);
    (StatusCode::NOT_FOUND, page(state, "Not found", &body).await).into_response()
}

async fn homepage(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let latest = state.blog.list_latest_posts(state.config.latest_posts).await?;
    let body = pages::home_body(&state.site.read().await.portfolio, &latest);
    Ok(page(&state, &state.config.site_title, &body).await)
}

async fn blog_index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let posts = state.blog.list_all_posts().await?;
    let body = pages::blog_index_body(&posts);
    Ok(page(&state, "Blog", &body).await)
}

async fn render_post(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let Some(post) = state.blog.get_post_by_slug(&slug).await? else {
        return Ok(not_found_page(&state, &slug).await);
    };
    let body = pages::post_body(&post, &state.highlighter);
    Ok(page(&state, &post.meta.title, &body).await.into_response())
}

async fn fallback(State(state): State<Arc<AppState>>, uri: axum::http::Uri) -> Response {
    not_found_page(&state, uri.path().trim_start_matches('/')).await
}

#[derive(Deserialize)]
struct LatestQuery {
    limit: Option<usize>,
}

async fn api_all_posts(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PostMeta>>, AppError> {
    Ok(Json(state.blog.list_all_posts().await?))
}

async fn api_latest_posts(
    Query(query): Query<LatestQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PostMeta>>, AppError> {
    let limit = query.limit.unwrap_or(state.config.latest_posts);
    Ok(Json(state.blog.list_latest_posts(limit).await?))
}

async fn api_post(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let response = match state.blog.get_post_by_slug(&slug).await? {
        Some(post) => Json::<Post>(post).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not found", "slug": slug })),
        )
            .into_response(),
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::sync::{broadcast, RwLock};
    use tower::ServiceExt;

    use crate::blog::BlogRepository;
    use crate::config::SiteConfig;
    use crate::content_loader::SiteContent;
    use crate::content_store::memory::MemoryContentStore;
    use crate::markdown::Highlighter;
    use crate::portfolio::{Hero, Portfolio};

    fn router_with(store: MemoryContentStore) -> Router {
        let config = SiteConfig {
            site_title: "Jane Doe".into(),
            latest_posts: 2,
            ..SiteConfig::default()
        };
        let site = SiteContent {
            banner_html: "<nav></nav>".into(),
            layout_html: "<html><title>{{ title }}</title><body>{{ banner }}{{ content }}</body></html>".into(),
            not_found_html: "<p class=\"missing\">Nothing at {{slug}}</p>".into(),
            portfolio: Portfolio {
                hero: Hero {
                    name: "Jane Doe".into(),
                    ..Hero::default()
                },
                ..Portfolio::default()
            },
        };
        let app_state = Arc::new(AppState {
            highlighter: Highlighter::new(&config.highlight_theme),
            config,
            site: RwLock::new(site),
            blog: BlogRepository::new(Arc::new(store)),
        });
        let (broadcaster, _) = broadcast::channel(1);
        build_router(RouterState {
            app_state,
            broadcaster,
        })
    }

    fn router() -> Router {
        router_with(MemoryContentStore::with_files([
            ("first.md", "---\ntitle: First\ndate: 2024-01-10\n---\nOld news.\n"),
            ("second.md", "---\ntitle: Second\ndate: 2024-03-02\nsummary: Fresh\n---\nNew *news*.\n"),
            ("third.mdx", "---\ntitle: Third\ndate: 2024-02-14\n---\nMiddle.\n"),
        ]))
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn home_lists_latest_posts() {
        let (status, body) = fetch(router(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<title>Jane Doe</title>"));
        assert!(body.contains("href=\"/blog/second\""));
        assert!(body.contains("href=\"/blog/third\""));
        assert!(!body.contains("href=\"/blog/first\""));
    }

    #[tokio::test]
    async fn post_page_renders() {
        let (status, body) = fetch(router(), "/blog/second").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Second</h1>"));
        assert!(body.contains("<p>New <em>news</em>.</p>"));
        assert!(body.contains("02 March 2024"));
    }

    #[tokio::test]
    async fn missing_post_is_404_page() {
        let (status, body) = fetch(router(), "/blog/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("Nothing at nope"));
    }

    #[tokio::test]
    async fn traversal_attempt_is_404() {
        let (status, _) = fetch(router(), "/blog/..%2Fsecret").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_uses_not_found_page() {
        let (status, body) = fetch(router(), "/nowhere").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("class=\"missing\""));
    }

    #[tokio::test]
    async fn api_lists_posts_newest_first() {
        let (status, body) = fetch(router(), "/api/posts").await;
        let posts: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        let slugs: Vec<&str> = posts
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["slug"].as_str().unwrap())
            .collect();
        assert_eq!(slugs, vec!["second", "third", "first"]);
    }

    #[tokio::test]
    async fn api_latest_respects_limit() {
        let (_, body) = fetch(router(), "/api/posts/latest?limit=1").await;
        let posts: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(posts.as_array().unwrap().len(), 1);
        assert_eq!(posts[0]["slug"], "second");

        let (_, body) = fetch(router(), "/api/posts/latest").await;
        let posts: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(posts.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn api_post_returns_full_record() {
        let (status, body) = fetch(router(), "/api/posts/third").await;
        let post: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(post["title"], "Third");
        assert_eq!(post["html"], "<p>Middle.</p>\n");

        let (status, body) = fetch(router(), "/api/posts/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("\"slug\":\"missing\""));
    }

    #[tokio::test]
    async fn unreadable_blog_directory_is_500() {
        let (status, body) = fetch(router_with(MemoryContentStore::unreadable()), "/blog").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Something went wrong"));
    }
}
