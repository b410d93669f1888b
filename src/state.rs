use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::blog::BlogRepository;
use crate::config::SiteConfig;
use crate::content_loader::SiteContent;
use crate::markdown::Highlighter;

pub type RefreshBroadcaster = broadcast::Sender<()>;

pub struct AppState {
    pub config: SiteConfig,
    /// Replaced wholesale on hot reload.
    pub site: RwLock<SiteContent>,
    pub blog: BlogRepository,
    pub highlighter: Highlighter,
}

#[derive(Clone)]
pub struct RouterState {
    pub app_state: Arc<AppState>,
    pub broadcaster: RefreshBroadcaster,
}

impl axum::extract::FromRef<RouterState> for Arc<AppState> {
    fn from_ref(state: &RouterState) -> Self {
        state.app_state.clone()
    }
}

impl axum::extract::FromRef<RouterState> for RefreshBroadcaster {
    fn from_ref(state: &RouterState) -> Self {
        state.broadcaster.clone()
    }
}
