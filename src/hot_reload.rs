use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use notify_debouncer_full::{
    new_debouncer,
    notify::{Error as NotifyError, RecursiveMode, Watcher},
    DebouncedEvent,
};
use tracing::{debug, error, info};

use crate::content_loader::reload_content;
use crate::state::{AppState, RefreshBroadcaster};

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Injected before `</body>` in development.
pub const HOT_RELOAD_SCRIPT: &str = r#"
<script>
    const socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = (event) => {
        if (event.data === "reload") {
            window.location.reload();
        }
    };
</script>
"#;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(tx): State<RefreshBroadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, tx))
}

async fn handle_socket(mut socket: WebSocket, tx: RefreshBroadcaster) {
    let mut rx = tx.subscribe();

    if rx.recv().await.is_ok()
        && socket.send(Message::Text("reload".into())).await.is_err()
    {
        debug!("Client disconnected before reload message could be sent");
    }
}

/// Editor lock and backup files (Emacs `.#*`, `*~`) do not trigger reloads.
fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|s| s.starts_with(".#") || s.ends_with('~'))
}

fn is_relevant(event: &DebouncedEvent) -> bool {
    let kind = &event.kind;
    (kind.is_modify() || kind.is_create() || kind.is_remove())
        && !event.event.paths.iter().any(|path| is_temp_file(path))
}

pub fn start_content_watcher(tx: RefreshBroadcaster, app_state: Arc<AppState>) {
    let content_dir = app_state.config.content_dir.clone();
    info!("Watching {} for hot-reload...", content_dir.display());

    tokio::spawn(async move {
        let (watcher_tx, mut watcher_rx) = tokio::sync::mpsc::channel(1);

        let debouncer = new_debouncer(
            DEBOUNCE,
            None,
            move |res: Result<Vec<DebouncedEvent>, Vec<NotifyError>>| match res {
                Ok(events) => {
                    let changed: Vec<_> = events
                        .iter()
                        .filter(|event| is_relevant(event))
                        .flat_map(|event| &event.event.paths)
                        .map(|path| path.display().to_string())
                        .collect();
                    if changed.is_empty() {
                        return;
                    }
                    debug!("Relevant file change detected: {:?}", changed);
                    // A full channel already has a reload pending.
                    let _ = watcher_tx.try_send(());
                }
                Err(errors) => {
                    for e in errors {
                        error!("Watcher error: {}", e);
                    }
                }
            },
        );

        let mut debouncer = match debouncer {
            Ok(debouncer) => debouncer,
            Err(e) => {
                error!("Failed to create file watcher: {}", e);
                return;
            }
        };
        if let Err(e) = debouncer
            .watcher()
            .watch(&content_dir, RecursiveMode::Recursive)
        {
            error!("Failed to watch {}: {}", content_dir.display(), e);
            return;
        }

        // The debouncer must stay alive for as long as events are wanted.
        while watcher_rx.recv().await.is_some() {
            info!("Content change detected, reloading content and sending signal...");

            reload_content(&app_state).await;

            if tx.send(()).is_err() {
                debug!("No browser connected to receive the reload signal");
            }
        }
    });
}
