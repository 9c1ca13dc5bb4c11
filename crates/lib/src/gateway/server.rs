//! Webhook callback server (single route).

use crate::channels::google_chat::normalize::{normalize, NormalizeContext};
use crate::channels::host::Dispatcher;
use crate::channels::inbound::{MessageEvent, PlatformMeta};
use crate::gateway::protocol::WebhookAck;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::watch;

/// The only route; platform events are POSTed here.
pub const CALLBACK_PATH: &str = "/googlechat/callback";

/// Listener lifecycle: `Stopped → Listening → Stopping → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    Listening,
    Stopping,
}

/// Where to listen, what token to require, and how to normalize.
#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub host: String,
    pub port: u16,
    /// Empty or `None` disables the bearer check.
    pub verification_token: Option<String>,
    pub normalize: NormalizeContext,
}

/// Per-request state shared by all handler tasks. Read-only.
#[derive(Clone)]
struct CallbackState {
    required_token: Option<Arc<str>>,
    normalize: Arc<NormalizeContext>,
    platform: Arc<PlatformMeta>,
    dispatcher: Arc<dyn Dispatcher>,
}

/// HTTP listener for platform callbacks with a one-shot cooperative shutdown.
pub struct WebhookServer {
    bind_addr: String,
    callback: CallbackState,
    /// Flips to `true` once; never back.
    shutdown: watch::Sender<bool>,
    state: Arc<watch::Sender<ListenerState>>,
}

impl WebhookServer {
    pub fn new(
        settings: ListenerSettings,
        platform: PlatformMeta,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let required_token = settings
            .verification_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Arc::from);
        let (shutdown, _) = watch::channel(false);
        let (state, _) = watch::channel(ListenerState::Stopped);
        Self {
            bind_addr: format!("{}:{}", settings.host.trim(), settings.port),
            callback: CallbackState {
                required_token,
                normalize: Arc::new(settings.normalize),
                platform: Arc::new(platform),
                dispatcher,
            },
            shutdown,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    fn router(&self) -> Router {
        Router::new()
            .route(CALLBACK_PATH, post(callback))
            .with_state(self.callback.clone())
    }

    /// Bind and serve until `terminate` is called and in-flight requests have finished.
    /// Bind failures are returned. Returns immediately when shutdown was already signaled.
    /// Dropping the returned future also leaves the listener `Stopped`.
    pub async fn run(&self) -> Result<()> {
        self.state.send_replace(ListenerState::Listening);
        let _stopped = StoppedOnDrop(self.state.clone());
        if *self.shutdown.borrow() {
            log::info!("google chat listener already terminated, not starting");
            return Ok(());
        }
        let listener = tokio::net::TcpListener::bind(&self.bind_addr)
            .await
            .with_context(|| format!("binding to {}", self.bind_addr))?;
        log::info!(
            "google chat adapter listening on {}{}",
            self.bind_addr,
            CALLBACK_PATH
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal(
                self.shutdown.subscribe(),
                self.state.clone(),
            ))
            .await
            .context("webhook server exited")?;
        log::info!("google chat listener stopped");
        Ok(())
    }

    /// Signal shutdown and wait until the listener is stopped. Idempotent; safe before `run`.
    pub async fn terminate(&self) {
        self.shutdown.send_replace(true);
        let mut state = self.state.subscribe();
        let _ = state.wait_for(|s| *s == ListenerState::Stopped).await;
    }
}

/// Moves the listener to `Stopped` however `run` exits, cancellation included.
struct StoppedOnDrop(Arc<watch::Sender<ListenerState>>);

impl Drop for StoppedOnDrop {
    fn drop(&mut self) {
        self.0.send_replace(ListenerState::Stopped);
    }
}

/// Completes once shutdown is signaled; the server then stops accepting and drains.
async fn shutdown_signal(
    mut shutdown: watch::Receiver<bool>,
    state: Arc<watch::Sender<ListenerState>>,
) {
    let _ = shutdown.wait_for(|stop| *stop).await;
    state.send_replace(ListenerState::Stopping);
    log::info!("shutdown signal received, draining connections");
}

/// POST /googlechat/callback — verifies the bearer token, normalizes, commits the event.
/// Always answers 200 once past auth, whether or not anything was dispatched.
async fn callback(
    State(state): State<CallbackState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookAck>) {
    if let Some(expected) = state.required_token.as_deref() {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if provided != Some(expected) {
            log::warn!("google chat verification failed");
            return (StatusCode::FORBIDDEN, Json(WebhookAck::rejected()));
        }
    }
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("google chat: ignoring callback with invalid JSON body: {}", e);
            return (StatusCode::OK, Json(WebhookAck::ok()));
        }
    };
    if let Some(message) = normalize(payload, &state.normalize) {
        log::debug!("google chat: dispatching message {}", message.message_id);
        state.dispatcher.commit(MessageEvent {
            platform: (*state.platform).clone(),
            message,
        });
    }
    (StatusCode::OK, Json(WebhookAck::ok()))
}
