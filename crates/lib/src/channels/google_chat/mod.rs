//! Google Chat adapter: webhook listener in, rendered cards/text out.
//!
//! `GoogleChatAdapter` owns the configuration and builds the listener and delivery client
//! once. The host supplies a `Dispatcher` for inbound events, an `ImageResolver` for
//! outbound images that are not public URLs yet, and optionally a `SendHook`.

pub mod delivery;
pub mod normalize;
pub mod payload;
pub mod render;

use crate::channels::host::{Dispatcher, ImageResolver, SendHook};
use crate::channels::inbound::{ContentPart, MessageEvent, PlatformMeta};
use crate::config::{self, GoogleChatConfig};
use crate::gateway::{ListenerSettings, ListenerState, WebhookServer};
use anyhow::Result;
use delivery::DeliveryClient;
use normalize::NormalizeContext;
use std::sync::Arc;

pub const PLATFORM_NAME: &str = "google_chat";
const PLATFORM_DESCRIPTION: &str = "Google Chat adapter";

pub struct GoogleChatAdapter {
    meta: PlatformMeta,
    server: WebhookServer,
    delivery: DeliveryClient,
    resolver: Arc<dyn ImageResolver>,
    send_hook: Option<Arc<dyn SendHook>>,
    /// Listener binds beyond loopback with no verification token.
    open_callback: bool,
}

impl GoogleChatAdapter {
    pub fn new(
        config: GoogleChatConfig,
        dispatcher: Arc<dyn Dispatcher>,
        resolver: Arc<dyn ImageResolver>,
    ) -> Self {
        let meta = PlatformMeta {
            name: PLATFORM_NAME.to_string(),
            description: PLATFORM_DESCRIPTION.to_string(),
            id: config.id.clone(),
        };
        let open_callback = config.token().is_none() && !config::is_loopback_bind(&config.host);
        let settings = ListenerSettings {
            verification_token: config.token().map(str::to_string),
            host: config.host,
            port: config.port,
            normalize: NormalizeContext {
                bot_name: config.bot_name,
                webhook_url: config.webhook_url.filter(|u| !u.trim().is_empty()),
            },
        };
        Self {
            server: WebhookServer::new(settings, meta.clone(), dispatcher),
            meta,
            delivery: DeliveryClient::new(),
            resolver,
            send_hook: None,
            open_callback,
        }
    }

    /// Host bookkeeping to run after every `send`.
    pub fn with_send_hook(mut self, hook: Arc<dyn SendHook>) -> Self {
        self.send_hook = Some(hook);
        self
    }

    pub fn meta(&self) -> &PlatformMeta {
        &self.meta
    }

    pub fn listener_state(&self) -> ListenerState {
        self.server.state()
    }

    /// Serve callbacks until `terminate`. Fails only when the listener cannot bind.
    pub async fn start(&self) -> Result<()> {
        log::info!("starting google chat adapter on {}", self.server.bind_addr());
        if self.open_callback {
            log::warn!(
                "google chat callback on {} accepts unauthenticated requests (no verificationToken)",
                self.server.bind_addr()
            );
        }
        self.server.run().await
    }

    /// Stop the listener and wait for in-flight requests to finish. Safe to call repeatedly.
    pub async fn terminate(&self) {
        self.server.terminate().await;
        log::info!("google chat adapter shutdown");
    }

    /// Render `parts` and POST them to `destination`. Returns whether the platform accepted
    /// the message; failures are logged, never returned as errors.
    pub async fn send(&self, destination: &str, parts: &[ContentPart]) -> bool {
        let payload = render::render(parts, self.resolver.as_ref()).await;
        let delivered = match self.delivery.deliver(destination, &payload).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("failed to send google chat message: {}", e);
                false
            }
        };
        if let Some(hook) = &self.send_hook {
            hook.after_send(destination, parts).await;
        }
        delivered
    }

    /// Answer an inbound event at its reply target.
    pub async fn reply(&self, event: &MessageEvent, parts: &[ContentPart]) -> bool {
        self.send(event.session_id(), parts).await
    }
}
