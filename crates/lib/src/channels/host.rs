//! Contracts the host application provides to an adapter: dispatch of inbound events,
//! image resolution for outbound content, and post-send bookkeeping.

use crate::channels::inbound::{ContentPart, MessageEvent};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receives normalized inbound events. Must return without waiting on the host.
pub trait Dispatcher: Send + Sync {
    fn commit(&self, event: MessageEvent);
}

/// Host queue: enqueue without blocking; a full or closed queue drops the event with a warning.
impl Dispatcher for mpsc::Sender<MessageEvent> {
    fn commit(&self, event: MessageEvent) {
        let id = event.message.message_id.clone();
        match self.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("dispatch queue full, dropping message {}", id);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::warn!("dispatch queue closed, dropping message {}", id);
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no public image base url configured")]
    NotConfigured,
    #[error("image reference has no file name: {0}")]
    InvalidReference(String),
    #[error("image upload failed: {0}")]
    Upload(String),
}

/// Turns an image reference that is not yet a public URL (e.g. a local file) into one.
#[async_trait]
pub trait ImageResolver: Send + Sync {
    async fn resolve(&self, reference: &str) -> Result<String, ResolveError>;
}

/// Shared bookkeeping the host runs after every outbound send, whatever the outcome.
#[async_trait]
pub trait SendHook: Send + Sync {
    async fn after_send(&self, destination: &str, parts: &[ContentPart]);
}

/// Resolves local files to `<base>/<file name>`, for hosts that already serve a directory publicly.
#[derive(Debug, Clone, Default)]
pub struct PublicBaseResolver {
    base_url: Option<String>,
}

impl PublicBaseResolver {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());
        Self { base_url }
    }
}

#[async_trait]
impl ImageResolver for PublicBaseResolver {
    async fn resolve(&self, reference: &str) -> Result<String, ResolveError> {
        let base = self.base_url.as_ref().ok_or(ResolveError::NotConfigured)?;
        let path = reference.strip_prefix("file://").unwrap_or(reference);
        let name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ResolveError::InvalidReference(reference.to_string()))?;
        Ok(format!("{}/{}", base, name))
    }
}
