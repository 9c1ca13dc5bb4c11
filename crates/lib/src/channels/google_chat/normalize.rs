//! Google Chat event → canonical message. Pure: no I/O, no clock.

use super::payload::{Attachment, ChatEvent, Space};
use crate::channels::inbound::{CanonicalMessage, ContentPart, ConversationKind, Sender};
use serde::Deserialize;

/// Event type that carries a user message.
pub const MESSAGE_EVENT_TYPE: &str = "MESSAGE";

/// Appended to the text once per accepted image attachment.
pub const IMAGE_MARKER: &str = " [image]";

const IMAGE_CONTENT_PREFIX: &str = "image/";

/// Adapter settings the normalizer needs.
#[derive(Debug, Clone, Default)]
pub struct NormalizeContext {
    /// Bot identity set as `self_id`.
    pub bot_name: String,
    /// Reply target used when the event carries no response URL.
    pub webhook_url: Option<String>,
}

/// Normalize one raw event. Returns `None` for anything that is not a user message.
pub fn normalize(payload: serde_json::Value, ctx: &NormalizeContext) -> Option<CanonicalMessage> {
    if !payload.is_object() {
        log::debug!("google chat: payload is not a JSON object");
        return None;
    }
    let event = match ChatEvent::deserialize(&payload) {
        Ok(e) => e,
        Err(e) => {
            log::debug!("google chat: payload is not an event object: {}", e);
            return None;
        }
    };
    normalize_event(&event, payload, ctx)
}

/// Normalize an already parsed event; `raw` is kept on the message as-is.
pub fn normalize_event(
    event: &ChatEvent,
    raw: serde_json::Value,
    ctx: &NormalizeContext,
) -> Option<CanonicalMessage> {
    if event.event_type.as_deref() != Some(MESSAGE_EVENT_TYPE) {
        log::debug!(
            "google chat: ignoring event type {}",
            event.event_type.as_deref().unwrap_or("<none>")
        );
        return None;
    }
    let message = event.message.clone().unwrap_or_default();
    let sender = message.sender.unwrap_or_default();

    let mut text = message.text.unwrap_or_default();
    let mut content_parts = Vec::new();
    if !text.is_empty() {
        content_parts.push(ContentPart::Text(text.clone()));
    }
    for url in message.attachments.iter().filter_map(image_url) {
        content_parts.push(ContentPart::image(url));
        text.push_str(IMAGE_MARKER);
    }

    let message_id = message
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Some(CanonicalMessage {
        message_id,
        sender: Sender {
            user_id: sender.name.unwrap_or_default(),
            display_name: sender.display_name.unwrap_or_default(),
        },
        conversation: classify(event.space.as_ref()),
        text,
        content_parts,
        reply_target: reply_target(event, ctx),
        self_id: ctx.bot_name.clone(),
        received_at: event_time(event.event_time.as_ref()),
        raw,
    })
}

/// URL of an image attachment: download, then image, then thumbnail link. `None` for
/// non-images and for images without any link.
fn image_url(attachment: &Attachment) -> Option<String> {
    let is_image = attachment
        .content_type
        .as_deref()
        .is_some_and(|t| t.starts_with(IMAGE_CONTENT_PREFIX));
    if !is_image {
        return None;
    }
    [
        &attachment.download_uri,
        &attachment.image_uri,
        &attachment.thumbnail_uri,
    ]
    .into_iter()
    .flatten()
    .find(|u| !u.is_empty())
    .cloned()
}

fn classify(space: Option<&Space>) -> ConversationKind {
    let Some(space) = space else {
        return ConversationKind::Direct;
    };
    let legacy_room = space.kind.as_deref() == Some("ROOM");
    let shared_space = matches!(space.space_type.as_deref(), Some("SPACE" | "GROUP_CHAT"));
    if legacy_room || shared_space {
        ConversationKind::Group {
            conversation_id: space.name.clone().unwrap_or_default(),
        }
    } else {
        ConversationKind::Direct
    }
}

fn reply_target(event: &ChatEvent, ctx: &NormalizeContext) -> String {
    event
        .response_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .or(ctx.webhook_url.as_deref())
        .unwrap_or_default()
        .to_string()
}

/// Only a JSON integer is a timestamp; strings, floats and anything else read as 0.
fn event_time(value: Option<&serde_json::Value>) -> i64 {
    match value {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| i64::try_from(u).unwrap_or(i64::MAX)))
            .unwrap_or(0),
        _ => 0,
    }
}
