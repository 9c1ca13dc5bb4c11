//! Canonical message: the platform-agnostic form of one inbound event, delivered to the host.

use serde::Serialize;

/// Who sent a message. Fields are empty when the platform omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub user_id: String,
    pub display_name: String,
}

/// Addressing scope of a conversation. A conversation id exists only for groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConversationKind {
    /// One correspondent.
    #[default]
    Direct,
    /// Shared room or space, identified by the platform's space name.
    Group { conversation_id: String },
}

impl ConversationKind {
    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            ConversationKind::Direct => None,
            ConversationKind::Group { conversation_id } => Some(conversation_id),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ConversationKind::Group { .. })
    }
}

/// One piece of message content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContentPart {
    Text(String),
    /// `source` is a public URL, or a reference an `ImageResolver` can turn into one.
    Image { source: String },
}

impl ContentPart {
    pub fn text(s: impl Into<String>) -> Self {
        ContentPart::Text(s.into())
    }

    pub fn image(source: impl Into<String>) -> Self {
        ContentPart::Image {
            source: source.into(),
        }
    }
}

/// A message from the platform, normalized. Immutable once handed to the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalMessage {
    /// Platform message name, or a freshly minted UUID when the platform sends none.
    pub message_id: String,
    pub sender: Sender,
    pub conversation: ConversationKind,
    /// Plain text plus one ` [image]` marker per accepted image attachment.
    pub text: String,
    pub content_parts: Vec<ContentPart>,
    /// Opaque outbound address (per-event response URL or configured webhook). May be empty.
    pub reply_target: String,
    /// The bot's own identity.
    pub self_id: String,
    /// Original payload, for diagnostics only.
    pub raw: serde_json::Value,
    /// Event time when the platform sent it as an integer, else 0.
    pub received_at: i64,
}

/// Identity of the adapter that produced an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformMeta {
    pub name: String,
    pub description: String,
    pub id: Option<String>,
}

/// What the host receives: a canonical message tagged with its platform.
#[derive(Debug, Clone, Serialize)]
pub struct MessageEvent {
    pub platform: PlatformMeta,
    pub message: CanonicalMessage,
}

impl MessageEvent {
    /// Session key for replies; same as the message's reply target.
    pub fn session_id(&self) -> &str {
        &self.message.reply_target
    }

    /// Message text including image markers.
    pub fn message_str(&self) -> &str {
        &self.message.text
    }
}
