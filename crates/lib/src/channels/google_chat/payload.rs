//! Google Chat wire types: inbound event (subset the adapter reads) and outbound message body.
//!
//! Inbound fields are all optional and lenient: a field carrying the wrong JSON type is
//! treated as absent, so one odd field never rejects a whole event.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// Deserialize any JSON value, falling back to `T::default()` when it does not fit `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize a JSON array item by item, skipping items that do not fit `T`.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Interaction event POSTed to the callback URL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    /// "MESSAGE", "ADDED_TO_SPACE", "REMOVED_FROM_SPACE", "CARD_CLICKED", ...
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub event_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<ChatMessage>,
    #[serde(default, deserialize_with = "lenient")]
    pub space: Option<Space>,
    /// Per-event endpoint for the reply, when the platform provides one.
    #[serde(default, deserialize_with = "lenient")]
    pub response_url: Option<String>,
    /// Kept raw: only an integer value counts as a timestamp.
    #[serde(default)]
    pub event_time: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Resource name, e.g. "spaces/AAA/messages/BBB".
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub sender: Option<User>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Resource name, e.g. "users/123".
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default, deserialize_with = "lenient")]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub download_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub thumbnail_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// Resource name, e.g. "spaces/AAA".
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Legacy kind: "ROOM" or "DM".
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    /// Current kind: "SPACE", "GROUP_CHAT" or "DIRECT_MESSAGE".
    #[serde(default, deserialize_with = "lenient")]
    pub space_type: Option<String>,
}

/// Outbound message body. `text` and `cards` are each omitted when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Card>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub widgets: Vec<Widget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub image: ImageWidget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageWidget {
    pub image_url: String,
}

impl RenderPayload {
    /// Image URLs in widget order.
    pub fn image_urls(&self) -> Vec<&str> {
        self.cards
            .iter()
            .flatten()
            .flat_map(|c| &c.sections)
            .flat_map(|s| &s.widgets)
            .map(|w| w.image.image_url.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrong_typed_fields_read_as_absent() {
        let event: ChatEvent = serde_json::from_value(json!({
            "type": 7,
            "message": {
                "text": ["not", "text"],
                "sender": "users/1",
                "attachments": [{"contentType": 12, "downloadUri": "https://d/1.png"}]
            },
            "space": null,
            "responseUrl": false
        }))
        .unwrap();
        assert!(event.event_type.is_none());
        assert!(event.space.is_none());
        assert!(event.response_url.is_none());
        let message = event.message.unwrap();
        assert!(message.text.is_none());
        assert!(message.sender.is_none());
        assert_eq!(message.attachments.len(), 1);
        assert!(message.attachments[0].content_type.is_none());
        assert_eq!(
            message.attachments[0].download_uri.as_deref(),
            Some("https://d/1.png")
        );
    }

    #[test]
    fn malformed_attachment_items_are_skipped() {
        let message: ChatMessage = serde_json::from_value(json!({
            "attachments": ["bogus", {"contentType": "image/png", "imageUri": "https://i/1.png"}]
        }))
        .unwrap();
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(
            message.attachments[0].image_uri.as_deref(),
            Some("https://i/1.png")
        );
    }

    #[test]
    fn non_array_attachments_read_as_empty() {
        let message: ChatMessage =
            serde_json::from_value(json!({"attachments": {"contentType": "image/png"}})).unwrap();
        assert!(message.attachments.is_empty());
    }

    #[test]
    fn render_payload_wire_shape() {
        let payload = RenderPayload {
            text: Some("hi".to_string()),
            cards: Some(vec![Card {
                sections: vec![Section {
                    widgets: vec![Widget {
                        image: ImageWidget {
                            image_url: "https://x/y.png".to_string(),
                        },
                    }],
                }],
            }]),
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "text": "hi",
                "cards": [{"sections": [{"widgets": [{"image": {"imageUrl": "https://x/y.png"}}]}]}]
            })
        );
        assert_eq!(payload.image_urls(), vec!["https://x/y.png"]);
    }

    #[test]
    fn unset_fields_are_omitted() {
        assert_eq!(
            serde_json::to_value(RenderPayload::default()).unwrap(),
            json!({})
        );
    }
}
