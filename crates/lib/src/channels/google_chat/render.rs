//! Content parts → Google Chat message body.
//!
//! Text parts are concatenated in order. Images that are already public URLs go straight
//! into image widgets; anything else is handed to the host's `ImageResolver` first.
//! Resolutions run concurrently and a failed one only drops that image.

use super::payload::{Card, ImageWidget, RenderPayload, Section, Widget};
use crate::channels::host::ImageResolver;
use crate::channels::inbound::ContentPart;
use futures_util::future::join_all;

/// Build the body for one outbound send. Never fails; unresolved images are logged and skipped.
pub async fn render(parts: &[ContentPart], resolver: &dyn ImageResolver) -> RenderPayload {
    let mut text = String::new();
    let mut images = Vec::new();
    for part in parts {
        match part {
            ContentPart::Text(t) => text.push_str(t),
            ContentPart::Image { source } => images.push(source.as_str()),
        }
    }

    let resolved = join_all(images.into_iter().map(|source| resolve_image(source, resolver))).await;
    let widgets: Vec<Widget> = resolved
        .into_iter()
        .flatten()
        .map(|image_url| Widget {
            image: ImageWidget { image_url },
        })
        .collect();

    let cards = if widgets.is_empty() {
        None
    } else {
        Some(vec![Card {
            sections: vec![Section { widgets }],
        }])
    };
    let text = if !text.is_empty() || cards.is_none() {
        Some(text)
    } else {
        None
    };
    RenderPayload { text, cards }
}

async fn resolve_image(source: &str, resolver: &dyn ImageResolver) -> Option<String> {
    if is_public_url(source) {
        return Some(source.to_string());
    }
    match resolver.resolve(source).await {
        Ok(url) => Some(url),
        Err(e) => {
            log::warn!("google chat: dropping image {}: {}", source, e);
            None
        }
    }
}

/// Absolute http(s) URL with a host.
fn is_public_url(source: &str) -> bool {
    reqwest::Url::parse(source)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::host::ResolveError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolves `*.png` references under a fixed base and rejects everything else.
    #[derive(Default)]
    struct PngResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageResolver for PngResolver {
        async fn resolve(&self, reference: &str) -> Result<String, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if reference.ends_with(".png") {
                Ok(format!("https://cdn.example/{}", reference.trim_start_matches('/')))
            } else {
                Err(ResolveError::Upload(format!("unsupported: {}", reference)))
            }
        }
    }

    #[tokio::test]
    async fn text_and_public_image() {
        let resolver = PngResolver::default();
        let payload = render(
            &[ContentPart::text("hi"), ContentPart::image("https://x/y.png")],
            &resolver,
        )
        .await;
        assert_eq!(payload.text.as_deref(), Some("hi"));
        assert_eq!(payload.image_urls(), vec!["https://x/y.png"]);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_parts_render_empty_text() {
        let payload = render(&[], &PngResolver::default()).await;
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"text": ""})
        );
    }

    #[tokio::test]
    async fn text_parts_concatenate_without_separator() {
        let payload = render(
            &[
                ContentPart::text("a"),
                ContentPart::image("https://x/1.png"),
                ContentPart::text("b "),
                ContentPart::text("c"),
            ],
            &PngResolver::default(),
        )
        .await;
        assert_eq!(payload.text.as_deref(), Some("ab c"));
    }

    #[tokio::test]
    async fn images_only_omit_text() {
        let payload = render(&[ContentPart::image("/tmp/a.png")], &PngResolver::default()).await;
        assert_eq!(payload.text, None);
        assert_eq!(payload.image_urls(), vec!["https://cdn.example/tmp/a.png"]);
    }

    #[tokio::test]
    async fn failed_images_are_dropped_and_order_kept() {
        let resolver = PngResolver::default();
        let payload = render(
            &[
                ContentPart::image("/tmp/first.png"),
                ContentPart::image("/tmp/broken.bmp"),
                ContentPart::image("http://x/third.jpg"),
                ContentPart::image("/tmp/fourth.png"),
            ],
            &resolver,
        )
        .await;
        assert_eq!(
            payload.image_urls(),
            vec![
                "https://cdn.example/tmp/first.png",
                "http://x/third.jpg",
                "https://cdn.example/tmp/fourth.png",
            ]
        );
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
        assert_eq!(payload.cards.as_ref().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn all_images_failing_falls_back_to_empty_text() {
        let payload = render(&[ContentPart::image("chart.bmp")], &PngResolver::default()).await;
        assert_eq!(payload.cards, None);
        assert_eq!(payload.text.as_deref(), Some(""));
    }

    #[test]
    fn public_url_detection() {
        assert!(is_public_url("https://x/y.png"));
        assert!(is_public_url("http://x"));
        assert!(!is_public_url("ftp://x/y.png"));
        assert!(!is_public_url("/tmp/y.png"));
        assert!(!is_public_url("file:///tmp/y.png"));
        assert!(!is_public_url("y.png"));
    }
}
