//! Chat platform channels.
//!
//! `inbound` holds the canonical message the host receives, `host` the contracts the host
//! implements (dispatch, image resolution, post-send hook). Each platform adapter lives in
//! its own module.

pub mod google_chat;
pub mod host;
pub mod inbound;

pub use google_chat::GoogleChatAdapter;
pub use host::{Dispatcher, ImageResolver, PublicBaseResolver, ResolveError, SendHook};
pub use inbound::{CanonicalMessage, ContentPart, ConversationKind, MessageEvent, PlatformMeta, Sender};
