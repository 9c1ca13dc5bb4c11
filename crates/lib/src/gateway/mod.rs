//! Gateway: the inbound HTTP side of the bridge.
//!
//! One route receives platform events; requests are authenticated with an optional bearer
//! token, normalized, and committed to the host's dispatcher. Shutdown is cooperative.

mod protocol;
mod server;

pub use protocol::WebhookAck;
pub use server::{ListenerSettings, ListenerState, WebhookServer, CALLBACK_PATH};
