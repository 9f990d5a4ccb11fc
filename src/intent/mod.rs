//! Intent classification: wire types, the typed action set and the HTTP client

pub mod client;
pub mod types;

pub use client::{HttpIntentClient, IntentClient};
pub use types::{Intent, IntentResponse, VoiceCommandRequest, DEFAULT_RESPONSE};
