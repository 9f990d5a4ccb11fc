//! Chat message bus
//!
//! The chat component publishes every message it renders; the voice
//! controller subscribes and keeps the latest assistant reply so it can be
//! read aloud on request.

use crate::{Result, VoiceError};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A chat message as published on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEvent {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }
}

/// Sending half, held by the chat component
#[derive(Clone)]
pub struct ChatPublisher {
    tx: Sender<ChatEvent>,
}

impl ChatPublisher {
    /// Publish without blocking; a full bus drops the event
    pub fn publish(&self, event: ChatEvent) -> Result<()> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => VoiceError::Channel("chat bus is full".into()),
            TrySendError::Disconnected(_) => {
                VoiceError::Channel("chat bus subscriber is gone".into())
            }
        })
    }

    pub fn publish_assistant_reply(&self, text: impl Into<String>) -> Result<()> {
        self.publish(ChatEvent::assistant(text))
    }

    pub fn publish_user_message(&self, text: impl Into<String>) -> Result<()> {
        self.publish(ChatEvent::user(text))
    }
}

/// Receiving half, held by the voice controller
pub struct ChatSubscriber {
    rx: Receiver<ChatEvent>,
}

impl ChatSubscriber {
    /// Drain pending events and return the newest non-empty assistant reply
    pub fn latest_assistant_reply(&self) -> Option<String> {
        self.rx
            .try_iter()
            .filter(|event| event.role == ChatRole::Assistant)
            .map(|event| event.text)
            .filter(|text| !text.trim().is_empty())
            .last()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

/// Create a bus with room for `capacity` unread events
pub fn chat_bus(capacity: usize) -> (ChatPublisher, ChatSubscriber) {
    let (tx, rx) = bounded(capacity);
    (ChatPublisher { tx }, ChatSubscriber { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_assistant_reply_wins() {
        let (publisher, subscriber) = chat_bus(10);
        publisher.publish_user_message("what sold best?").unwrap();
        publisher.publish_assistant_reply("Brand A.").unwrap();
        publisher.publish_user_message("and last week?").unwrap();
        publisher.publish_assistant_reply("Brand B.").unwrap();

        assert_eq!(subscriber.latest_assistant_reply(), Some("Brand B.".into()));
        assert_eq!(subscriber.pending(), 0);
        assert_eq!(subscriber.latest_assistant_reply(), None);
    }

    #[test]
    fn test_user_messages_only() {
        let (publisher, subscriber) = chat_bus(10);
        publisher.publish_user_message("hello").unwrap();
        assert_eq!(subscriber.latest_assistant_reply(), None);
    }

    #[test]
    fn test_full_bus_reports_error() {
        let (publisher, _subscriber) = chat_bus(1);
        publisher.publish_assistant_reply("one").unwrap();
        let err = publisher.publish_assistant_reply("two").unwrap_err();
        assert!(matches!(err, VoiceError::Channel(_)));
    }

    #[test]
    fn test_disconnected_bus() {
        let (publisher, subscriber) = chat_bus(1);
        drop(subscriber);
        assert!(publisher.publish_assistant_reply("anyone?").is_err());
    }
}
