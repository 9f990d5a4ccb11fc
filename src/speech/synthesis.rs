//! Speech synthesis with cancel-then-restart semantics
//!
//! At most one utterance plays at a time. Starting a new one while another
//! is in flight cancels the old one and waits a short grace period before
//! the new one starts, so audio never overlaps.

use crate::session::AvatarState;
use crate::ui::Avatar;
use crate::{Result, VoiceError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A single piece of text to speak
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    /// BCP-47 language tag
    pub lang: String,
    pub volume: f32,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    /// Full volume, normal rate and pitch
    pub fn new(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            lang: lang.into(),
            volume: 1.0,
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// Platform speech synthesis service
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// False when the platform has no synthesis support
    fn is_available(&self) -> bool {
        true
    }

    /// Whether an utterance is currently playing
    fn is_speaking(&self) -> bool;

    /// Play an utterance to completion
    ///
    /// Failures are reported as `VoiceError::Synthesis` carrying the
    /// service error code (`interrupted`, `synthesis-failed`, ...).
    async fn speak(&self, utterance: Utterance) -> Result<()>;

    /// Stop the current utterance; its `speak` call resolves with an error
    fn cancel(&self);
}

/// User-facing wording for a synthesis error code
///
/// Interruptions caused by our own cancel are expected and map to `None`.
pub fn describe_synthesis_error(code: &str, lang: &str) -> Option<String> {
    match code {
        "interrupted" | "canceled" => None,
        "language-unavailable" => Some(format!(
            "Sorry, the language {} is not available for speaking.",
            lang
        )),
        "synthesis-failed" => Some("Sorry, there was an error generating the speech.".to_string()),
        _ => Some("Sorry, I couldn't speak the response.".to_string()),
    }
}

/// Serializes speech output and keeps the avatar in sync
#[derive(Clone)]
pub struct Speaker {
    synth: Arc<dyn Synthesizer>,
    grace: Duration,
    avatar: Avatar,
}

impl Speaker {
    pub fn new(synth: Arc<dyn Synthesizer>, grace: Duration, avatar: Avatar) -> Self {
        Self {
            synth,
            grace,
            avatar,
        }
    }

    pub fn is_available(&self) -> bool {
        self.synth.is_available()
    }

    /// Speak `text` in `lang`
    ///
    /// Resolves exactly once. The avatar is back to idle afterwards
    /// whatever the outcome.
    pub async fn speak(&self, text: &str, lang: &str) -> Result<()> {
        if !self.synth.is_available() {
            error!("Speech Synthesis not supported.");
            return Err(VoiceError::Unsupported("speech synthesis".into()));
        }

        if self.synth.is_speaking() {
            debug!("Cancelling previous speech...");
            self.synth.cancel();
            tokio::time::sleep(self.grace).await;
        }

        let utterance = Utterance::new(text, lang);
        info!("Speaking: {:?} in {}", text, lang);
        self.avatar.set(AvatarState::Speaking);

        let result = self.synth.speak(utterance).await;
        self.avatar.set(AvatarState::Idle);

        match &result {
            Ok(()) => debug!("Finished speaking."),
            Err(VoiceError::Synthesis(code)) => match describe_synthesis_error(code, lang) {
                Some(message) => warn!("Speech synthesis error: {} ({})", code, message),
                None => debug!("Speech {} before finishing", code),
            },
            Err(e) => warn!("Speech synthesis error: {}", e),
        }

        result
    }

    /// Stop any utterance in flight
    pub fn cancel(&self) {
        if self.synth.is_speaking() {
            debug!("Cancelling speech");
            self.synth.cancel();
        }
    }
}
