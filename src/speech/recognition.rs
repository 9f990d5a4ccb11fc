//! Speech recognition contract
//!
//! The recognizer itself is a platform service; this module defines how
//! the controller talks to it and how its failures are worded.

use crate::{Result, VoiceError};
use async_trait::async_trait;
use std::fmt;

/// Parameters for one recognition request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// BCP-47 language tag
    pub lang: String,
    /// Only final results are reported
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl RecognitionRequest {
    /// Single-shot request: final result only, one alternative
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// Failure codes reported by the recognition service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionErrorCode {
    NoSpeech,
    AudioCapture,
    NotAllowed,
    Network,
    /// Caused by an intentional stop
    Aborted,
    ServiceNotAllowed,
    BadGrammar,
    LanguageNotSupported,
    Other(String),
}

impl RecognitionErrorCode {
    /// Parse a service error code such as `no-speech`
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "not-allowed" => Self::NotAllowed,
            "network" => Self::Network,
            "aborted" => Self::Aborted,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "bad-grammar" => Self::BadGrammar,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::AudioCapture => "audio-capture",
            Self::NotAllowed => "not-allowed",
            Self::Network => "network",
            Self::Aborted => "aborted",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::BadGrammar => "bad-grammar",
            Self::LanguageNotSupported => "language-not-supported",
            Self::Other(code) => code,
        }
    }

    /// What to tell the user, `None` for an intentional abort
    pub fn spoken_message(&self) -> Option<&'static str> {
        let message = match self {
            Self::Aborted => return None,
            Self::NoSpeech => "I didn't hear anything. Please try speaking again.",
            Self::AudioCapture => "I couldn't access the microphone. Please check permissions.",
            Self::NotAllowed => {
                "Microphone access was denied. Please allow access to use voice control."
            }
            Self::Network => "A network error occurred during speech recognition.",
            Self::ServiceNotAllowed | Self::BadGrammar => {
                "There seems to be an issue with the voice recognition service."
            }
            Self::LanguageNotSupported | Self::Other(_) => {
                "An unknown speech recognition error occurred."
            }
        };
        Some(message)
    }

    /// Error category for logging and recoverability
    pub fn to_error(&self) -> VoiceError {
        match self {
            Self::NotAllowed | Self::ServiceNotAllowed => {
                VoiceError::PermissionDenied(self.as_str().to_string())
            }
            _ => VoiceError::Recognition(self.as_str().to_string()),
        }
    }
}

impl fmt::Display for RecognitionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one recognition request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Best final transcript
    Transcript(String),
    /// Service reported an error
    Error(RecognitionErrorCode),
    /// Service ended without a result or error
    Ended,
}

/// Platform speech recognition service
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// False when the platform has no recognition support
    fn is_available(&self) -> bool {
        true
    }

    /// Run one request to completion
    ///
    /// `Err` means the request could not be started at all. Once started,
    /// every request produces exactly one outcome.
    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionOutcome>;

    /// Stop an open request; it resolves with `Error(Aborted)`
    fn abort(&self);
}
