//! Error types for the SyncVoice controller

use thiserror::Error;

/// Voice controller errors
#[derive(Error, Debug, Clone)]
pub enum VoiceError {
    /// A platform capability (recognition or synthesis) is missing
    #[error("Unsupported capability: {0}")]
    Unsupported(String),

    /// Microphone access was refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Speech recognition failed (no speech, network, capture)
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis failed or was interrupted
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// The intent request never produced an HTTP response
    #[error("{0}")]
    Transport(String),

    /// The intent endpoint answered with a non-success status
    #[error("Server responded with status {status}")]
    HttpStatus { status: u16, body: String },

    /// The intent endpoint answered with something that is not an intent
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// A dashboard operation failed while executing an action
    #[error("{0}")]
    Action(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O error
    #[error("IO error: {0}")]
    Io(String),

    /// Channel communication error
    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<std::io::Error> for VoiceError {
    fn from(e: std::io::Error) -> Self {
        VoiceError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for VoiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            VoiceError::InvalidResponse(e.to_string())
        } else {
            VoiceError::Transport(e.to_string())
        }
    }
}

impl VoiceError {
    /// Check if the conversation loop may continue after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The control stays disabled for the page session
            VoiceError::Unsupported(_) => false,
            // Needs the user to change browser/OS settings
            VoiceError::PermissionDenied(_) => false,
            VoiceError::Recognition(_) => true,
            VoiceError::Synthesis(_) => true,
            VoiceError::Transport(_) => true,
            VoiceError::HttpStatus { .. } => true,
            VoiceError::InvalidResponse(_) => true,
            VoiceError::Action(_) => true,
            VoiceError::Config(_) => false,
            VoiceError::Io(_) => false,
            VoiceError::Channel(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            VoiceError::Unsupported(_) => {
                "Voice control is not supported in this browser.".to_string()
            }
            VoiceError::PermissionDenied(_) => {
                "Microphone access was denied. Please allow access to use voice control."
                    .to_string()
            }
            VoiceError::Recognition(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            VoiceError::Synthesis(_) => "Sorry, I couldn't speak the response.".to_string(),
            VoiceError::Transport(_)
            | VoiceError::HttpStatus { .. }
            | VoiceError::InvalidResponse(_) => format!(
                "Sorry, there was an error processing your command: {}. Please try again.",
                self
            ),
            VoiceError::Action(_) => format!(
                "Sorry, I encountered an error while trying to perform the action: {}",
                self
            ),
            VoiceError::Config(_) => "Configuration error. Please check settings.".to_string(),
            VoiceError::Io(_) => "File system error occurred.".to_string(),
            VoiceError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

/// Result type alias for SyncVoice operations
pub type Result<T> = std::result::Result<T, VoiceError>;
