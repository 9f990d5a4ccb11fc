//! Session state for the voice controller
//!
//! The session is the single source of truth for:
//! - whether a recognition request is open
//! - the language used for recognition and speech
//! - the last assistant reply captured from the chat bus
//! - the controller state and its avatar projection
//!
//! It is owned by the controller and shared read-mostly through
//! `SharedSession` so a UI can render from snapshots.

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Visual state of the assistant avatar
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AvatarState {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}

impl AvatarState {
    /// Name used by the dashboard for styling (`avatar-<name>`)
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarState::Idle => "idle",
            AvatarState::Listening => "listening",
            AvatarState::Processing => "processing",
            AvatarState::Speaking => "speaking",
        }
    }
}

impl fmt::Display for AvatarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller state machine
///
/// `Idle -> Listening -> Processing -> Speaking -> Idle`, with
/// `Listening -> Idle` on error or abort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    #[default]
    Idle,
    Listening,
    Processing,
    Speaking,
}

impl ControllerState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ControllerState::Idle)
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, ControllerState::Listening)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, ControllerState::Processing)
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, ControllerState::Speaking)
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: ControllerState) -> bool {
        use ControllerState::*;

        if *self == next {
            return true;
        }

        matches!(
            (self, next),
            (Idle, Listening)
                | (Idle, Speaking)
                | (Idle, Processing)
                | (Listening, Processing)
                | (Listening, Idle)
                | (Processing, Speaking)
                | (Processing, Idle)
                | (Speaking, Idle)
        )
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "Idle"),
            ControllerState::Listening => write!(f, "Listening"),
            ControllerState::Processing => write!(f, "Processing"),
            ControllerState::Speaking => write!(f, "Speaking"),
        }
    }
}

/// Voice session state
#[derive(Clone, Debug)]
pub struct Session {
    is_listening: bool,
    current_lang: String,
    last_bot_reply: String,
    avatar: AvatarState,
    state: ControllerState,
    /// Set once when speech recognition is unavailable
    disabled: bool,
}

impl Session {
    /// Create a session speaking `lang`
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            is_listening: false,
            current_lang: lang.into(),
            last_bot_reply: String::new(),
            avatar: AvatarState::Idle,
            state: ControllerState::Idle,
            disabled: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.is_listening
    }

    pub fn current_lang(&self) -> &str {
        &self.current_lang
    }

    pub fn last_bot_reply(&self) -> &str {
        &self.last_bot_reply
    }

    pub fn avatar(&self) -> AvatarState {
        self.avatar
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    // === Mutations ===

    /// Mark a recognition request as open
    ///
    /// Returns false if one already is.
    pub fn begin_listening(&mut self) -> bool {
        if self.is_listening {
            return false;
        }
        self.is_listening = true;
        true
    }

    /// Close the recognition request
    ///
    /// Returns whether one was open.
    pub fn end_listening(&mut self) -> bool {
        std::mem::replace(&mut self.is_listening, false)
    }

    pub fn set_language(&mut self, lang: impl Into<String>) {
        self.current_lang = lang.into();
    }

    /// Store the latest assistant reply
    pub fn record_bot_reply(&mut self, reply: impl Into<String>) {
        self.last_bot_reply = reply.into();
    }

    /// Take the stored reply, leaving it empty
    pub fn take_bot_reply(&mut self) -> Option<String> {
        let reply = std::mem::take(&mut self.last_bot_reply);
        if reply.trim().is_empty() {
            None
        } else {
            Some(reply)
        }
    }

    pub fn set_avatar(&mut self, avatar: AvatarState) {
        self.avatar = avatar;
    }

    /// Move the state machine to `next`
    ///
    /// Illegal transitions are logged and ignored.
    pub fn enter(&mut self, next: ControllerState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!("Ignoring illegal transition {} -> {}", self.state, next);
            return false;
        }
        self.state = next;
        true
    }

    /// Permanently disable activation
    pub fn disable(&mut self) {
        self.disabled = true;
        self.is_listening = false;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_listening: self.is_listening,
            current_lang: self.current_lang.clone(),
            last_bot_reply: self.last_bot_reply.clone(),
            avatar: self.avatar,
            state: self.state,
            disabled: self.disabled,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("en-US")
    }
}

/// Immutable copy of the session for rendering and assertions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_listening: bool,
    pub current_lang: String,
    pub last_bot_reply: String,
    pub avatar: AvatarState,
    pub state: ControllerState,
    pub disabled: bool,
}

/// Thread-safe shared session
#[derive(Clone, Debug, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<Session>>,
}

impl SharedSession {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Session::new(lang))),
        }
    }

    /// Get a read lock on the session
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, Session> {
        self.inner.read()
    }

    /// Get a write lock on the session
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Session> {
        self.inner.write()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().snapshot()
    }

    // === Convenience read methods ===

    pub fn is_listening(&self) -> bool {
        self.inner.read().is_listening()
    }

    pub fn current_lang(&self) -> String {
        self.inner.read().current_lang().to_string()
    }

    pub fn last_bot_reply(&self) -> String {
        self.inner.read().last_bot_reply().to_string()
    }

    pub fn avatar(&self) -> AvatarState {
        self.inner.read().avatar()
    }

    pub fn state(&self) -> ControllerState {
        self.inner.read().state()
    }

    pub fn is_disabled(&self) -> bool {
        self.inner.read().is_disabled()
    }
}
