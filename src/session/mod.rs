//! Voice session state and the controller state machine

pub mod state;

pub use state::{AvatarState, ControllerState, Session, SessionSnapshot, SharedSession};
