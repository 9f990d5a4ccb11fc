//! SyncVoice: voice command session controller for the InventorySync dashboard

pub mod bus;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod intent;
pub mod session;
pub mod shortcut;
pub mod speech;
pub mod ui;

pub use config::VoiceConfig;
pub use controller::{NextStep, VoiceController, VoiceControllerBuilder};
pub use error::{Result, VoiceError};
