//! Speech input and output
//!
//! This module provides:
//! - Recognition contract and error wording
//! - Synthesis contract and the `Speaker` that serializes output

pub mod recognition;
pub mod synthesis;

// Re-export commonly used types
pub use recognition::{RecognitionErrorCode, RecognitionOutcome, RecognitionRequest, Recognizer};
pub use synthesis::{describe_synthesis_error, Speaker, Synthesizer, Utterance};
