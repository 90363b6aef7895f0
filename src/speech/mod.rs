//! Speech Output
//!
//! Text-to-speech synthesis for replies played back into the call.

mod service;

pub use service::SpeechSynthesizer;
