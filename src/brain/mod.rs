//! Reply Brain
//!
//! Generative-AI inference for turning a voice note into a short spoken
//! reply. One hosted backend: Google Gemini with inline audio.

mod gemini;

pub use gemini::GeminiClient;
