//! Answer synthesis: a single non-streaming chat completion over the composed evidence.

pub(crate) mod client;
mod credential;
pub(crate) mod prompt;
mod types;

pub use client::{GroqClient, Synthesizer};
pub use credential::{AuthError, Credential};
pub use prompt::{DEFAULT_MODEL, SynthesisConfig};
