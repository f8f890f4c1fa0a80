//! HTTP handlers. All core logic lives in [`crate::chat`]; these stay
//! thin: extract identity, validate input, delegate, map to JSON.

pub mod chat;
pub mod flashcards;
pub mod sessions;
