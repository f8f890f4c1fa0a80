//! The retrieval-and-answer-composition pipeline.
//!
//! - [`classify`] - pure keyword classification (greetings, comprehensive
//!   and informational queries, mode tags)
//! - [`prompt`] - persona, mode blocks, formatting rules, prompt builders
//! - [`relevance`] - LLM relevance gate with a fail-closed parser
//! - [`flashcards`] - line-oriented parser for study-mode flashcard blocks
//! - [`orchestrator`] - the answer-composition state machine

pub mod classify;
pub mod flashcards;
pub mod orchestrator;
pub mod prompt;
pub mod relevance;
