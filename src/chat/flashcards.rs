//! Flashcard extraction from generated answers.
//!
//! Study-mode answers can embed flashcards in a delimited format:
//!
//! ```text
//! FLASHCARD_START
//! Q: question text
//! A: answer text
//! FLASHCARD_END
//! ```
//!
//! Parsing is a line-oriented state machine rather than a regex, so
//! malformed and nested input has well-defined behavior: a block is only
//! emitted when all four parts appear in order with non-empty question
//! and answer; anything partial is dropped.

use crate::models::Flashcard;

const BLOCK_START: &str = "FLASHCARD_START";
const BLOCK_END: &str = "FLASHCARD_END";
const QUESTION_PREFIX: &str = "Q:";
const ANSWER_PREFIX: &str = "A:";

enum ParseState {
    Outside,
    /// Inside a block, before the Q: line
    AwaitingQuestion,
    /// Accumulating question lines
    InQuestion,
    /// Accumulating answer lines
    InAnswer,
}

/// Extract all well-formed flashcard blocks from `text`, in order.
pub fn parse_flashcards(text: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut state = ParseState::Outside;
    let mut question = String::new();
    let mut answer = String::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();

        // A new start marker always begins a fresh block, discarding any
        // partial one (nested/unterminated blocks never emit cards).
        if line == BLOCK_START {
            state = ParseState::AwaitingQuestion;
            question.clear();
            answer.clear();
            continue;
        }

        match state {
            ParseState::Outside => {}
            ParseState::AwaitingQuestion => {
                if let Some(rest) = line.strip_prefix(QUESTION_PREFIX) {
                    question.push_str(rest.trim());
                    state = ParseState::InQuestion;
                } else if line == BLOCK_END {
                    // Block with no question: drop it
                    state = ParseState::Outside;
                }
            }
            ParseState::InQuestion => {
                if let Some(rest) = line.strip_prefix(ANSWER_PREFIX) {
                    answer.push_str(rest.trim());
                    state = ParseState::InAnswer;
                } else if line == BLOCK_END {
                    // Question without an answer: drop it
                    state = ParseState::Outside;
                    question.clear();
                } else if !line.is_empty() {
                    question.push(' ');
                    question.push_str(line);
                }
            }
            ParseState::InAnswer => {
                if line == BLOCK_END {
                    if !question.is_empty() && !answer.is_empty() {
                        cards.push(Flashcard {
                            question: std::mem::take(&mut question),
                            answer: std::mem::take(&mut answer),
                        });
                    }
                    question.clear();
                    answer.clear();
                    state = ParseState::Outside;
                } else if !line.is_empty() {
                    answer.push(' ');
                    answer.push_str(line);
                }
            }
        }
    }

    // EOF inside a block: the partial card is discarded
    cards
}
