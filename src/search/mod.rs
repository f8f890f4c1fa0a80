//! Namespace-scoped vector retrieval.

pub mod fanout;
pub mod vector;
