//! recall-text
//!
//! Term-overlap lexical scoring. See `lexical` for the scoring rule.
pub mod lexical;

pub use lexical::LexicalIndex;
