//! ReviewLens Core
//!
//! Types and error handling shared across ReviewLens components.
//!
//! This crate provides:
//! - Sentiment labels, reviewer verdicts, and classification results
//! - The error type every other crate propagates
//! - Keyword count records returned by the keyword engine

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{
    decode_document, to_percent, ClassScores, Classification, FeedbackOutcome, KeywordCount,
    Sentiment, Verdict,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Classification, FeedbackOutcome, KeywordCount, Sentiment, Verdict};
}
