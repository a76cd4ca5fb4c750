//! ReviewLens Keywords
//!
//! Turns review text into normalized keyword tokens and ranks them across
//! document batches.
//!
//! The pipeline is:
//! - lowercase the text
//! - run a [`MorphAnalyzer`] to lemmatize and tag each morpheme
//! - keep nouns and adjectives longer than one character
//! - drop domain stopwords
//!
//! Ranking touches no shared mutable state, so independent calls run in
//! parallel freely.

pub mod analyzer;
pub mod extractor;
pub mod stopwords;

pub use analyzer::{KoDicAnalyzer, MorphAnalyzer, Morpheme, PartOfSpeech, KO_DIC_URI};
pub use extractor::{KeywordExtractor, KeywordToken};
pub use stopwords::{StopWords, DEFAULT_STOPWORDS};
