//! Core types for ReviewLens

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binary sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    /// Both labels in class-index order
    pub const ALL: [Sentiment; 2] = [Sentiment::Negative, Sentiment::Positive];

    /// Class index used by model artifacts (negative = 0, positive = 1)
    pub fn index(self) -> usize {
        match self {
            Self::Negative => 0,
            Self::Positive => 1,
        }
    }

    /// The opposite label
    pub fn flipped(self) -> Self {
        match self {
            Self::Negative => Self::Positive,
            Self::Positive => Self::Negative,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Positive => "positive",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            _ => Err(Error::invalid_label(format!("unknown sentiment '{s}'"))),
        }
    }
}

/// Reviewer verdict on a previous classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    /// Label the model should learn, given the label it originally produced
    pub fn corrected(self, original: Sentiment) -> Sentiment {
        match self {
            Self::Correct => original,
            Self::Incorrect => original.flipped(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(Self::Correct),
            "incorrect" => Ok(Self::Incorrect),
            _ => Err(Error::invalid_label(format!("unknown feedback verdict '{s}'"))),
        }
    }
}

/// Per-class probabilities produced by a classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub negative: f32,
    pub positive: f32,
}

impl ClassScores {
    /// Build from a positive-class probability
    pub fn from_positive(positive: f32) -> Self {
        let positive = positive.clamp(0.0, 1.0);
        Self {
            negative: 1.0 - positive,
            positive,
        }
    }

    /// Probability assigned to `label`
    pub fn get(&self, label: Sentiment) -> f32 {
        match label {
            Sentiment::Negative => self.negative,
            Sentiment::Positive => self.positive,
        }
    }

    /// Highest-probability label; ties go to positive
    pub fn argmax(&self) -> Sentiment {
        if self.positive >= self.negative {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }
}

/// Result of classifying one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Predicted label
    pub label: Sentiment,

    /// Probability of the predicted label (0.0-1.0)
    pub confidence: f32,

    /// All class probabilities
    pub scores: ClassScores,

    /// Name of the model version that produced this result
    pub model: String,
}

impl Classification {
    /// Create a classification from class scores
    pub fn from_scores(scores: ClassScores, model: impl Into<String>) -> Self {
        let label = scores.argmax();
        Self {
            label,
            confidence: scores.get(label),
            scores,
            model: model.into(),
        }
    }

    /// Confidence as a percentage rounded to two decimals
    pub fn percent(&self) -> f64 {
        to_percent(self.confidence)
    }
}

/// Outcome of folding one reviewer correction into the active model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    /// Label the model originally reported
    pub original: Sentiment,

    /// Label the model was trained toward
    pub corrected: Sentiment,

    pub verdict: Verdict,

    /// Probability the model gave `corrected` before the update
    pub confidence_before: f32,

    /// Classification of the same text after the update
    pub after: Classification,
}

/// A keyword and how often it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: usize,
}

impl KeywordCount {
    pub fn new(keyword: impl Into<String>, count: usize) -> Self {
        Self {
            keyword: keyword.into(),
            count,
        }
    }
}

/// Decode raw request bytes into document text
pub fn decode_document(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::transform(format!("document is not valid UTF-8: {e}")))
}

/// Convert a probability into a percentage with two decimals
pub fn to_percent(probability: f32) -> f64 {
    (f64::from(probability) * 10_000.0).round() / 100.0
}
