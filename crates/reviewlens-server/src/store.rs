//! Review and feedback persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reviewlens_core::{Result, Sentiment, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// A classified review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReview {
    pub id: u64,
    pub review_text: String,
    pub sentiment: Sentiment,
    /// Confidence percentage with two decimals
    pub probability: f64,
    pub created_at: DateTime<Utc>,
}

/// A reviewer correction and the model's confidence after applying it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: u64,
    pub review_text: String,
    pub original_sentiment: Sentiment,
    pub corrected_sentiment: Sentiment,
    pub feedback: Verdict,
    pub probability: f64,
    pub created_at: DateTime<Utc>,
}

/// A model switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSwitch {
    pub model_name: String,
    pub switched_at: DateTime<Utc>,
}

/// New feedback row, before an id is assigned
#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub review_text: String,
    pub original_sentiment: Sentiment,
    pub corrected_sentiment: Sentiment,
    pub feedback: Verdict,
    pub probability: f64,
}

/// Storage for reviews, feedback, and model switch history
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, text: &str, sentiment: Sentiment, probability: f64) -> Result<StoredReview>;

    /// Replace a review's text; `None` when the id is unknown
    async fn update_review(&self, id: u64, text: &str) -> Result<Option<StoredReview>>;

    /// Remove a review; `false` when the id is unknown
    async fn delete_review(&self, id: u64) -> Result<bool>;

    /// Reviews containing `keyword`, newest first
    async fn search_reviews(&self, keyword: &str, limit: usize) -> Result<Vec<StoredReview>>;

    /// Texts of the latest reviews, optionally of one label, newest first
    async fn recent_texts(&self, sentiment: Option<Sentiment>, limit: usize) -> Result<Vec<String>>;

    async fn record_feedback(&self, feedback: NewFeedback) -> Result<FeedbackRecord>;

    /// Latest feedback, newest first
    async fn recent_feedback(&self, limit: usize) -> Result<Vec<FeedbackRecord>>;

    async fn record_model_switch(&self, model_name: &str) -> Result<ModelSwitch>;

    /// Latest model switches, newest first
    async fn model_history(&self, limit: usize) -> Result<Vec<ModelSwitch>>;
}

/// Maximum model switches kept in memory
const MAX_HISTORY: usize = 100;

/// Default maximum reviews kept in memory
pub const MAX_REVIEWS: usize = 10_000;

/// Default maximum feedback records kept in memory
pub const MAX_FEEDBACK: usize = 10_000;

/// Process-local store
///
/// Every table is bounded; once full, the oldest rows are dropped first.
pub struct InMemoryStore {
    reviews: RwLock<VecDeque<StoredReview>>,
    feedback: RwLock<VecDeque<FeedbackRecord>>,
    history: RwLock<VecDeque<ModelSwitch>>,
    max_reviews: usize,
    max_feedback: usize,
    next_review_id: AtomicU64,
    next_feedback_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_REVIEWS, MAX_FEEDBACK)
    }

    /// Store keeping at most `max_reviews` reviews and `max_feedback` records
    pub fn with_capacity(max_reviews: usize, max_feedback: usize) -> Self {
        Self {
            reviews: RwLock::new(VecDeque::new()),
            feedback: RwLock::new(VecDeque::new()),
            history: RwLock::new(VecDeque::new()),
            max_reviews: max_reviews.max(1),
            max_feedback: max_feedback.max(1),
            next_review_id: AtomicU64::new(0),
            next_feedback_id: AtomicU64::new(0),
        }
    }

    pub fn review_count(&self) -> usize {
        self.reviews.read().len()
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, text: &str, sentiment: Sentiment, probability: f64) -> Result<StoredReview> {
        let review = StoredReview {
            id: self.next_review_id.fetch_add(1, Ordering::SeqCst) + 1,
            review_text: text.to_string(),
            sentiment,
            probability,
            created_at: Utc::now(),
        };
        push_bounded(&mut self.reviews.write(), review.clone(), self.max_reviews);
        Ok(review)
    }

    async fn update_review(&self, id: u64, text: &str) -> Result<Option<StoredReview>> {
        let mut reviews = self.reviews.write();
        Ok(reviews.iter_mut().find(|r| r.id == id).map(|review| {
            review.review_text = text.to_string();
            review.clone()
        }))
    }

    async fn delete_review(&self, id: u64) -> Result<bool> {
        let mut reviews = self.reviews.write();
        let before = reviews.len();
        reviews.retain(|r| r.id != id);
        Ok(reviews.len() != before)
    }

    async fn search_reviews(&self, keyword: &str, limit: usize) -> Result<Vec<StoredReview>> {
        let reviews = self.reviews.read();
        Ok(reviews
            .iter()
            .rev()
            .filter(|r| r.review_text.contains(keyword))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent_texts(&self, sentiment: Option<Sentiment>, limit: usize) -> Result<Vec<String>> {
        let reviews = self.reviews.read();
        Ok(reviews
            .iter()
            .rev()
            .filter(|r| sentiment.map_or(true, |s| r.sentiment == s))
            .take(limit)
            .map(|r| r.review_text.clone())
            .collect())
    }

    async fn record_feedback(&self, feedback: NewFeedback) -> Result<FeedbackRecord> {
        let record = FeedbackRecord {
            id: self.next_feedback_id.fetch_add(1, Ordering::SeqCst) + 1,
            review_text: feedback.review_text,
            original_sentiment: feedback.original_sentiment,
            corrected_sentiment: feedback.corrected_sentiment,
            feedback: feedback.feedback,
            probability: feedback.probability,
            created_at: Utc::now(),
        };
        push_bounded(&mut self.feedback.write(), record.clone(), self.max_feedback);
        Ok(record)
    }

    async fn recent_feedback(&self, limit: usize) -> Result<Vec<FeedbackRecord>> {
        let feedback = self.feedback.read();
        Ok(feedback.iter().rev().take(limit).cloned().collect())
    }

    async fn record_model_switch(&self, model_name: &str) -> Result<ModelSwitch> {
        let switch = ModelSwitch {
            model_name: model_name.to_string(),
            switched_at: Utc::now(),
        };

        push_bounded(&mut self.history.write(), switch.clone(), MAX_HISTORY);
        Ok(switch)
    }

    async fn model_history(&self, limit: usize) -> Result<Vec<ModelSwitch>> {
        let history = self.history.read();
        Ok(history.iter().rev().take(limit).cloned().collect())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded<T>(rows: &mut VecDeque<T>, row: T, max: usize) {
    rows.push_back(row);
    while rows.len() > max {
        rows.pop_front();
    }
}
