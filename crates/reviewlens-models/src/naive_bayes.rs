//! Multinomial naive Bayes over TF-IDF weights

use reviewlens_core::{ClassScores, Error, Result, Sentiment};
use serde::{Deserialize, Serialize};

use crate::artifact::ClassifierArtifact;
use crate::classifier::{ensure_dimension, sigmoid, IncrementalModel, SentimentModel};
use crate::sparse::SparseVector;

/// Multinomial naive Bayes with additive smoothing
///
/// Counts are indexed by class (negative = 0, positive = 1). Online updates
/// add the example's feature weights to its class row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNbModel {
    /// Accumulated feature weight per class and column
    pub feature_count: Vec<Vec<f64>>,

    /// Examples seen per class
    pub class_count: Vec<f64>,

    /// Additive (Laplace/Lidstone) smoothing
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl MultinomialNbModel {
    pub fn new(dimension: usize, alpha: f64) -> Self {
        Self {
            feature_count: vec![vec![0.0; dimension]; 2],
            class_count: vec![0.0; 2],
            alpha,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.feature_count.len() != 2 || self.class_count.len() != 2 {
            return Err(Error::config("naive Bayes artifact must have exactly two classes"));
        }
        if self.feature_count[0].len() != self.feature_count[1].len() {
            return Err(Error::config("naive Bayes class rows differ in width"));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(Error::config(format!("alpha must be positive, got {}", self.alpha)));
        }
        let counts_ok = self
            .feature_count
            .iter()
            .flatten()
            .chain(self.class_count.iter())
            .all(|c| c.is_finite() && *c >= 0.0);
        if !counts_ok {
            return Err(Error::config("naive Bayes counts must be finite and non-negative"));
        }
        Ok(())
    }

    /// Joint log likelihood of `features` under class `class`
    fn joint_log_likelihood(&self, features: &SparseVector, class: usize) -> f64 {
        let row = &self.feature_count[class];
        let dimension = row.len() as f64;
        let row_total: f64 = row.iter().sum::<f64>() + self.alpha * dimension;

        let total: f64 = self.class_count.iter().sum();
        let log_prior = if total > 0.0 {
            // Smoothed so a class with no examples stays finite
            ((self.class_count[class] + 1.0) / (total + 2.0)).ln()
        } else {
            0.5f64.ln()
        };

        let log_likelihood: f64 = features
            .iter()
            .map(|(col, value)| value * ((row[col] + self.alpha) / row_total).ln())
            .sum();

        log_prior + log_likelihood
    }
}

impl SentimentModel for MultinomialNbModel {
    fn kind(&self) -> &str {
        "multinomial_nb"
    }

    fn dimension(&self) -> usize {
        self.feature_count.first().map_or(0, Vec::len)
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<ClassScores> {
        ensure_dimension(self.dimension(), features)?;

        let negative = self.joint_log_likelihood(features, Sentiment::Negative.index());
        let positive = self.joint_log_likelihood(features, Sentiment::Positive.index());
        Ok(ClassScores::from_positive(sigmoid(positive - negative) as f32))
    }

    fn as_incremental(&self) -> Option<&dyn IncrementalModel> {
        Some(self)
    }

    fn as_incremental_mut(&mut self) -> Option<&mut dyn IncrementalModel> {
        Some(self)
    }

    fn snapshot(&self) -> Option<ClassifierArtifact> {
        Some(ClassifierArtifact::MultinomialNb(self.clone()))
    }
}

impl IncrementalModel for MultinomialNbModel {
    fn partial_fit(&mut self, features: &SparseVector, label: Sentiment) -> Result<()> {
        ensure_dimension(self.dimension(), features)?;
        if features.iter().any(|(_, value)| value < 0.0) {
            return Err(Error::transform("naive Bayes features must be non-negative"));
        }

        let class = label.index();
        for (col, value) in features.iter() {
            self.feature_count[class][col] += value;
        }
        self.class_count[class] += 1.0;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> MultinomialNbModel {
        MultinomialNbModel {
            feature_count: vec![vec![5.0, 1.0, 0.0], vec![1.0, 5.0, 2.0]],
            class_count: vec![10.0, 10.0],
            alpha: 1.0,
        }
    }

    #[test]
    fn test_prediction_follows_counts() {
        let model = trained();
        let neg = model
            .predict_proba(&SparseVector::from_pairs(3, vec![(0, 1.0)]))
            .unwrap();
        assert_eq!(neg.argmax(), Sentiment::Negative);

        let pos = model
            .predict_proba(&SparseVector::from_pairs(3, vec![(1, 1.0)]))
            .unwrap();
        assert_eq!(pos.argmax(), Sentiment::Positive);
    }

    #[test]
    fn test_partial_fit_raises_corrected_class() {
        let mut model = trained();
        let x = SparseVector::from_pairs(3, vec![(0, 0.7), (2, 0.7)]);
        let before = model.predict_proba(&x).unwrap().positive;

        model.partial_fit(&x, Sentiment::Positive).unwrap();
        assert!(model.predict_proba(&x).unwrap().positive >= before);
        assert_eq!(model.class_count, vec![10.0, 11.0]);
    }

    #[test]
    fn test_negative_weights_rejected() {
        let mut model = trained();
        let x = SparseVector::from_pairs(3, vec![(0, -1.0)]);
        assert!(model.partial_fit(&x, Sentiment::Positive).is_err());
        assert_eq!(model, trained());
    }

    #[test]
    fn test_validate_shape() {
        let mut model = trained();
        model.class_count.push(1.0);
        assert!(model.validate().is_err());
        assert!(MultinomialNbModel::new(4, 1.0).validate().is_ok());
    }
}
