//! Linear logistic classifiers
//!
//! [`SgdLogisticModel`] is a logistic-loss linear model trained by
//! stochastic gradient descent. It keeps the step counter and regularization
//! strength it was fitted with, so reviewer feedback can continue the
//! "optimal" learning-rate schedule `eta = 1 / (alpha * (t0 + t))` one
//! example at a time.
//!
//! [`LogisticModel`] is a frozen logistic regression with no online update.

use reviewlens_core::{ClassScores, Error, Result, Sentiment};
use serde::{Deserialize, Serialize};

use crate::artifact::ClassifierArtifact;
use crate::classifier::{ensure_dimension, sigmoid, IncrementalModel, SentimentModel};
use crate::sparse::SparseVector;

/// Logistic-loss linear model with online SGD updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SgdLogisticModel {
    pub weights: Vec<f64>,

    pub intercept: f64,

    /// L2 regularization strength the schedule is derived from
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Updates applied so far
    #[serde(default)]
    pub t: u64,
}

fn default_alpha() -> f64 {
    1e-4
}

impl SgdLogisticModel {
    /// Untrained model over `dimension` features
    pub fn new(dimension: usize, alpha: f64) -> Self {
        Self {
            weights: vec![0.0; dimension],
            intercept: 0.0,
            alpha,
            t: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(Error::config(format!("alpha must be positive, got {}", self.alpha)));
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::config("weights must be finite"));
        }
        Ok(())
    }

    /// Step size for the next update
    pub fn learning_rate(&self) -> f64 {
        // Offset chosen so the first step is about the size of a typical weight
        let typical_weight = (1.0 / self.alpha.sqrt()).sqrt();
        let t0 = 1.0 / (typical_weight * self.alpha);
        1.0 / (self.alpha * (t0 + self.t as f64))
    }

    fn margin(&self, features: &SparseVector) -> f64 {
        features.dot(&self.weights) + self.intercept
    }
}

impl SentimentModel for SgdLogisticModel {
    fn kind(&self) -> &str {
        "sgd_logistic"
    }

    fn dimension(&self) -> usize {
        self.weights.len()
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<ClassScores> {
        ensure_dimension(self.dimension(), features)?;
        Ok(ClassScores::from_positive(sigmoid(self.margin(features)) as f32))
    }

    fn as_incremental(&self) -> Option<&dyn IncrementalModel> {
        Some(self)
    }

    fn as_incremental_mut(&mut self) -> Option<&mut dyn IncrementalModel> {
        Some(self)
    }

    fn snapshot(&self) -> Option<ClassifierArtifact> {
        Some(ClassifierArtifact::SgdLogistic(self.clone()))
    }
}

impl IncrementalModel for SgdLogisticModel {
    fn partial_fit(&mut self, features: &SparseVector, label: Sentiment) -> Result<()> {
        ensure_dimension(self.dimension(), features)?;

        let y = match label {
            Sentiment::Positive => 1.0,
            Sentiment::Negative => -1.0,
        };

        // Gradient step on the logistic loss. The L2 shrink is not applied
        // here: with it, a confident example could lose margin.
        let eta = self.learning_rate();
        let step = eta * sigmoid(-y * self.margin(features)) * y;

        for (col, value) in features.iter() {
            self.weights[col] += step * value;
        }
        self.intercept += step;
        self.t += 1;

        Ok(())
    }
}

/// Frozen logistic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn validate(&self) -> Result<()> {
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::config("weights must be finite"));
        }
        Ok(())
    }
}

impl SentimentModel for LogisticModel {
    fn kind(&self) -> &str {
        "logistic"
    }

    fn dimension(&self) -> usize {
        self.weights.len()
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<ClassScores> {
        ensure_dimension(self.dimension(), features)?;
        let margin = features.dot(&self.weights) + self.intercept;
        Ok(ClassScores::from_positive(sigmoid(margin) as f32))
    }

    fn snapshot(&self) -> Option<ClassifierArtifact> {
        Some(ClassifierArtifact::Logistic(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(usize, f64)]) -> SparseVector {
        SparseVector::from_pairs(4, pairs.to_vec())
    }

    #[test]
    fn test_untrained_model_is_undecided() {
        let model = SgdLogisticModel::new(4, 1e-4);
        let scores = model.predict_proba(&features(&[(0, 1.0)])).unwrap();
        assert_eq!(scores.positive, 0.5);
    }

    #[test]
    fn test_partial_fit_moves_toward_label() {
        let mut model = SgdLogisticModel::new(4, 1e-4);
        let x = features(&[(1, 0.6), (2, 0.8)]);

        model.partial_fit(&x, Sentiment::Negative).unwrap();
        let scores = model.predict_proba(&x).unwrap();
        assert!(scores.negative > 0.5);
        assert_eq!(model.t, 1);

        // Untouched columns keep their weight
        assert_eq!(model.weights[0], 0.0);
        assert_eq!(model.weights[3], 0.0);
    }

    #[test]
    fn test_learning_rate_decays() {
        let mut model = SgdLogisticModel::new(2, 1e-4);
        let first = model.learning_rate();
        model.t = 1000;
        assert!(model.learning_rate() < first);
    }

    #[test]
    fn test_confident_example_keeps_margin() {
        let mut model = SgdLogisticModel {
            weights: vec![8.0, 0.0, 0.0, 0.0],
            intercept: 0.0,
            alpha: 0.5,
            t: 0,
        };
        let x = features(&[(0, 0.01)]);
        let before = model.predict_proba(&x).unwrap().positive;

        model.partial_fit(&x, Sentiment::Positive).unwrap();
        assert!(model.predict_proba(&x).unwrap().positive >= before);
    }

    #[test]
    fn test_wrong_width_rejected_without_mutation() {
        let mut model = SgdLogisticModel::new(4, 1e-4);
        let x = SparseVector::from_pairs(3, vec![(0, 1.0)]);

        assert!(model.partial_fit(&x, Sentiment::Positive).is_err());
        assert_eq!(model, SgdLogisticModel::new(4, 1e-4));
    }

    #[test]
    fn test_frozen_logistic_is_not_incremental() {
        let mut model = LogisticModel {
            weights: vec![1.0, -1.0, 0.0, 0.0],
            intercept: 0.0,
        };
        assert!(!model.is_incremental());
        assert!(model.as_incremental_mut().is_none());

        let scores = model.predict_proba(&features(&[(1, 2.0)])).unwrap();
        assert_eq!(scores.argmax(), Sentiment::Negative);
    }

    #[test]
    fn test_validate() {
        assert!(SgdLogisticModel::new(2, 0.0).validate().is_err());
        let mut model = SgdLogisticModel::new(2, 1e-4);
        model.weights[0] = f64::NAN;
        assert!(model.validate().is_err());
    }
}
