//! Classifier traits

use reviewlens_core::{ClassScores, Error, Result, Sentiment};

use crate::artifact::ClassifierArtifact;
use crate::sparse::SparseVector;

/// Trait for sentiment classifiers over TF-IDF features
pub trait SentimentModel: Send + Sync {
    /// Short identifier of the classifier family (e.g. "sgd_logistic")
    fn kind(&self) -> &str;

    /// Number of feature columns the classifier expects
    fn dimension(&self) -> usize;

    /// Per-class probabilities for one feature vector
    ///
    /// Fails with `TransformFailure` when the vector width differs from
    /// [`dimension`](Self::dimension).
    fn predict_proba(&self, features: &SparseVector) -> Result<ClassScores>;

    /// Incremental-learning capability, if the classifier has one
    fn as_incremental(&self) -> Option<&dyn IncrementalModel> {
        None
    }

    fn as_incremental_mut(&mut self) -> Option<&mut dyn IncrementalModel> {
        None
    }

    fn is_incremental(&self) -> bool {
        self.as_incremental().is_some()
    }

    /// Serializable copy of the current parameters
    fn snapshot(&self) -> Option<ClassifierArtifact> {
        None
    }
}

/// Single-example online learning
pub trait IncrementalModel: Send + Sync {
    /// Fold one labeled example into the parameters
    ///
    /// Implementations validate the input before touching any parameter, so
    /// an error leaves the model unchanged.
    fn partial_fit(&mut self, features: &SparseVector, label: Sentiment) -> Result<()>;
}

/// Reject feature vectors whose width differs from the classifier's
pub fn ensure_dimension(expected: usize, features: &SparseVector) -> Result<()> {
    if features.dim() != expected {
        return Err(Error::transform(format!(
            "feature vector has {} columns but the classifier expects {}",
            features.dim(),
            expected
        )));
    }
    Ok(())
}

/// Numerically stable logistic function
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(2.0) > sigmoid(1.0));
    }

    #[test]
    fn test_dimension_mismatch_is_transform_failure() {
        let v = SparseVector::zeros(3);
        assert!(ensure_dimension(3, &v).is_ok());
        assert_eq!(ensure_dimension(4, &v).unwrap_err().kind(), "transform_failure");
    }
}
