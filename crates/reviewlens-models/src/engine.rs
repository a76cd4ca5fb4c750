//! Classification and online feedback over the active model

use reviewlens_core::{
    decode_document, Classification, Error, FeedbackOutcome, Result, Sentiment, Verdict,
};
use std::sync::Arc;
use tracing::debug;

use crate::model_loader::ModelVersion;
use crate::registry::ModelRegistry;

/// Classifies documents and folds reviewer corrections into the active model
///
/// Every call runs against one consistent version: the registry slot is
/// read-locked for the duration of the call, so a concurrent swap waits.
/// Classification takes the classifier's read lock; feedback takes its write
/// lock, which serializes feedback calls and excludes classifications of the
/// same version while the update runs.
#[derive(Clone)]
pub struct SentimentEngine {
    registry: Arc<ModelRegistry>,
}

impl SentimentEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Label and confidence for one document
    pub fn classify(&self, document: &str) -> Result<Classification> {
        self.registry
            .with_current(|version| classify_with(version, document))?
    }

    /// Classify raw bytes, rejecting malformed UTF-8 with `TransformFailure`
    pub fn classify_bytes(&self, document: &[u8]) -> Result<Classification> {
        self.classify(decode_document(document)?)
    }

    /// Classify several documents against the same version
    pub fn classify_batch<S: AsRef<str>>(&self, documents: &[S]) -> Result<Vec<Classification>> {
        self.registry.with_current(|version| {
            documents
                .iter()
                .map(|doc| classify_with(version, doc.as_ref()))
                .collect::<Result<Vec<_>>>()
        })?
    }

    /// Perform one incremental update toward `corrected_label`
    ///
    /// Returns the classification of `document` after the update.
    pub fn apply_feedback(&self, document: &str, corrected_label: &str) -> Result<Classification> {
        let label: Sentiment = corrected_label.parse()?;
        let (_, after) = self.update(document, label)?;
        Ok(after)
    }

    /// Apply a reviewer verdict on a previously reported label
    ///
    /// `Incorrect` trains toward the opposite label, `Correct` reinforces
    /// the original one.
    pub fn feedback(&self, document: &str, original: &str, verdict: &str) -> Result<FeedbackOutcome> {
        let original: Sentiment = original.parse()?;
        let verdict: Verdict = verdict.parse()?;
        let corrected = verdict.corrected(original);

        let (confidence_before, after) = self.update(document, corrected)?;

        Ok(FeedbackOutcome {
            original,
            corrected,
            verdict,
            confidence_before,
            after,
        })
    }

    /// Returns P(label) before the update and the classification after it
    fn update(&self, document: &str, label: Sentiment) -> Result<(f32, Classification)> {
        self.registry.with_current(|version| {
            let features = version.transformer().transform(document)?;
            let mut classifier = version.classifier_mut();

            if !classifier.is_incremental() {
                return Err(Error::unsupported(format!(
                    "classifier '{}' of model '{}' does not support incremental updates",
                    classifier.kind(),
                    version.name()
                )));
            }

            // Also validates the feature width before anything changes
            let before = classifier.predict_proba(&features)?.get(label);

            classifier
                .as_incremental_mut()
                .ok_or_else(|| Error::unsupported("classifier lost its incremental capability"))?
                .partial_fit(&features, label)?;

            let after = Classification::from_scores(classifier.predict_proba(&features)?, version.name());

            debug!(
                model = %version.name(),
                label = %label,
                before,
                after = after.scores.get(label),
                "Applied feedback update"
            );

            Ok((before, after))
        })?
    }
}

fn classify_with(version: &ModelVersion, document: &str) -> Result<Classification> {
    let features = version.transformer().transform(document)?;
    let scores = version.classifier().predict_proba(&features)?;
    Ok(Classification::from_scores(scores, version.name()))
}
