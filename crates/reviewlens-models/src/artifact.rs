//! Artifact serialization
//!
//! A model version is stored as two files: a transformer artifact
//! ([`TfidfArtifact`]) and a classifier artifact ([`ClassifierArtifact`]),
//! both in JSON or YAML.

use reviewlens_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classifier::SentimentModel;
use crate::linear::{LogisticModel, SgdLogisticModel};
use crate::naive_bayes::MultinomialNbModel;
use crate::transformer::TfidfArtifact;

/// On-disk encoding of an artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    #[default]
    Json,
    Yaml,
}

impl ArtifactFormat {
    /// File extension used by the naming convention
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }

    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            Self::Json => Ok(serde_json::from_slice(bytes)?),
            Self::Yaml => Ok(serde_yaml::from_slice(bytes)?),
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Self::Json => Ok(serde_json::to_vec_pretty(value)?),
            Self::Yaml => Ok(serde_yaml::to_string(value)?.into_bytes()),
        }
    }
}

/// Serialized classifier, tagged by family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    /// Logistic-loss SGD model, updatable online
    SgdLogistic(SgdLogisticModel),

    /// Multinomial naive Bayes, updatable online
    MultinomialNb(MultinomialNbModel),

    /// Frozen logistic regression
    Logistic(LogisticModel),
}

impl ClassifierArtifact {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SgdLogistic(_) => "sgd_logistic",
            Self::MultinomialNb(_) => "multinomial_nb",
            Self::Logistic(_) => "logistic",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::SgdLogistic(model) => model.validate(),
            Self::MultinomialNb(model) => model.validate(),
            Self::Logistic(model) => model.validate(),
        }
    }

    /// Validate and box as a runtime classifier
    pub fn into_model(self) -> Result<Box<dyn SentimentModel>> {
        self.validate()?;
        Ok(match self {
            Self::SgdLogistic(model) => Box::new(model),
            Self::MultinomialNb(model) => Box::new(model),
            Self::Logistic(model) => Box::new(model),
        })
    }
}

/// Read and decode an artifact, returning the raw bytes alongside it
pub fn read_artifact<T: DeserializeOwned>(path: &Path, format: ArtifactFormat) -> Result<(T, Vec<u8>)> {
    let bytes = std::fs::read(path)?;
    let value = format.decode(&bytes)?;
    Ok((value, bytes))
}

/// Encode and write an artifact, creating parent directories
pub fn write_artifact<T: Serialize>(value: &T, path: &Path, format: ArtifactFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format.encode(value)?)?;
    Ok(())
}

/// Read a transformer artifact
pub fn read_transformer(path: &Path, format: ArtifactFormat) -> Result<(TfidfArtifact, Vec<u8>)> {
    read_artifact(path, format)
        .map_err(|e| Error::model_not_found(format!("transformer {}: {}", path.display(), e)))
}

/// Read a classifier artifact
pub fn read_classifier(path: &Path, format: ArtifactFormat) -> Result<(ClassifierArtifact, Vec<u8>)> {
    read_artifact(path, format)
        .map_err(|e| Error::model_not_found(format!("classifier {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_classifier_json() {
        let json = r#"{"type": "sgd_logistic", "weights": [0.5, -0.5], "intercept": 0.1}"#;
        let artifact: ClassifierArtifact = serde_json::from_str(json).unwrap();

        match &artifact {
            ClassifierArtifact::SgdLogistic(model) => {
                assert_eq!(model.alpha, 1e-4);
                assert_eq!(model.t, 0);
            }
            other => panic!("unexpected artifact {other:?}"),
        }

        let model = artifact.into_model().unwrap();
        assert_eq!(model.kind(), "sgd_logistic");
        assert_eq!(model.dimension(), 2);
        assert!(model.is_incremental());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"type": "random_forest", "trees": []}"#;
        assert!(serde_json::from_str::<ClassifierArtifact>(json).is_err());
    }

    #[test]
    fn test_yaml_naive_bayes() {
        let yaml = r#"
type: multinomial_nb
feature_count:
  - [1.0, 0.0]
  - [0.0, 1.0]
class_count: [1.0, 1.0]
"#;
        let artifact: ClassifierArtifact = ArtifactFormat::Yaml.decode(yaml.as_bytes()).unwrap();
        assert_eq!(artifact.kind(), "multinomial_nb");
        assert!(artifact.into_model().is_ok());
    }

    #[test]
    fn test_write_then_read_preserves_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sentiment_model.json");
        let artifact = ClassifierArtifact::Logistic(LogisticModel {
            weights: vec![0.25, -1.5],
            intercept: 0.75,
        });

        write_artifact(&artifact, &path, ArtifactFormat::Json).unwrap();
        let (read, bytes): (ClassifierArtifact, _) = read_artifact(&path, ArtifactFormat::Json).unwrap();

        assert_eq!(read, artifact);
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_missing_file_is_model_not_found() {
        let err = read_classifier(Path::new("/nonexistent/sentiment_model.json"), ArtifactFormat::Json)
            .unwrap_err();
        assert_eq!(err.kind(), "model_not_found");
    }
}
