//! Loading model versions from artifact files

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use reviewlens_core::{Error, Result};
use reviewlens_keywords::MorphAnalyzer;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::artifact::{read_classifier, read_transformer, write_artifact, ArtifactFormat};
use crate::classifier::SentimentModel;
use crate::model_config::{ModelDescriptor, DEFAULT_MODEL};
use crate::transformer::{AnalyzerKind, TfidfVectorizer};

/// Summary of a loaded model version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub loaded_at: DateTime<Utc>,
    pub classifier_kind: String,
    pub incremental: bool,
    pub vocabulary_size: usize,
    pub analyzer: AnalyzerKind,
    /// SHA-256 prefix of the artifact bytes, absent for in-memory versions
    pub fingerprint: Option<String>,
}

/// One transformer/classifier pair
///
/// The transformer is immutable. The classifier sits behind its own lock so
/// feedback can update it in place while the version stays active.
pub struct ModelVersion {
    name: String,
    transformer: TfidfVectorizer,
    classifier: RwLock<Box<dyn SentimentModel>>,
    loaded_at: DateTime<Utc>,
    fingerprint: Option<String>,
}

impl ModelVersion {
    /// Version built in memory rather than read from artifacts
    pub fn new(
        name: impl Into<String>,
        transformer: TfidfVectorizer,
        classifier: Box<dyn SentimentModel>,
    ) -> Self {
        Self {
            name: name.into(),
            transformer,
            classifier: RwLock::new(classifier),
            loaded_at: Utc::now(),
            fingerprint: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transformer(&self) -> &TfidfVectorizer {
        &self.transformer
    }

    pub fn classifier(&self) -> RwLockReadGuard<'_, Box<dyn SentimentModel>> {
        self.classifier.read()
    }

    pub fn classifier_mut(&self) -> RwLockWriteGuard<'_, Box<dyn SentimentModel>> {
        self.classifier.write()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn info(&self) -> ModelInfo {
        let classifier = self.classifier();
        ModelInfo {
            name: self.name.clone(),
            loaded_at: self.loaded_at,
            classifier_kind: classifier.kind().to_string(),
            incremental: classifier.is_incremental(),
            vocabulary_size: self.transformer.vocabulary_size(),
            analyzer: self.transformer.analyzer_kind(),
            fingerprint: self.fingerprint.clone(),
        }
    }

    /// Write the current parameters under the naming convention in `dir`
    ///
    /// Feedback updates are included. Returns the descriptor of the written
    /// artifacts.
    pub fn save(&self, dir: impl AsRef<Path>, format: ArtifactFormat) -> Result<ModelDescriptor> {
        let snapshot = self.classifier().snapshot().ok_or_else(|| {
            Error::unsupported(format!("model '{}' cannot be serialized", self.name))
        })?;

        let descriptor = ModelDescriptor::conventional(dir, &self.name, format);
        write_artifact(self.transformer.artifact(), &descriptor.transformer, format)?;
        write_artifact(&snapshot, &descriptor.classifier, format)?;

        info!(
            model = %self.name,
            classifier = %descriptor.classifier.display(),
            "Saved model artifacts"
        );

        Ok(descriptor)
    }
}

impl std::fmt::Debug for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelVersion")
            .field("name", &self.name)
            .field("loaded_at", &self.loaded_at)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Reads descriptors into [`ModelVersion`]s
#[derive(Clone, Default)]
pub struct ModelLoader {
    analyzer: Option<Arc<dyn MorphAnalyzer>>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share `analyzer` with every morph-based transformer this loader builds
    pub fn with_analyzer(mut self, analyzer: Arc<dyn MorphAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Read and validate both artifacts
    ///
    /// Any missing, unreadable or invalid artifact fails with `ModelNotFound`.
    pub fn load(&self, descriptor: &ModelDescriptor) -> Result<ModelVersion> {
        let (transformer_artifact, transformer_bytes) =
            read_transformer(&descriptor.transformer, descriptor.format)?;
        let (classifier_artifact, classifier_bytes) =
            read_classifier(&descriptor.classifier, descriptor.format)?;

        let transformer = match (&self.analyzer, transformer_artifact.analyzer) {
            (Some(analyzer), AnalyzerKind::Morph) => {
                TfidfVectorizer::with_analyzer(transformer_artifact, Arc::clone(analyzer))
            }
            _ => TfidfVectorizer::new(transformer_artifact),
        }
        .map_err(|e| invalid_artifact(&descriptor.transformer, e))?;

        let classifier = classifier_artifact
            .into_model()
            .map_err(|e| invalid_artifact(&descriptor.classifier, e))?;

        if classifier.dimension() != transformer.dimension() {
            warn!(
                model = %descriptor.name,
                transformer_dim = transformer.dimension(),
                classifier_dim = classifier.dimension(),
                "Transformer and classifier widths differ; classification will fail"
            );
        }

        let mut hasher = Sha256::new();
        hasher.update(&transformer_bytes);
        hasher.update(&classifier_bytes);
        let digest = format!("{:x}", hasher.finalize());

        let name = if descriptor.name.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            descriptor.name.clone()
        };

        let mut version = ModelVersion::new(name, transformer, classifier);
        version.fingerprint = Some(digest[..16].to_string());

        let kind = version.classifier().kind().to_string();
        info!(
            model = %version.name,
            kind = %kind,
            vocabulary = version.transformer.vocabulary_size(),
            fingerprint = version.fingerprint().unwrap_or_default(),
            "Loaded model artifacts"
        );

        Ok(version)
    }
}

fn invalid_artifact(path: &Path, err: Error) -> Error {
    Error::model_not_found(format!("invalid artifact {}: {}", path.display(), err))
}
