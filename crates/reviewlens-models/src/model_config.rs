//! Model descriptors and the catalog that resolves names to artifacts

use reviewlens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::artifact::ArtifactFormat;

/// Name of the model loaded at startup
pub const DEFAULT_MODEL: &str = "default";

/// File stem of transformer artifacts under the naming convention
pub const TRANSFORMER_STEM: &str = "tfidf_vectorizer";

/// File stem of classifier artifacts under the naming convention
pub const CLASSIFIER_STEM: &str = "sentiment_model";

/// Where a named model version's artifacts live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model name
    pub name: String,

    /// Transformer artifact path, relative to the catalog directory unless absolute
    pub transformer: PathBuf,

    /// Classifier artifact path, relative to the catalog directory unless absolute
    pub classifier: PathBuf,

    /// Encoding of both artifacts
    #[serde(default)]
    pub format: ArtifactFormat,

    /// Free-form description
    #[serde(default)]
    pub description: String,
}

impl ModelDescriptor {
    /// Descriptor following `<kind>[_<name>].<ext>` in `dir`
    ///
    /// The default model has no suffix.
    pub fn conventional(dir: impl AsRef<Path>, name: &str, format: ArtifactFormat) -> Self {
        let name = normalize_name(name);
        let suffix = if name == DEFAULT_MODEL {
            String::new()
        } else {
            format!("_{name}")
        };
        let ext = format.extension();
        let dir = dir.as_ref();

        Self {
            name: name.to_string(),
            transformer: dir.join(format!("{TRANSFORMER_STEM}{suffix}.{ext}")),
            classifier: dir.join(format!("{CLASSIFIER_STEM}{suffix}.{ext}")),
            format,
            description: String::new(),
        }
    }

    /// Copy with relative paths joined onto `base_dir`
    pub fn resolved(&self, base_dir: &Path) -> Self {
        let join = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base_dir.join(path)
            }
        };

        Self {
            transformer: join(&self.transformer),
            classifier: join(&self.classifier),
            ..self.clone()
        }
    }
}

/// YAML catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

/// Lookup table from model name to artifacts
///
/// Names declared in the catalog file win; any other name falls back to the
/// file naming convention inside the artifact directory.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    base_dir: PathBuf,
    format: ArtifactFormat,
    descriptors: Vec<ModelDescriptor>,
}

impl ModelCatalog {
    /// Convention-only catalog over `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            format: ArtifactFormat::Json,
            descriptors: Vec::new(),
        }
    }

    /// Catalog from a YAML file; relative artifact paths resolve against `base_dir`
    pub fn from_file(base_dir: impl Into<PathBuf>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read model catalog {}: {}", path.display(), e))
        })?;
        Self::from_yaml(base_dir, &contents)
    }

    pub fn from_yaml(base_dir: impl Into<PathBuf>, yaml: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let mut catalog = Self::new(base_dir);
        for descriptor in file.models {
            catalog = catalog.with_descriptor(descriptor);
        }
        Ok(catalog)
    }

    /// Register a descriptor, replacing any with the same name
    pub fn with_descriptor(mut self, descriptor: ModelDescriptor) -> Self {
        self.descriptors.retain(|d| d.name != descriptor.name);
        self.descriptors.push(descriptor);
        self
    }

    /// Artifact format used for convention lookups
    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = format;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn descriptors(&self) -> &[ModelDescriptor] {
        &self.descriptors
    }

    /// Resolve `name` (empty means the default model) to artifact paths
    pub fn resolve(&self, name: &str) -> Result<ModelDescriptor> {
        let name = normalize_name(name);
        validate_name(name)?;

        let descriptor = match self.descriptors.iter().find(|d| d.name == name) {
            Some(declared) => declared.resolved(&self.base_dir),
            None => ModelDescriptor::conventional(&self.base_dir, name, self.format),
        };
        Ok(descriptor)
    }

    /// Catalog names plus every complete artifact pair found by convention
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = self.descriptors.iter().map(|d| d.name.clone()).collect();
        names.extend(self.discover()?);
        Ok(names.into_iter().collect())
    }

    fn discover(&self) -> Result<Vec<String>> {
        if !self.base_dir.is_dir() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.base_dir)
            .map_err(|e| Error::config(format!("Failed to read models directory: {}", e)))?;

        let ext = format!(".{}", self.format.extension());
        let mut names = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| Error::config(format!("Failed to read directory entry: {}", e)))?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            let Some(rest) = file_name
                .strip_prefix(CLASSIFIER_STEM)
                .and_then(|rest| rest.strip_suffix(ext.as_str()))
            else {
                continue;
            };

            let name = match rest {
                "" => DEFAULT_MODEL,
                suffixed => match suffixed.strip_prefix('_') {
                    Some(name) if !name.is_empty() => name,
                    _ => continue,
                },
            };

            // Only names whose transformer is also present
            let descriptor = ModelDescriptor::conventional(&self.base_dir, name, self.format);
            if descriptor.transformer.is_file() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }
}

/// Empty or blank names mean the default model
pub fn normalize_name(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_MODEL
    } else {
        trimmed
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.contains(|c: char| c == '/' || c == '\\') || name.contains("..") {
        return Err(Error::model_not_found(format!("invalid model name '{name}'")));
    }
    Ok(())
}
