//! Hot-swappable model registry
//!
//! The registry owns the single active [`ModelVersion`]. Loading reads and
//! validates artifacts without holding any lock, then swaps the active
//! pointer under a short write lock, so a failed load never disturbs the
//! version that is serving traffic.

use parking_lot::RwLock;
use reviewlens_core::{Error, Result};
use reviewlens_keywords::MorphAnalyzer;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::model_config::{normalize_name, ModelCatalog};
use crate::model_loader::{ModelInfo, ModelLoader, ModelVersion};

/// Registry of the active model version
pub struct ModelRegistry {
    catalog: ModelCatalog,
    loader: ModelLoader,
    active: RwLock<Option<Arc<ModelVersion>>>,
}

impl ModelRegistry {
    /// Empty registry resolving names through `catalog`
    pub fn new(catalog: ModelCatalog) -> Self {
        Self::with_loader(catalog, ModelLoader::new())
    }

    pub fn with_loader(catalog: ModelCatalog, loader: ModelLoader) -> Self {
        Self {
            catalog,
            loader,
            active: RwLock::new(None),
        }
    }

    /// Load `name` (empty means the default model) and make it active
    ///
    /// On failure the previously active version stays active.
    pub fn load(&self, name: &str) -> Result<Arc<ModelVersion>> {
        let name = normalize_name(name);
        let descriptor = self.catalog.resolve(name)?;

        let version = match self.loader.load(&descriptor) {
            Ok(version) => Arc::new(version),
            Err(e) => {
                warn!(model = %name, error = %e, "Model load failed; keeping active model");
                return Err(e);
            }
        };

        let previous = self.swap(Arc::clone(&version));
        info!(
            model = %name,
            previous = previous.as_deref().unwrap_or("<none>"),
            "Activated model"
        );

        Ok(version)
    }

    /// Make an in-memory version active
    pub fn activate(&self, version: ModelVersion) -> Arc<ModelVersion> {
        let version = Arc::new(version);
        let previous = self.swap(Arc::clone(&version));
        info!(
            model = %version.name(),
            previous = previous.as_deref().unwrap_or("<none>"),
            "Activated in-memory model"
        );
        version
    }

    fn swap(&self, version: Arc<ModelVersion>) -> Option<String> {
        let mut active = self.active.write();
        let previous = active.as_ref().map(|v| v.name().to_string());
        *active = Some(version);
        previous
    }

    /// Snapshot of the active version
    ///
    /// The snapshot stays valid after a later swap; it is dropped once the
    /// last holder releases it.
    pub fn current(&self) -> Result<Arc<ModelVersion>> {
        self.active.read().clone().ok_or_else(no_model)
    }

    /// Run `f` against the active version while holding the slot read lock
    ///
    /// A swap waits for `f` to return. `f` must not call back into the
    /// registry.
    pub fn with_current<R>(&self, f: impl FnOnce(&ModelVersion) -> R) -> Result<R> {
        let active = self.active.read();
        let version = active.as_deref().ok_or_else(no_model)?;
        Ok(f(version))
    }

    /// Name of the active version, if one is loaded
    pub fn current_name(&self) -> Option<String> {
        self.active.read().as_ref().map(|v| v.name().to_string())
    }

    pub fn is_loaded(&self) -> bool {
        self.active.read().is_some()
    }

    pub fn info(&self) -> Option<ModelInfo> {
        let version = self.active.read().clone()?;
        Some(version.info())
    }

    /// Names that [`load`](Self::load) can resolve
    pub fn available_models(&self) -> Result<Vec<String>> {
        self.catalog.names()
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }
}

fn no_model() -> Error {
    Error::model_not_found("no model has been loaded")
}

/// Builder for [`ModelRegistry`]
pub struct ModelRegistryBuilder {
    models_dir: PathBuf,
    catalog_path: Option<PathBuf>,
    analyzer: Option<Arc<dyn MorphAnalyzer>>,
    preload: Option<String>,
}

impl ModelRegistryBuilder {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            catalog_path: None,
            analyzer: None,
            preload: None,
        }
    }

    /// YAML catalog declaring named models
    pub fn with_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Morphological analyzer shared by morph-based transformers
    pub fn with_analyzer(mut self, analyzer: Arc<dyn MorphAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Model to load eagerly in [`build`](Self::build)
    pub fn preload(mut self, name: impl Into<String>) -> Self {
        self.preload = Some(name.into());
        self
    }

    pub fn build(self) -> Result<ModelRegistry> {
        let catalog = match &self.catalog_path {
            Some(path) => ModelCatalog::from_file(&self.models_dir, path)?,
            None => ModelCatalog::new(&self.models_dir),
        };

        let loader = match self.analyzer {
            Some(analyzer) => ModelLoader::new().with_analyzer(analyzer),
            None => ModelLoader::new(),
        };

        let registry = ModelRegistry::with_loader(catalog, loader);
        if let Some(name) = &self.preload {
            registry.load(name)?;
        }

        Ok(registry)
    }
}
