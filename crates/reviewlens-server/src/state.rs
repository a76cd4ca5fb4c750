//! Shared application state

use metrics_exporter_prometheus::PrometheusHandle;
use reviewlens_core::Result;
use reviewlens_keywords::{KeywordExtractor, KoDicAnalyzer, MorphAnalyzer, StopWords};
use reviewlens_models::{ModelRegistryBuilder, SentimentEngine};
use reviewlens_telemetry::MetricsCollector;
use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;
use crate::store::{InMemoryStore, ReviewStore};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: SentimentEngine,
    pub keywords: KeywordExtractor,
    pub store: Arc<dyn ReviewStore>,
    pub metrics: MetricsCollector,
    pub prometheus: Option<PrometheusHandle>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the keyword engine and registry, then load the initial model
    ///
    /// Fails when the initial model cannot be loaded, so the server never
    /// accepts requests without an active model.
    pub fn from_config(config: ServerConfig, prometheus: Option<PrometheusHandle>) -> Result<Self> {
        let analyzer: Arc<dyn MorphAnalyzer> = match &config.keywords.user_dictionary {
            Some(path) => Arc::new(KoDicAnalyzer::with_user_dictionary(path)?),
            None => Arc::new(KoDicAnalyzer::new()?),
        };
        let stopwords = StopWords::with_extra(config.keywords.extra_stopwords.iter().cloned());
        let keywords = KeywordExtractor::with_parts(Arc::clone(&analyzer), stopwords);

        let mut builder = ModelRegistryBuilder::new(&config.models.dir)
            .with_analyzer(analyzer)
            .preload(config.models.initial.clone());
        if let Some(catalog) = &config.models.catalog {
            builder = builder.with_catalog(catalog);
        }
        let registry = builder.build()?;

        let model = registry.current_name().unwrap_or_default();
        info!(
            model = %model,
            models_dir = %config.models.dir.display(),
            "Model registry ready"
        );

        Ok(Self {
            engine: SentimentEngine::new(Arc::new(registry)),
            keywords,
            store: Arc::new(InMemoryStore::new()),
            metrics: MetricsCollector::new(),
            prometheus,
            config: Arc::new(config),
        })
    }

    /// Replace the review store
    pub fn with_store(mut self, store: Arc<dyn ReviewStore>) -> Self {
        self.store = store;
        self
    }
}
