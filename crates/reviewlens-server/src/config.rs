//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub keywords: KeywordsConfig,

    #[serde(default)]
    pub reviews: ReviewsConfig,
}

/// Values supplied on the command line that win over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub models_dir: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub model: Option<String>,
    pub listen: Option<String>,
    pub port: Option<u16>,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: impl AsRef<Path>, overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();

        // Try to load from file, or use defaults
        let mut config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(dir) = &overrides.models_dir {
            config.models.dir = dir.clone();
        }

        if let Some(catalog) = &overrides.catalog {
            config.models.catalog = Some(catalog.clone());
        }

        if let Some(model) = &overrides.model {
            config.models.initial = model.clone();
        }

        if let Some(listen) = &overrides.listen {
            config.listen = listen.clone();
        }

        if let Some(port) = overrides.port {
            config.port = port;
        }

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            models: ModelsConfig::default(),
            keywords: KeywordsConfig::default(),
            reviews: ReviewsConfig::default(),
        }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding `tfidf_vectorizer[_name].json` / `sentiment_model[_name].json`
    #[serde(default = "default_models_dir")]
    pub dir: PathBuf,

    /// Optional YAML catalog of named models
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    /// Model loaded before the server accepts requests
    #[serde(default = "default_model")]
    pub initial: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: default_models_dir(),
            catalog: None,
            initial: default_model(),
        }
    }
}

/// Keyword statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    /// Stopwords added to the built-in set
    #[serde(default)]
    pub extra_stopwords: Vec<String>,

    /// lindera ko-dic user dictionary (`surface,tag,reading` CSV) for
    /// product and brand nouns missing from ko-dic
    #[serde(default)]
    pub user_dictionary: Option<PathBuf>,

    /// Default `limit` for the per-label keyword endpoints
    #[serde(default = "default_label_limit")]
    pub label_limit: i64,

    /// Default `limit` for the overall keyword endpoint
    #[serde(default = "default_overall_limit")]
    pub overall_limit: i64,

    /// Latest reviews per label considered by the per-label endpoints
    #[serde(default = "default_label_window")]
    pub label_window: usize,

    /// Latest reviews considered by the overall endpoint
    #[serde(default = "default_overall_window")]
    pub overall_window: usize,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            extra_stopwords: Vec::new(),
            user_dictionary: None,
            label_limit: default_label_limit(),
            overall_limit: default_overall_limit(),
            label_window: default_label_window(),
            overall_window: default_overall_window(),
        }
    }
}

/// Review handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsConfig {
    /// Shortest review, in characters, accepted by the length filter
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Maximum rows returned by keyword search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Default `limit` for the feedback listing
    #[serde(default = "default_feedback_limit")]
    pub feedback_limit: usize,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            search_limit: default_search_limit(),
            feedback_limit: default_feedback_limit(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_models_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_model() -> String {
    "default".to_string()
}

fn default_label_limit() -> i64 {
    5
}

fn default_overall_limit() -> i64 {
    3
}

fn default_label_window() -> usize {
    1000
}

fn default_overall_window() -> usize {
    500
}

fn default_min_length() -> usize {
    10
}

fn default_search_limit() -> usize {
    100
}

fn default_feedback_limit() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load("/no/such/config.yaml", &ConfigOverrides::default()).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.models.initial, "default");
        assert_eq!(config.keywords.label_window, 1000);
        assert_eq!(config.keywords.overall_window, 500);
        assert_eq!(config.reviews.min_length, 10);
    }

    #[test]
    fn test_partial_file_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "port: 9000\nkeywords:\n  extra_stopwords: [배송]\nreviews:\n  min_length: 5\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            model: Some("variantA".to_string()),
            models_dir: Some(PathBuf::from("/srv/models")),
            ..Default::default()
        };
        let config = ServerConfig::load(&path, &overrides).unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.keywords.extra_stopwords, vec!["배송"]);
        assert_eq!(config.keywords.label_limit, 5);
        assert_eq!(config.reviews.min_length, 5);
        assert_eq!(config.models.initial, "variantA");
        assert_eq!(config.models.dir, PathBuf::from("/srv/models"));
    }
}
