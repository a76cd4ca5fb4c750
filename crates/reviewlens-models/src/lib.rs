//! Sentiment model serving for ReviewLens
//!
//! This crate turns review text into TF-IDF features, classifies it with a
//! linear or naive Bayes model, and applies single-example online updates
//! from reviewer feedback.
//!
//! - [`TfidfVectorizer`]: feature transformer loaded from an artifact
//! - [`SentimentModel`] / [`IncrementalModel`]: classifier traits
//! - [`ModelCatalog`]: resolves model names to artifact files
//! - [`ModelRegistry`]: owns the active model version and swaps it atomically
//! - [`SentimentEngine`]: classification and feedback over the registry

pub mod artifact;
pub mod classifier;
pub mod engine;
pub mod linear;
pub mod model_config;
pub mod model_loader;
pub mod naive_bayes;
pub mod registry;
pub mod sparse;
pub mod transformer;

pub use artifact::{ArtifactFormat, ClassifierArtifact};
pub use classifier::{IncrementalModel, SentimentModel};
pub use engine::SentimentEngine;
pub use linear::{LogisticModel, SgdLogisticModel};
pub use model_config::{ModelCatalog, ModelDescriptor, DEFAULT_MODEL};
pub use model_loader::{ModelInfo, ModelLoader, ModelVersion};
pub use naive_bayes::MultinomialNbModel;
pub use registry::{ModelRegistry, ModelRegistryBuilder};
pub use sparse::SparseVector;
pub use transformer::{AnalyzerKind, FitOptions, Norm, TfidfArtifact, TfidfVectorizer};
