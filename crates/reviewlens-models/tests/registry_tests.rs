//! Registry and engine tests against artifacts on disk

use reviewlens_core::{Error, Sentiment};
use reviewlens_models::artifact::write_artifact;
use reviewlens_models::{
    ArtifactFormat, ClassifierArtifact, FitOptions, IncrementalModel, LogisticModel, ModelCatalog,
    ModelDescriptor, ModelLoader, ModelRegistry, ModelRegistryBuilder, MultinomialNbModel,
    SentimentEngine, SgdLogisticModel, SparseVector, TfidfVectorizer,
};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const TRAINING: [(&str, Sentiment); 8] = [
    ("배송이 빨라서 좋아요", Sentiment::Positive),
    ("포장이 꼼꼼하고 좋아요", Sentiment::Positive),
    ("가격 대비 품질이 훌륭해요", Sentiment::Positive),
    ("디자인이 예뻐서 만족해요", Sentiment::Positive),
    ("배송이 늦어서 별로예요", Sentiment::Negative),
    ("품질이 별로예요 실망했어요", Sentiment::Negative),
    ("포장이 찢어져서 왔어요", Sentiment::Negative),
    ("환불 요청했어요 최악", Sentiment::Negative),
];

fn fit_vectorizer() -> TfidfVectorizer {
    let docs: Vec<&str> = TRAINING.iter().map(|(doc, _)| *doc).collect();
    TfidfVectorizer::fit(&docs, FitOptions::default()).unwrap()
}

fn train<M: IncrementalModel>(vectorizer: &TfidfVectorizer, model: &mut M, epochs: usize) {
    for _ in 0..epochs {
        for (doc, label) in TRAINING {
            model.partial_fit(&vectorizer.transform(doc).unwrap(), label).unwrap();
        }
    }
}

fn write_model(dir: &Path, name: &str, vectorizer: &TfidfVectorizer, classifier: ClassifierArtifact) {
    let descriptor = ModelDescriptor::conventional(dir, name, ArtifactFormat::Json);
    write_artifact(vectorizer.artifact(), &descriptor.transformer, ArtifactFormat::Json).unwrap();
    write_artifact(&classifier, &descriptor.classifier, ArtifactFormat::Json).unwrap();
}

/// Artifact directory with `default` (SGD), `variantA` (naive Bayes) and
/// `frozen` (logistic) models
fn model_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let vectorizer = fit_vectorizer();
    let dim = vectorizer.dimension();

    let mut sgd = SgdLogisticModel::new(dim, 1e-3);
    train(&vectorizer, &mut sgd, 3);
    write_model(dir.path(), "default", &vectorizer, ClassifierArtifact::SgdLogistic(sgd.clone()));

    let mut nb = MultinomialNbModel::new(dim, 1.0);
    train(&vectorizer, &mut nb, 1);
    write_model(dir.path(), "variantA", &vectorizer, ClassifierArtifact::MultinomialNb(nb));

    write_model(
        dir.path(),
        "frozen",
        &vectorizer,
        ClassifierArtifact::Logistic(LogisticModel {
            weights: sgd.weights,
            intercept: sgd.intercept,
        }),
    );

    dir
}

fn engine(dir: &TempDir) -> SentimentEngine {
    let registry = ModelRegistryBuilder::new(dir.path())
        .preload("default")
        .build()
        .unwrap();
    SentimentEngine::new(Arc::new(registry))
}

#[test]
fn test_eager_load_activates_default() {
    let dir = model_dir();
    let engine = engine(&dir);

    assert_eq!(engine.registry().current_name().as_deref(), Some("default"));
    let info = engine.registry().info().unwrap();
    assert_eq!(info.classifier_kind, "sgd_logistic");
    assert!(info.incremental);
}

#[test]
fn test_classification_result_bounds() {
    let dir = model_dir();
    let engine = engine(&dir);

    for text in ["배송이 빨라서 좋아요", "최악이에요", "", "unrelated english text"] {
        let result = engine.classify(text).unwrap();
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(result.confidence >= 0.5);
        assert!(Sentiment::ALL.contains(&result.label));
    }

    assert_eq!(
        engine.classify("배송이 빨라서 좋아요").unwrap().label,
        Sentiment::Positive
    );
    assert_eq!(
        engine.classify("품질이 별로예요 실망했어요").unwrap().label,
        Sentiment::Negative
    );
}

#[test]
fn test_classify_is_deterministic() {
    let dir = model_dir();
    let engine = engine(&dir);

    let first = engine.classify("포장이 꼼꼼하고 좋아요").unwrap();
    let second = engine.classify("포장이 꼼꼼하고 좋아요").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_model_keeps_active_version() {
    let dir = model_dir();
    let engine = engine(&dir);
    let before = engine.classify("배송이 늦어서 별로예요").unwrap();

    let err = engine.registry().load("missing_name").unwrap_err();
    assert!(matches!(err, Error::ModelNotFound(_)));

    assert_eq!(engine.registry().current_name().as_deref(), Some("default"));
    assert_eq!(engine.classify("배송이 늦어서 별로예요").unwrap(), before);
}

#[test]
fn test_swap_uses_new_artifacts() {
    let dir = model_dir();
    let engine = engine(&dir);

    engine.registry().load("variantA").unwrap();
    assert_eq!(engine.registry().current_name().as_deref(), Some("variantA"));

    let text = "디자인이 예뻐서 만족해요";
    let result = engine.classify(text).unwrap();
    assert_eq!(result.model, "variantA");

    let direct = ModelLoader::new()
        .load(&ModelCatalog::new(dir.path()).resolve("variantA").unwrap())
        .unwrap();
    let features = direct.transformer().transform(text).unwrap();
    let expected = direct.classifier().predict_proba(&features).unwrap();
    assert_eq!(result.scores, expected);

    // Empty name resolves to the default model
    engine.registry().load("").unwrap();
    assert_eq!(engine.registry().current_name().as_deref(), Some("default"));
}

#[test]
fn test_feedback_never_lowers_corrected_probability() {
    let dir = model_dir();
    let engine = engine(&dir);

    for model in ["default", "variantA"] {
        engine.registry().load(model).unwrap();
        for (doc, label) in TRAINING {
            let corrected = label.flipped();
            let before = engine.classify(doc).unwrap().scores.get(corrected);

            let after = engine.apply_feedback(doc, corrected.as_str()).unwrap();
            assert!(
                after.scores.get(corrected) >= before,
                "{model}: P({corrected}) fell from {before} to {}",
                after.scores.get(corrected)
            );
        }
    }
}

#[test]
fn test_feedback_outcome_reports_both_confidences() {
    let dir = model_dir();
    let engine = engine(&dir);
    let text = "배송이 빨라서 좋아요";
    let before = engine.classify(text).unwrap();

    let outcome = engine
        .feedback(text, before.label.as_str(), "Incorrect")
        .unwrap();
    assert_eq!(outcome.original, Sentiment::Positive);
    assert_eq!(outcome.corrected, Sentiment::Negative);
    assert_eq!(outcome.confidence_before, before.scores.negative);
    assert!(outcome.after.scores.negative >= outcome.confidence_before);

    // The update is in place: the active version is the same one
    assert_eq!(engine.classify(text).unwrap(), outcome.after);
    assert_eq!(engine.registry().current_name().as_deref(), Some("default"));
}

#[test]
fn test_frozen_model_rejects_feedback_without_change() {
    let dir = model_dir();
    let engine = engine(&dir);
    engine.registry().load("frozen").unwrap();

    let text = "포장이 찢어져서 왔어요";
    let before = engine.classify(text).unwrap();
    let err = engine.apply_feedback(text, "positive").unwrap_err();

    assert!(matches!(err, Error::UnsupportedOperation(_)));
    assert_eq!(engine.classify(text).unwrap(), before);
}

#[test]
fn test_invalid_label_leaves_model_untouched() {
    let dir = model_dir();
    let engine = engine(&dir);
    let text = "가격 대비 품질이 훌륭해요";
    let before = engine.classify(text).unwrap();

    assert!(matches!(
        engine.apply_feedback(text, "mixed"),
        Err(Error::InvalidLabel(_))
    ));
    assert_eq!(engine.classify(text).unwrap(), before);
}

#[test]
fn test_batch_uses_one_version() {
    let dir = model_dir();
    let engine = engine(&dir);
    let docs = ["배송이 빨라서 좋아요", "환불 요청했어요 최악"];

    let results = engine.classify_batch(&docs).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.model == "default"));
    assert_eq!(results[1].label, Sentiment::Negative);
}

#[test]
fn test_available_models() {
    let dir = model_dir();
    let engine = engine(&dir);

    assert_eq!(
        engine.registry().available_models().unwrap(),
        vec!["default", "frozen", "variantA"]
    );
}

#[test]
fn test_catalog_file_declares_model() {
    let dir = model_dir();
    let catalog_path = dir.path().join("catalog.yaml");
    std::fs::write(
        &catalog_path,
        "models:\n  - name: nb\n    transformer: tfidf_vectorizer_variantA.json\n    classifier: sentiment_model_variantA.json\n",
    )
    .unwrap();

    let registry = ModelRegistryBuilder::new(dir.path())
        .with_catalog(&catalog_path)
        .build()
        .unwrap();
    assert!(!registry.is_loaded());

    registry.load("nb").unwrap();
    assert_eq!(registry.info().unwrap().classifier_kind, "multinomial_nb");
}

#[test]
fn test_wrong_width_model_fails_transform() {
    let dir = model_dir();
    let vectorizer = fit_vectorizer();
    write_model(
        dir.path(),
        "narrow",
        &vectorizer,
        ClassifierArtifact::SgdLogistic(SgdLogisticModel::new(2, 1e-4)),
    );

    let engine = engine(&dir);
    engine.registry().load("narrow").unwrap();
    assert!(matches!(
        engine.classify("배송이 빨라서 좋아요"),
        Err(Error::TransformFailure(_))
    ));
}

#[test]
fn test_concurrent_classify_swap_and_feedback() {
    let dir = model_dir();
    let engine = engine(&dir);

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let result = engine.classify("배송이 빨라서 좋아요").unwrap();
                    assert!(result.model == "default" || result.model == "variantA");
                    assert!((0.0..=1.0).contains(&result.confidence));
                }
            });
        }

        scope.spawn(|| {
            for i in 0..20 {
                let name = if i % 2 == 0 { "variantA" } else { "default" };
                engine.registry().load(name).unwrap();
            }
        });

        scope.spawn(|| {
            for _ in 0..20 {
                engine.apply_feedback("품질이 별로예요 실망했어요", "negative").unwrap();
            }
        });
    });

    assert_eq!(engine.registry().current_name().as_deref(), Some("default"));
}

#[test]
fn test_zero_vector_is_valid_input() {
    let vectorizer = fit_vectorizer();
    let features = vectorizer.transform("전혀 관련 없는 문장").unwrap();
    assert_eq!(features, SparseVector::zeros(vectorizer.dimension()));
}
