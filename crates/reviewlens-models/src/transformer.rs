//! TF-IDF feature transformer
//!
//! The transformer artifact mirrors a fitted TF-IDF vectorizer: a term to
//! column vocabulary, one idf weight per column, and the settings used when
//! it was fitted. Two analyzers are supported. `word` splits on the
//! `\b\w\w+\b` token pattern and emits word n-grams; `morph` runs the
//! keyword crate's ko-dic analyzer and uses morpheme lemmas as terms.

use regex::Regex;
use reviewlens_core::{Error, Result};
use reviewlens_keywords::{KoDicAnalyzer, MorphAnalyzer, PartOfSpeech};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::sparse::SparseVector;

const WORD_PATTERN: &str = r"\b\w\w+\b";

/// Row normalization applied after idf weighting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    None,
}

/// How raw text is split into terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerKind {
    #[default]
    Word,
    Morph,
}

/// Serialized TF-IDF vectorizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfArtifact {
    /// Term to column index
    pub vocabulary: BTreeMap<String, usize>,

    /// Inverse document frequency per column
    pub idf: Vec<f64>,

    #[serde(default = "default_lowercase")]
    pub lowercase: bool,

    /// Use `1 + ln(tf)` instead of raw counts
    #[serde(default)]
    pub sublinear_tf: bool,

    #[serde(default)]
    pub norm: Norm,

    /// Inclusive n-gram bounds for the word analyzer
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),

    #[serde(default)]
    pub analyzer: AnalyzerKind,
}

fn default_lowercase() -> bool {
    true
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

impl TfidfArtifact {
    /// Number of feature columns
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Check that the vocabulary and idf table agree
    pub fn validate(&self) -> Result<()> {
        let out_of_range = self
            .vocabulary
            .iter()
            .find(|(_, col)| **col >= self.idf.len());

        if let Some((term, col)) = out_of_range {
            return Err(Error::config(format!(
                "vocabulary term '{}' maps to column {} but idf has {} entries",
                term,
                col,
                self.idf.len()
            )));
        }

        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::config(format!(
                "invalid ngram_range ({min_n}, {max_n})"
            )));
        }

        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err(Error::config("idf weights must be finite"));
        }

        Ok(())
    }
}

/// Options for fitting a vectorizer from a corpus
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub analyzer: AnalyzerKind,
    pub ngram_range: (usize, usize),
    pub sublinear_tf: bool,
    pub norm: Norm,
    /// Terms seen in fewer documents are dropped
    pub min_df: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerKind::Word,
            ngram_range: (1, 1),
            sublinear_tf: false,
            norm: Norm::L2,
            min_df: 1,
        }
    }
}

enum TermSource {
    Word(Regex),
    Morph(Arc<dyn MorphAnalyzer>),
}

/// Runtime TF-IDF vectorizer
pub struct TfidfVectorizer {
    artifact: TfidfArtifact,
    terms: TermSource,
}

impl fmt::Debug for TfidfVectorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TfidfVectorizer")
            .field("analyzer", &self.artifact.analyzer)
            .field("dimension", &self.artifact.dimension())
            .finish()
    }
}

impl TfidfVectorizer {
    /// Build from an artifact, loading the ko-dic analyzer when needed
    pub fn new(artifact: TfidfArtifact) -> Result<Self> {
        Self::build(artifact, None)
    }

    /// Build from an artifact, sharing an existing morphological analyzer
    pub fn with_analyzer(artifact: TfidfArtifact, analyzer: Arc<dyn MorphAnalyzer>) -> Result<Self> {
        Self::build(artifact, Some(analyzer))
    }

    fn build(artifact: TfidfArtifact, analyzer: Option<Arc<dyn MorphAnalyzer>>) -> Result<Self> {
        artifact.validate()?;

        let terms = match (artifact.analyzer, analyzer) {
            (AnalyzerKind::Morph, Some(analyzer)) => TermSource::Morph(analyzer),
            (AnalyzerKind::Morph, None) => TermSource::Morph(Arc::new(KoDicAnalyzer::new()?)),
            (AnalyzerKind::Word, _) => TermSource::Word(word_pattern()?),
        };

        Ok(Self { artifact, terms })
    }

    /// Fit vocabulary and smoothed idf weights on a corpus
    pub fn fit<S: AsRef<str>>(documents: &[S], options: FitOptions) -> Result<Self> {
        let mut artifact = TfidfArtifact {
            vocabulary: BTreeMap::new(),
            idf: Vec::new(),
            lowercase: true,
            sublinear_tf: options.sublinear_tf,
            norm: options.norm,
            ngram_range: options.ngram_range,
            analyzer: options.analyzer,
        };
        let mut vectorizer = Self::new(artifact.clone())?;

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let mut seen: Vec<String> = vectorizer.analyze(doc.as_ref())?;
            seen.sort();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len() as f64;
        for (term, df) in document_frequency {
            if df < options.min_df {
                continue;
            }
            artifact.vocabulary.insert(term, artifact.idf.len());
            artifact.idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
        }

        vectorizer.artifact = artifact;
        Ok(vectorizer)
    }

    pub fn artifact(&self) -> &TfidfArtifact {
        &self.artifact
    }

    pub fn dimension(&self) -> usize {
        self.artifact.dimension()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.artifact.vocabulary.len()
    }

    pub fn analyzer_kind(&self) -> AnalyzerKind {
        self.artifact.analyzer
    }

    /// Terms of `text` in source order, before vocabulary lookup
    pub fn analyze(&self, text: &str) -> Result<Vec<String>> {
        let text = if self.artifact.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        match &self.terms {
            TermSource::Word(pattern) => {
                let words: Vec<&str> = pattern.find_iter(&text).map(|m| m.as_str()).collect();
                Ok(ngrams(&words, self.artifact.ngram_range))
            }
            TermSource::Morph(analyzer) => Ok(analyzer
                .analyze(&text)?
                .into_iter()
                .filter(|m| m.pos != PartOfSpeech::Punctuation)
                .map(|m| m.lemma)
                .collect()),
        }
    }

    /// Featurize one document
    pub fn transform(&self, text: &str) -> Result<SparseVector> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(text)? {
            if let Some(&col) = self.artifact.vocabulary.get(&term) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(col, tf)| {
                let tf = if self.artifact.sublinear_tf {
                    1.0 + tf.ln()
                } else {
                    tf
                };
                (col, tf * self.artifact.idf[col])
            })
            .collect();

        let mut vector = SparseVector::from_pairs(self.dimension(), pairs);
        if self.artifact.norm == Norm::L2 {
            vector.l2_normalize();
        }
        Ok(vector)
    }
}

fn word_pattern() -> Result<Regex> {
    Regex::new(WORD_PATTERN).map_err(|e| Error::internal(format!("Failed to build token pattern: {e}")))
}

fn ngrams(words: &[&str], (min_n, max_n): (usize, usize)) -> Vec<String> {
    if min_n == 1 && max_n == 1 {
        return words.iter().map(|w| w.to_string()).collect();
    }

    let mut terms = Vec::new();
    for n in min_n..=max_n {
        for window in words.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> TfidfArtifact {
        TfidfArtifact {
            vocabulary: [("배송이".to_string(), 0), ("빨라요".to_string(), 1), ("좋아요".to_string(), 2)]
                .into_iter()
                .collect(),
            idf: vec![1.0, 2.0, 1.5],
            lowercase: true,
            sublinear_tf: false,
            norm: Norm::None,
            ngram_range: (1, 1),
            analyzer: AnalyzerKind::Word,
        }
    }

    #[test]
    fn test_word_transform_weights_by_idf() {
        let vectorizer = TfidfVectorizer::new(artifact()).unwrap();
        let v = vectorizer.transform("배송이 빨라요 빨라요 x").unwrap();
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(0, 1.0), (1, 4.0)]);
    }

    #[test]
    fn test_l2_norm_and_sublinear_tf() {
        let mut art = artifact();
        art.norm = Norm::L2;
        art.sublinear_tf = true;
        let vectorizer = TfidfVectorizer::new(art).unwrap();

        let v = vectorizer.transform("빨라요 빨라요 좋아요").unwrap();
        assert!((v.squared_norm() - 1.0).abs() < 1e-9);
        assert_eq!(v.nnz(), 2);
    }

    #[test]
    fn test_unknown_terms_yield_zero_vector() {
        let vectorizer = TfidfVectorizer::new(artifact()).unwrap();
        let v = vectorizer.transform("완전히 다른 문장").unwrap();
        assert!(v.is_zero());
        assert_eq!(v.dim(), 3);
    }

    #[test]
    fn test_validate_rejects_out_of_range_column() {
        let mut art = artifact();
        art.vocabulary.insert("포장".to_string(), 7);
        assert!(TfidfVectorizer::new(art).is_err());

        let mut art = artifact();
        art.ngram_range = (2, 1);
        assert!(art.validate().is_err());
    }

    #[test]
    fn test_bigrams() {
        let terms = ngrams(&["a1", "b2", "c3"], (1, 2));
        assert_eq!(terms, vec!["a1", "b2", "c3", "a1 b2", "b2 c3"]);
    }

    #[test]
    fn test_fit_builds_vocabulary() {
        let docs = ["배송이 빨라요", "배송이 늦어요", "품질 좋아요"];
        let vectorizer = TfidfVectorizer::fit(&docs, FitOptions::default()).unwrap();

        assert_eq!(vectorizer.vocabulary_size(), 5);
        let art = vectorizer.artifact();
        let common = art.idf[art.vocabulary["배송이"]];
        let rare = art.idf[art.vocabulary["품질"]];
        assert!(common < rare);
    }

    #[test]
    fn test_morph_analyzer_uses_lemmas() {
        let docs = ["디자인이 예뻐서 좋아요", "화면이 선명하고 부드러워요"];
        let options = FitOptions {
            analyzer: AnalyzerKind::Morph,
            ..Default::default()
        };
        let vectorizer = TfidfVectorizer::fit(&docs, options).unwrap();
        let vocab = &vectorizer.artifact().vocabulary;

        assert!(vocab.contains_key("예쁘다"));
        assert!(vocab.contains_key("디자인"));
        assert!(vocab.contains_key("선명하다"));
        assert!(vocab.contains_key("부드럽다"));
        assert!(!vocab.contains_key("디자인이"));
        assert!(!vectorizer.transform("디자인 예쁜").unwrap().is_zero());
    }
}
