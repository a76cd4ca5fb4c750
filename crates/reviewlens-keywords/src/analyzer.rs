//! Morphological analysis
//!
//! A [`MorphAnalyzer`] splits text into lemmatized morphemes tagged with a
//! part of speech. The keyword extractor keeps only nouns and adjectives, so
//! analyzers only need to be precise about those two categories.
//!
//! [`KoDicAnalyzer`] segments text with lindera over the embedded ko-dic
//! dictionary and maps its Sejong tags onto [`PartOfSpeech`]. Predicates are
//! lemmatized to `stem + 다`, and a noun or root directly followed by an
//! adjective-deriving suffix (선명 + 하) becomes one adjective (선명하다).

use lindera::dictionary::{load_dictionary, load_user_dictionary};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;
use reviewlens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;
use tracing::info;

/// Dictionary bundled into the binary by lindera
pub const KO_DIC_URI: &str = "embedded://ko-dic";

// ko-dic feature columns
const DETAIL_TAG: usize = 0;
const DETAIL_TYPE: usize = 4;
const DETAIL_EXPRESSION: usize = 7;

/// Grammatical category of a morpheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    /// Pronouns (NP)
    Pronoun,
    /// Dependent nouns such as 것, 수, 개 (NNB, NNBC)
    BoundNoun,
    Adjective,
    Verb,
    Adverb,
    Determiner,
    Interjection,
    Josa,
    Eomi,
    Prefix,
    Suffix,
    /// Bound roots such as 선명 in 선명하다 (XR)
    Root,
    Number,
    Alpha,
    Punctuation,
    Unknown,
}

impl PartOfSpeech {
    /// Coarse category of a Sejong tag as used by ko-dic
    pub fn from_sejong(tag: &str) -> Self {
        match tag {
            "NNG" | "NNP" => Self::Noun,
            "NP" => Self::Pronoun,
            "NNB" | "NNBC" => Self::BoundNoun,
            "NR" | "SN" => Self::Number,
            "VA" => Self::Adjective,
            "VV" | "VX" | "VCP" | "VCN" => Self::Verb,
            "MAG" | "MAJ" => Self::Adverb,
            "MM" => Self::Determiner,
            "IC" => Self::Interjection,
            "XPN" => Self::Prefix,
            "XSN" | "XSV" | "XSA" => Self::Suffix,
            "XR" => Self::Root,
            "SL" | "SH" => Self::Alpha,
            t if t.starts_with('J') => Self::Josa,
            t if t.starts_with('E') => Self::Eomi,
            t if t.starts_with('S') => Self::Punctuation,
            _ => Self::Unknown,
        }
    }

    /// Categories that count as keywords
    pub fn is_keyword_category(self) -> bool {
        matches!(self, Self::Noun | Self::Adjective)
    }

    fn is_predicate(self) -> bool {
        matches!(self, Self::Adjective | Self::Verb)
    }
}

/// One analyzed unit of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    /// Text as it appeared in the input
    pub surface: String,

    /// Dictionary form (stem + 다 for predicates)
    pub lemma: String,

    pub pos: PartOfSpeech,
}

impl Morpheme {
    pub fn new(surface: impl Into<String>, lemma: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            surface: surface.into(),
            lemma: lemma.into(),
            pos,
        }
    }
}

/// Trait for morphological analyzers
pub trait MorphAnalyzer: Send + Sync {
    /// Analyze text into morphemes in source order
    fn analyze(&self, text: &str) -> Result<Vec<Morpheme>>;

    /// Analyzer name
    fn name(&self) -> &str;
}

/// Korean analyzer over lindera's ko-dic segmenter
pub struct KoDicAnalyzer {
    segmenter: Segmenter,
}

impl KoDicAnalyzer {
    /// Analyzer over the embedded ko-dic dictionary
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Analyzer over ko-dic plus a user dictionary
    ///
    /// The file is a lindera ko-dic user dictionary, either a CSV of
    /// `surface,tag,reading` rows or a prebuilt `.bin`.
    pub fn with_user_dictionary(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(Some(path.as_ref()))
    }

    fn build(user_dictionary: Option<&Path>) -> Result<Self> {
        let dictionary = load_dictionary(KO_DIC_URI)
            .map_err(|e| Error::config(format!("Failed to load dictionary {KO_DIC_URI}: {e}")))?;

        let user_dictionary = match user_dictionary {
            Some(path) => {
                let uri = path.to_string_lossy().into_owned();
                let user = load_user_dictionary(&uri, &dictionary.metadata).map_err(|e| {
                    Error::config(format!("Failed to load user dictionary {uri}: {e}"))
                })?;
                info!(path = %uri, "Loaded user dictionary");
                Some(user)
            }
            None => None,
        };

        Ok(Self {
            segmenter: Segmenter::new(Mode::Normal, dictionary, user_dictionary),
        })
    }

    fn segment(&self, text: &str) -> Result<Vec<Tagged>> {
        let tokens = self
            .segmenter
            .segment(Cow::Borrowed(text))
            .map_err(|e| Error::transform(format!("Failed to segment text: {e}")))?;

        let mut tagged = Vec::with_capacity(tokens.len());
        for mut token in tokens {
            let surface = token.surface.to_string();
            if surface.trim().is_empty() {
                continue;
            }
            let (byte_start, byte_end) = (token.byte_start, token.byte_end);
            let details: Vec<String> = token.details().iter().map(|d| d.to_string()).collect();
            tagged.push(Tagged::new(surface, &details, byte_start, byte_end));
        }
        Ok(tagged)
    }
}

impl MorphAnalyzer for KoDicAnalyzer {
    fn analyze(&self, text: &str) -> Result<Vec<Morpheme>> {
        Ok(lemmatize(self.segment(text)?))
    }

    fn name(&self) -> &str {
        "ko-dic"
    }
}

/// A segmented token with its leading tag and predicate stem
#[derive(Debug)]
struct Tagged {
    surface: String,
    tag: String,
    stem: String,
    byte_start: usize,
    byte_end: usize,
}

impl Tagged {
    fn new(surface: String, details: &[String], byte_start: usize, byte_end: usize) -> Self {
        // Inflected entries carry compound tags such as VA+EF
        let tag = details
            .get(DETAIL_TAG)
            .and_then(|t| t.split('+').next())
            .unwrap_or_default()
            .to_string();

        // 예쁩니다 is stored as 예쁘/VA/*+ㅂ니다/EF/*
        let stem = match details.get(DETAIL_TYPE).map(String::as_str) {
            Some("Inflect") | Some("Preanalysis") => details
                .get(DETAIL_EXPRESSION)
                .and_then(|e| e.split('/').next())
                .filter(|s| !s.is_empty() && *s != "*")
                .map(str::to_string),
            _ => None,
        }
        .unwrap_or_else(|| surface.clone());

        Self {
            surface,
            tag,
            stem,
            byte_start,
            byte_end,
        }
    }

    fn pos(&self) -> PartOfSpeech {
        PartOfSpeech::from_sejong(&self.tag)
    }
}

fn lemmatize(tokens: Vec<Tagged>) -> Vec<Morpheme> {
    let mut morphemes = Vec::with_capacity(tokens.len());
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        let pos = token.pos();

        if matches!(pos, PartOfSpeech::Noun | PartOfSpeech::Root) {
            let end = token.byte_end;
            if let Some(suffix) = tokens.next_if(|next| next.tag == "XSA" && next.byte_start == end) {
                morphemes.push(Morpheme::new(
                    format!("{}{}", token.surface, suffix.surface),
                    format!("{}{}다", token.surface, suffix.stem),
                    PartOfSpeech::Adjective,
                ));
                continue;
            }
        }

        let lemma = if pos.is_predicate() {
            format!("{}다", token.stem)
        } else {
            token.surface.clone()
        };
        morphemes.push(Morpheme::new(token.surface, lemma, pos));
    }

    morphemes
}
