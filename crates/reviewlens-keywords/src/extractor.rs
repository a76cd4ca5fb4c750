//! Keyword tokenization and frequency ranking

use rayon::prelude::*;
use reviewlens_core::{KeywordCount, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::analyzer::{KoDicAnalyzer, MorphAnalyzer, PartOfSpeech};
use crate::stopwords::StopWords;

/// Batches smaller than this are tokenized on the calling thread
const PARALLEL_THRESHOLD: usize = 32;

/// A normalized keyword with its grammatical category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordToken {
    pub text: String,
    pub pos: PartOfSpeech,
}

/// Extracts and ranks keywords from review text
#[derive(Clone)]
pub struct KeywordExtractor {
    analyzer: Arc<dyn MorphAnalyzer>,
    stopwords: Arc<StopWords>,
}

impl KeywordExtractor {
    /// Extractor using the ko-dic analyzer and default stopwords
    pub fn new() -> Result<Self> {
        Ok(Self::with_parts(
            Arc::new(KoDicAnalyzer::new()?),
            StopWords::new(),
        ))
    }

    pub fn with_parts(analyzer: Arc<dyn MorphAnalyzer>, stopwords: StopWords) -> Self {
        Self {
            analyzer,
            stopwords: Arc::new(stopwords),
        }
    }

    pub fn analyzer(&self) -> &Arc<dyn MorphAnalyzer> {
        &self.analyzer
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    /// Lowercase, analyze, and keep multi-character nouns and adjectives
    /// that are not stopwords, in source order
    pub fn tokenize(&self, text: &str) -> Result<Vec<KeywordToken>> {
        let lowered = text.to_lowercase();
        let tokens = self
            .analyzer
            .analyze(&lowered)?
            .into_iter()
            .filter(|m| m.pos.is_keyword_category())
            .filter(|m| m.lemma.chars().count() > 1)
            .filter(|m| !self.stopwords.contains(&m.lemma))
            .map(|m| KeywordToken {
                text: m.lemma,
                pos: m.pos,
            })
            .collect();
        Ok(tokens)
    }

    /// Keyword strings only
    pub fn tokenize_words(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.tokenize(text)?.into_iter().map(|t| t.text).collect())
    }

    /// Most frequent keywords across `documents`
    ///
    /// Counts descend; equal counts keep the order in which the keyword
    /// first appeared across the input. A non-positive `limit` or an empty
    /// batch yields no keywords.
    pub fn aggregate_top_keywords<S>(&self, documents: &[S], limit: i64) -> Result<Vec<KeywordCount>>
    where
        S: AsRef<str> + Sync,
    {
        if limit <= 0 || documents.is_empty() {
            return Ok(Vec::new());
        }

        let tokenized: Vec<Vec<String>> = if documents.len() < PARALLEL_THRESHOLD {
            documents
                .iter()
                .map(|doc| self.tokenize_words(doc.as_ref()))
                .collect::<Result<_>>()?
        } else {
            documents
                .par_iter()
                .map(|doc| self.tokenize_words(doc.as_ref()))
                .collect::<Result<_>>()?
        };

        let mut counts: Vec<KeywordCount> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for word in tokenized.into_iter().flatten() {
            match positions.get(&word) {
                Some(&idx) => counts[idx].count += 1,
                None => {
                    positions.insert(word.clone(), counts.len());
                    counts.push(KeywordCount::new(word, 1));
                }
            }
        }

        // Stable sort keeps first-occurrence order among ties
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

        debug!(
            documents = documents.len(),
            distinct = positions.len(),
            returned = counts.len(),
            "Aggregated keywords"
        );

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn extractor() -> &'static KeywordExtractor {
        static EXTRACTOR: OnceLock<KeywordExtractor> = OnceLock::new();
        EXTRACTOR.get_or_init(|| KeywordExtractor::new().unwrap())
    }

    fn words(text: &str) -> Vec<String> {
        extractor().tokenize_words(text).unwrap()
    }

    #[test]
    fn test_tokenize_drops_stopwords_and_single_chars() {
        let ordered = words("주문한 상품이 마음에 들어요");
        assert_eq!(ordered, vec!["주문", "마음"]);
        assert!(!ordered.contains(&"상품".to_string()));
    }

    #[test]
    fn test_tokenize_keeps_adjective_lemmas() {
        let tokens = extractor().tokenize("디자인이 예뻐서 마음에 들어요").unwrap();
        assert_eq!(
            tokens,
            vec![
                KeywordToken {
                    text: "디자인".to_string(),
                    pos: PartOfSpeech::Noun
                },
                KeywordToken {
                    text: "예쁘다".to_string(),
                    pos: PartOfSpeech::Adjective
                },
                KeywordToken {
                    text: "마음".to_string(),
                    pos: PartOfSpeech::Noun
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_derived_and_irregular_adjectives() {
        assert_eq!(words("화면이 선명하고 부드러워요"), vec!["화면", "선명하다", "부드럽다"]);
        assert_eq!(words("색깔이 밝고 예쁩니다"), vec!["색깔", "밝다", "예쁘다"]);
    }

    #[test]
    fn test_tokenize_skips_adverbs_and_inflected_verbs() {
        let arrived = words("엄청 빨리 도착했고 굉장히 만족합니다");
        for dropped in ["엄청", "빨리", "굉장히", "도착했고", "만족합니다"] {
            assert!(!arrived.contains(&dropped.to_string()), "{dropped} in {arrived:?}");
        }
        assert!(arrived.contains(&"도착".to_string()));

        let honest = words("솔직히 기대 이하였어요");
        assert!(!honest.contains(&"솔직히".to_string()));
        assert!(honest.contains(&"기대".to_string()));

        assert!(words("금방 왔네요").is_empty());
    }

    #[test]
    fn test_tokenize_lowercases() {
        assert_eq!(words("배송 FAST"), vec!["배송"]);
    }

    #[test]
    fn test_aggregate_counts_and_ties() {
        let docs = [
            "배송이 빠르고 포장도 좋아요",
            "포장이 꼼꼼해요",
            "배송이 늦어서 아쉬웠어요",
        ];
        let top = extractor().aggregate_top_keywords(&docs, 3).unwrap();

        assert_eq!(top[0], KeywordCount::new("배송", 2));
        assert_eq!(top[1], KeywordCount::new("포장", 2));
        // 빠르다 is the first single-count keyword seen
        assert_eq!(top[2], KeywordCount::new("빠르다", 1));
    }

    #[test]
    fn test_aggregate_edge_cases() {
        let extractor = extractor();
        let empty: [&str; 0] = [];
        assert!(extractor.aggregate_top_keywords(&empty, 5).unwrap().is_empty());
        assert!(extractor.aggregate_top_keywords(&["배송 포장"], 0).unwrap().is_empty());
        assert!(extractor.aggregate_top_keywords(&["배송 포장"], -3).unwrap().is_empty());
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let extractor = extractor();
        let docs: Vec<String> = (0..100)
            .map(|i| {
                if i % 3 == 0 {
                    "가격 대비 품질이 괜찮아요".to_string()
                } else {
                    "배송이 빨라서 좋았습니다".to_string()
                }
            })
            .collect();

        let parallel = extractor.aggregate_top_keywords(&docs, 10).unwrap();
        let sequential = extractor
            .aggregate_top_keywords(&docs[..PARALLEL_THRESHOLD - 1], 10)
            .unwrap();

        assert_eq!(parallel[0].keyword, "배송");
        assert_eq!(parallel[0].count, 66);
        assert_eq!(
            parallel.iter().map(|k| &k.keyword).collect::<Vec<_>>(),
            sequential.iter().map(|k| &k.keyword).collect::<Vec<_>>()
        );
    }
}
