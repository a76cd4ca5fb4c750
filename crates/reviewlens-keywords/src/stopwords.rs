//! Stopword set for keyword statistics

use std::collections::HashSet;

/// Domain words too common in shopping reviews to be informative
pub const DEFAULT_STOPWORDS: [&str; 10] = [
    "상품", "쇼핑몰", "정말", "도대체", "이거", "그냥", "너무", "완전", "진짜", "때문",
];

/// Immutable stopword set
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The default domain stopwords
    pub fn new() -> Self {
        Self::from_words(DEFAULT_STOPWORDS)
    }

    /// Exactly the given words
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(|w| w.into().to_lowercase()).collect(),
        }
    }

    /// The default set plus `extra`
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut stopwords = Self::new();
        stopwords
            .words
            .extend(extra.into_iter().map(|w| w.into().to_lowercase()));
        stopwords
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for StopWords {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let stopwords = StopWords::new();
        assert_eq!(stopwords.len(), 10);
        assert!(stopwords.contains("상품"));
        assert!(!stopwords.contains("배송"));
    }

    #[test]
    fn test_extra_words_are_normalized() {
        let stopwords = StopWords::with_extra(["Brand"]);
        assert!(stopwords.contains("brand"));
        assert!(stopwords.contains("쇼핑몰"));
    }
}
