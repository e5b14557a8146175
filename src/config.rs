use crate::segmenter::Language;

/// Thresholds and options of the edit extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// Language of the sentence segmenter.
    pub language: Language,
    /// Minimum number of words in each sentence of an edit (inclusive).
    pub min_words: usize,
    /// Maximum number of words in each sentence of an edit (inclusive).
    pub max_words: usize,
    /// Minimum number of characters in each sentence of an edit.
    pub min_chars: usize,
    /// Maximum difference in word count between the old and the new sentence.
    pub length_diff: usize,
    /// Maximum relative dissimilarity; an edit needs `ratio >= 1 - edit_ratio`.
    pub edit_ratio: f64,
    /// Number of unchanged sentences collected on each side of an edit.
    pub context_window: usize,
    /// Revision texts longer than this are not segmented.
    pub max_text_bytes: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            min_words: 2,
            max_words: 120,
            min_chars: 10,
            length_diff: 4,
            edit_ratio: 0.3,
            context_window: 2,
            max_text_bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("min_words ({min_words}) is larger than max_words ({max_words})")]
    WordBounds { min_words: usize, max_words: usize },
    #[error("edit_ratio must be between 0 and 1, got {0}")]
    EditRatio(f64),
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_words > self.max_words {
            return Err(ConfigError::WordBounds {
                min_words: self.min_words,
                max_words: self.max_words,
            });
        }
        if !(0.0..=1.0).contains(&self.edit_ratio) {
            return Err(ConfigError::EditRatio(self.edit_ratio));
        }
        Ok(())
    }
}
