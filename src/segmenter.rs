//! Sentence segmentation.
//!
//! The extractor only depends on the [`SentenceSegmenter`] trait. [`UnicodeSegmenter`] is the
//! default implementation: Unicode (UAX #29) sentence boundaries, repaired with a small
//! per-language list of abbreviations that do not end a sentence.

use std::{fmt::Display, str::FromStr, sync::LazyLock};

use regex::Regex;
use rustc_hash::FxHashSet;
use unicode_segmentation::UnicodeSegmentation;

// dotted abbreviations like "U.S", "e.g" or "z.B", without the final period
static REGEX_DOTTED_ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\p{L}\.)+\p{L}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum SegmentationError {
    #[error("text of {len} bytes exceeds the segmentation limit of {limit} bytes")]
    TextTooLarge { len: usize, limit: usize },
    /// For segmenters backed by an external model.
    #[error("sentence segmentation failed: {0}")]
    Failed(String),
}

/// Splits a block of text into an ordered list of sentences.
pub trait SentenceSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, SegmentationError>;
}

impl<T: SentenceSegmenter + ?Sized> SentenceSegmenter for &T {
    fn segment(&self, text: &str) -> Result<Vec<String>, SegmentationError> {
        (**self).segment(text)
    }
}

impl<T: SentenceSegmenter + ?Sized> SentenceSegmenter for Box<T> {
    fn segment(&self, text: &str) -> Result<Vec<String>, SegmentationError> {
        (**self).segment(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Czech,
    Danish,
    Dutch,
    #[default]
    English,
    Estonian,
    Finnish,
    French,
    German,
    Greek,
    Italian,
    Norwegian,
    Polish,
    Portuguese,
    Slovene,
    Spanish,
    Swedish,
    Turkish,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language `{0}`")]
pub struct UnknownLanguage(pub String);

impl Language {
    pub const ALL: [Language; 17] = [
        Language::Czech,
        Language::Danish,
        Language::Dutch,
        Language::English,
        Language::Estonian,
        Language::Finnish,
        Language::French,
        Language::German,
        Language::Greek,
        Language::Italian,
        Language::Norwegian,
        Language::Polish,
        Language::Portuguese,
        Language::Slovene,
        Language::Spanish,
        Language::Swedish,
        Language::Turkish,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Czech => "czech",
            Language::Danish => "danish",
            Language::Dutch => "dutch",
            Language::English => "english",
            Language::Estonian => "estonian",
            Language::Finnish => "finnish",
            Language::French => "french",
            Language::German => "german",
            Language::Greek => "greek",
            Language::Italian => "italian",
            Language::Norwegian => "norwegian",
            Language::Polish => "polish",
            Language::Portuguese => "portuguese",
            Language::Slovene => "slovene",
            Language::Spanish => "spanish",
            Language::Swedish => "swedish",
            Language::Turkish => "turkish",
        }
    }

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Czech => "cs",
            Language::Danish => "da",
            Language::Dutch => "nl",
            Language::English => "en",
            Language::Estonian => "et",
            Language::Finnish => "fi",
            Language::French => "fr",
            Language::German => "de",
            Language::Greek => "el",
            Language::Italian => "it",
            Language::Norwegian => "no",
            Language::Polish => "pl",
            Language::Portuguese => "pt",
            Language::Slovene => "sl",
            Language::Spanish => "es",
            Language::Swedish => "sv",
            Language::Turkish => "tr",
        }
    }

    // lowercase, without the final period
    fn abbreviations(&self) -> &'static [&'static str] {
        match self {
            Language::Czech => &["např", "tzv", "resp", "mj", "str", "č", "sv", "tj"],
            Language::Danish => &["f.eks", "bl.a", "osv", "nr", "ca", "hr", "mht"],
            Language::Dutch => &[
                "dhr", "mevr", "dr", "prof", "bijv", "o.a", "nr", "blz", "ca", "m.a.w",
            ],
            Language::English => &[
                "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "e.g", "i.e", "cf",
                "approx", "fig", "gen", "col", "lt", "sgt", "capt", "gov", "sen", "rep", "rev",
                "inc", "ltd", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept",
                "oct", "nov", "dec",
            ],
            Language::Estonian => &["nt", "vt", "dr", "prof", "u"],
            Language::Finnish => &["esim", "mm", "ks", "tri", "prof", "n"],
            Language::French => &[
                "m", "mme", "mlle", "dr", "st", "ste", "av", "env", "cf", "p", "mgr",
            ],
            Language::German => &[
                "z.b", "bzw", "usw", "ca", "dr", "prof", "nr", "str", "vgl", "evtl", "ggf", "d.h",
                "u.a", "jh", "hrsg", "bzgl", "inkl", "s",
            ],
            Language::Greek => &["κ", "π.χ", "δηλ", "βλ"],
            Language::Italian => &["sig", "sig.ra", "dott", "prof", "pag", "ca", "s"],
            Language::Norwegian => &["f.eks", "bl.a", "osv", "nr", "ca", "mht"],
            Language::Polish => &[
                "np", "tzw", "dr", "prof", "ul", "ok", "tj", "m.in", "godz", "r", "w", "wg", "im",
                "św",
            ],
            Language::Portuguese => &["sr", "sra", "dr", "dra", "prof", "av", "pág", "nº"],
            Language::Slovene => &["npr", "dr", "g", "ga", "prof", "t.i"],
            Language::Spanish => &[
                "sr", "sra", "srta", "dr", "dra", "ud", "uds", "pág", "av", "pp",
            ],
            Language::Swedish => &["t.ex", "bl.a", "dvs", "ca", "nr", "s.k"],
            Language::Turkish => &["dr", "prof", "örn", "bkz", "yy", "doç"],
        }
    }

    fn abbreviation_set(&self) -> &'static FxHashSet<&'static str> {
        static SETS: LazyLock<Vec<FxHashSet<&'static str>>> = LazyLock::new(|| {
            Language::ALL
                .iter()
                .map(|language| language.abbreviations().iter().copied().collect())
                .collect()
        });
        &SETS[*self as usize]
    }

    /// Capitalized words that usually begin a new sentence rather than continue a name.
    fn sentence_starters(&self) -> &'static [&'static str] {
        match self {
            Language::English => &[
                "a", "after", "an", "and", "as", "at", "but", "he", "her", "his", "however", "i",
                "in", "it", "its", "on", "she", "so", "that", "the", "their", "then", "there",
                "these", "they", "this", "those", "we", "when", "you",
            ],
            Language::German => &[
                "aber", "am", "auch", "das", "dann", "der", "die", "dies", "ein", "eine", "er",
                "es", "im", "in", "sie", "wir",
            ],
            Language::French => &[
                "ce", "cette", "elle", "il", "ils", "la", "le", "les", "mais", "nous", "on", "un",
                "une",
            ],
            Language::Spanish => &[
                "el", "ella", "ellos", "en", "es", "la", "las", "los", "pero", "un", "una",
            ],
            Language::Dutch => &[
                "de", "dat", "die", "dit", "het", "hij", "in", "maar", "we", "ze", "zij",
            ],
            _ => &[],
        }
    }

    /// Single letters that are words of their own and not initials.
    fn is_one_letter_word(&self, c: char) -> bool {
        matches!((self, c), (Language::English, 'I'))
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|language| language.name() == lower || language.code() == lower)
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Language aware splitter on top of Unicode sentence boundaries.
#[derive(Debug, Clone)]
pub struct UnicodeSegmenter {
    language: Language,
    max_text_bytes: Option<usize>,
}

impl UnicodeSegmenter {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            max_text_bytes: None,
        }
    }

    /// Refuse texts longer than `limit` bytes instead of segmenting them.
    pub fn with_max_text_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_text_bytes = limit;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Whether the sentence boundary between `previous` and `next` falls after an
    /// abbreviation or an initial and should be removed.
    fn continues_sentence(&self, previous: &str, next: &str) -> bool {
        let Some(last_word) = previous.split_whitespace().last() else {
            return false;
        };
        let Some(word) = last_word.strip_suffix('.') else {
            return false;
        };
        let word = word.trim_start_matches(|c: char| !c.is_alphanumeric());

        if let Some(c) = single_char(word) {
            if c.is_uppercase() && !self.language.is_one_letter_word(c) {
                return self.continues_name(next);
            }
        }

        REGEX_DOTTED_ABBREVIATION.is_match(word)
            || self
                .language
                .abbreviation_set()
                .contains(word.to_lowercase().as_str())
    }

    /// After an initial like the "J." in "J. R. R. Tolkien" the sentence goes on if the next
    /// piece starts with another initial or with a capitalized word that is not a common
    /// sentence opener.
    fn continues_name(&self, next: &str) -> bool {
        let Some(first_word) = next.split_whitespace().next() else {
            return false;
        };
        if first_word
            .strip_suffix('.')
            .and_then(single_char)
            .is_some_and(char::is_uppercase)
        {
            return true;
        }
        let word = first_word.trim_matches(|c: char| !c.is_alphanumeric());
        if !word.chars().next().is_some_and(char::is_uppercase) {
            return false;
        }
        !self
            .language
            .sentence_starters()
            .contains(&word.to_lowercase().as_str())
    }
}

fn single_char(word: &str) -> Option<char> {
    let mut chars = word.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

impl Default for UnicodeSegmenter {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

impl SentenceSegmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, SegmentationError> {
        if let Some(limit) = self.max_text_bytes {
            if text.len() > limit {
                return Err(SegmentationError::TextTooLarge {
                    len: text.len(),
                    limit,
                });
            }
        }

        let mut sentences = Vec::new();
        // byte range of the sentence being assembled
        let mut current: Option<(usize, usize)> = None;

        for (start, piece) in text.split_sentence_bound_indices() {
            let end = start + piece.len();
            current = match current {
                Some((current_start, current_end)) => {
                    let previous = &text[current_start..current_end];
                    let separator = &previous[previous.trim_end().len()..];
                    if !separator.contains('\n') && self.continues_sentence(previous, piece) {
                        Some((current_start, end))
                    } else {
                        sentences.push(previous.trim().to_string());
                        Some((start, end))
                    }
                }
                None => Some((start, end)),
            };
        }
        if let Some((start, end)) = current {
            sentences.push(text[start..end].trim().to_string());
        }

        sentences.retain(|sentence| !sentence.is_empty());
        Ok(sentences)
    }
}
