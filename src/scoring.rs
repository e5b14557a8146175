//! Similarity scores between an old and a new sentence.

/// Similarity of a sentence pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    /// Word level similarity in `[0, 1]`, higher is more similar.
    pub ratio: f64,
    /// Normalized character level edit distance in `[0, 1]`, lower is more similar.
    pub dist: f64,
}

pub trait Scorer {
    fn score(&self, old: &str, new: &str) -> Scores;

    /// Only the word level similarity. Scorers may override this when `dist` is expensive.
    fn ratio(&self, old: &str, new: &str) -> f64 {
        self.score(old, new).ratio
    }
}

impl<T: Scorer + ?Sized> Scorer for &T {
    fn score(&self, old: &str, new: &str) -> Scores {
        (**self).score(old, new)
    }

    fn ratio(&self, old: &str, new: &str) -> f64 {
        (**self).ratio(old, new)
    }
}

/// Scores based on Levenshtein distance.
///
/// * `ratio = 1 - lev(words_old, words_new) / max(|words_old|, |words_new|)`
/// * `dist = lev(chars_old, chars_new) / max(|chars_old|, |chars_new|)`
///
/// Two empty texts have `ratio = 1` and `dist = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinScorer;

impl Scorer for LevenshteinScorer {
    fn score(&self, old: &str, new: &str) -> Scores {
        let old_chars: Vec<char> = old.chars().collect();
        let new_chars: Vec<char> = new.chars().collect();
        let longest = old_chars.len().max(new_chars.len());
        let dist = if longest == 0 {
            0.0
        } else {
            levenshtein(&old_chars, &new_chars) as f64 / longest as f64
        };

        Scores {
            ratio: self.ratio(old, new),
            dist,
        }
    }

    fn ratio(&self, old: &str, new: &str) -> f64 {
        let old_words: Vec<&str> = old.split_whitespace().collect();
        let new_words: Vec<&str> = new.split_whitespace().collect();
        let longest = old_words.len().max(new_words.len());
        if longest == 0 {
            return 1.0;
        }
        1.0 - levenshtein(&old_words, &new_words) as f64 / longest as f64
    }
}

/// Edit distance (insertions, deletions, substitutions) between two sequences.
pub fn levenshtein<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    // keep the row as short as possible
    let (a, b) = if a.len() < b.len() { (b, a) } else { (a, b) };
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, item_a) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, item_b) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(item_a != item_b);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
