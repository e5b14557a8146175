use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

/// Number of whitespace separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of unicode scalar values.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Key under which two sentences count as the same during alignment.
///
/// Leading and trailing whitespace is removed and every inner whitespace run becomes a single
/// space, so re-wrapped or re-indented sentences still match.
pub fn anchor_key(sentence: &str) -> Cow<'_, str> {
    static REGEX_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

    let trimmed = sentence.trim();
    // most sentences are already single-space separated
    let needs_collapse = trimmed
        .split(' ')
        .any(|word| word.is_empty() || word.contains(char::is_whitespace));
    if !needs_collapse {
        return Cow::Borrowed(trimmed);
    }

    REGEX_WHITESPACE.replace_all(trimmed, " ")
}

/// Concatenate sentences with a single space.
pub fn join_sentences<'a>(sentences: impl IntoIterator<Item = &'a str>) -> String {
    let mut result = String::new();
    for sentence in sentences {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(sentence);
    }
    result
}

/// Replace characters that would break a line/tab oriented output format.
pub fn flatten_whitespace(text: &str) -> Cow<'_, str> {
    if text.contains(['\t', '\n', '\r']) {
        Cow::Owned(text.replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(text)
    }
}
