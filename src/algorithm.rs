//! Extraction of sentence edits from pairs of revisions.
//!
//! For every pair both texts are segmented into sentences and aligned (see [`crate::alignment`]).
//! Each replaced span is decomposed into corresponding sentence groups, every group is scored
//! and only groups passing all thresholds of the [`ExtractorConfig`] become [`CandidateEdit`]s.

use crate::{
    alignment::{align, decompose, AlignedSpan, Sentence, SpanKind},
    config::{ConfigError, ExtractorConfig},
    revision_pairs::RevisionPair,
    scoring::{LevenshteinScorer, Scorer},
    segmenter::{SegmentationError, SentenceSegmenter, UnicodeSegmenter},
    utils::{char_count, join_sentences, word_count},
};

/// An old sentence (or short run of sentences) and the text that replaced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateEdit {
    pub old_text: String,
    pub new_text: String,
    /// Unchanged sentences right before the edit, in order.
    pub prev_context: Vec<String>,
    /// Unchanged sentences right after the edit, in order.
    pub next_context: Vec<String>,
    pub ratio: f64,
    pub dist: f64,
}

/// The first threshold a candidate edit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Identical,
    TooFewWords,
    TooManyWords,
    TooShort,
    LengthDifference,
    TooDissimilar,
}

/// Threshold predicates derived from an [`ExtractorConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct EditFilter {
    pub min_words: usize,
    pub max_words: usize,
    pub min_chars: usize,
    pub length_diff: usize,
    pub min_ratio: f64,
}

impl EditFilter {
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            min_words: config.min_words,
            max_words: config.max_words,
            min_chars: config.min_chars,
            length_diff: config.length_diff,
            min_ratio: 1.0 - config.edit_ratio,
        }
    }

    pub fn check(&self, edit: &CandidateEdit) -> Result<(), Rejection> {
        if edit.old_text == edit.new_text {
            return Err(Rejection::Identical);
        }

        let old_words = word_count(&edit.old_text);
        let new_words = word_count(&edit.new_text);
        if old_words.min(new_words) < self.min_words {
            return Err(Rejection::TooFewWords);
        }
        if old_words.max(new_words) > self.max_words {
            return Err(Rejection::TooManyWords);
        }
        if char_count(&edit.old_text).min(char_count(&edit.new_text)) < self.min_chars {
            return Err(Rejection::TooShort);
        }
        if old_words.abs_diff(new_words) > self.length_diff {
            return Err(Rejection::LengthDifference);
        }
        if edit.ratio < self.min_ratio {
            return Err(Rejection::TooDissimilar);
        }
        Ok(())
    }
}

/// The accepted edits of one revision pair. `edits` may be empty.
#[derive(Debug, Clone)]
pub struct EditBatch {
    pub pair: RevisionPair,
    pub edits: Vec<CandidateEdit>,
}

pub struct EditExtractor<S = UnicodeSegmenter, C = LevenshteinScorer> {
    config: ExtractorConfig,
    filter: EditFilter,
    segmenter: S,
    scorer: C,
}

impl EditExtractor {
    /// Extractor with the Unicode segmenter for `config.language` and Levenshtein scores.
    pub fn new(config: ExtractorConfig) -> Result<Self, ConfigError> {
        let segmenter =
            UnicodeSegmenter::new(config.language).with_max_text_bytes(config.max_text_bytes);
        Self::with_capabilities(config, segmenter, LevenshteinScorer)
    }
}

impl<S: SentenceSegmenter, C: Scorer> EditExtractor<S, C> {
    pub fn with_capabilities(
        config: ExtractorConfig,
        segmenter: S,
        scorer: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            filter: EditFilter::from_config(&config),
            config,
            segmenter,
            scorer,
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn context(
        &self,
        sentences: &[Sentence],
        span: Option<&AlignedSpan>,
        before: bool,
    ) -> Vec<String> {
        let Some(span) = span.filter(|span| span.kind == SpanKind::Unchanged) else {
            return Vec::new();
        };
        let window = self.config.context_window.min(span.old.len());
        let range = if before {
            span.old.end - window..span.old.end
        } else {
            span.old.start..span.old.start + window
        };
        sentences[range].iter().map(|s| s.text.clone()).collect()
    }

    /// All accepted edits between two revision texts, in document order.
    pub fn extract(
        &self,
        old_text: &str,
        new_text: &str,
    ) -> Result<Vec<CandidateEdit>, SegmentationError> {
        let old = Sentence::sequence(self.segmenter.segment(old_text)?);
        let new = Sentence::sequence(self.segmenter.segment(new_text)?);
        let spans = align(&old, &new);

        let mut edits = Vec::new();
        for (k, span) in spans.iter().enumerate() {
            if span.kind != SpanKind::Replaced {
                continue;
            }

            let old_run = &old[span.old.clone()];
            let new_run = &new[span.new.clone()];
            let prev_context = self.context(&old, k.checked_sub(1).map(|p| &spans[p]), true);
            let next_context = self.context(&old, spans.get(k + 1), false);

            for (old_group, new_group) in decompose(old_run, new_run, &self.scorer) {
                let old_text = join_sentences(old_run[old_group].iter().map(|s| s.text.as_str()));
                let new_text = join_sentences(new_run[new_group].iter().map(|s| s.text.as_str()));
                let scores = self.scorer.score(&old_text, &new_text);

                let edit = CandidateEdit {
                    old_text,
                    new_text,
                    prev_context: prev_context.clone(),
                    next_context: next_context.clone(),
                    ratio: scores.ratio,
                    dist: scores.dist,
                };
                match self.filter.check(&edit) {
                    Ok(()) => edits.push(edit),
                    Err(rejection) => tracing::trace!(
                        message = "Rejected candidate edit",
                        ?rejection,
                        old_text = %edit.old_text,
                        new_text = %edit.new_text,
                        ratio = edit.ratio
                    ),
                }
            }
        }

        Ok(edits)
    }

    /// Extract the edits of every pair in a stream.
    ///
    /// A pair whose text cannot be segmented is logged and gives an empty batch. Stream errors
    /// are passed through.
    pub fn extract_pairs<'a, I, E>(
        &'a self,
        pairs: I,
    ) -> impl Iterator<Item = Result<EditBatch, E>> + 'a
    where
        I: IntoIterator<Item = Result<RevisionPair, E>> + 'a,
        I::IntoIter: 'a,
        E: 'a,
    {
        pairs.into_iter().map(move |pair| {
            let pair = pair?;
            let edits = match self.extract(pair.old_text(), pair.new_text()) {
                Ok(edits) => edits,
                Err(err) => {
                    tracing::warn!(
                        message = "Sentence segmentation failed, skipping revision pair",
                        error = %err,
                        page_id = pair.new.page.id,
                        old_revision_id = pair.old.id,
                        new_revision_id = pair.new.id
                    );
                    Vec::new()
                }
            };
            tracing::debug!(
                message = "Extracted edits",
                page_id = pair.new.page.id,
                revision_id = pair.new.id,
                edits = edits.len()
            );
            Ok(EditBatch { pair, edits })
        })
    }
}
