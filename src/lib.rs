// SPDX-License-Identifier: MPL-2.0
//! # wikiedits
//!
//! Extraction of edited sentence pairs from complete Wikipedia revision-history dumps.
//!
//! ## Overview
//!
//! `wikiedits` reads a MediaWiki XML export with full history (e.g. `pages-meta-history`) in a
//! single streaming pass, pairs up consecutive revisions of every page, aligns their texts on a
//! sentence level and keeps the sentences that were *edited*: changed in place, not merely
//! inserted or deleted. The result is a labeled dataset of `(old sentence, new sentence)` pairs
//! with surrounding context and similarity scores, useful e.g. for training spelling and grammar
//! correction models.
//!
//! **Key Features:**
//!
//! - **Streaming**: Memory usage is bounded by one revision pair, independent of the dump size.
//! - **Composable**: Parser, pairing and extraction are plain iterators and can be used independently.
//! - **Pluggable**: Sentence segmentation and scoring are traits, so other language models or
//!   metrics can be substituted.
//!
//! ## Basic Usage
//!
//! ```rust
//! use wikiedits::algorithm::EditExtractor;
//! use wikiedits::config::ExtractorConfig;
//! use wikiedits::dump_parser::DumpReader;
//! use wikiedits::revision_pairs::RevisionPairsExt;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let xml = r#"<mediawiki><page><title>Cat</title><ns>0</ns><id>1</id>
//!         <revision><id>10</id><text>The cat sat on the mat. It was happy.</text></revision>
//!         <revision><id>11</id><text>The cat sat on the mat. It was very happy.</text></revision>
//!     </page></mediawiki>"#;
//!
//!     let extractor = EditExtractor::new(ExtractorConfig::default())?;
//!     let pairs = DumpReader::new(xml.as_bytes()).revision_pairs();
//!     for batch in extractor.extract_pairs(pairs) {
//!         let batch = batch?;
//!         for edit in &batch.edits {
//!             println!("{} -> {} (ratio {})", edit.old_text, edit.new_text, edit.ratio);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules and API
//!
//! - [`dump_parser`]: [`dump_parser::DumpReader`], an iterator over the revisions of a dump.
//! - [`revision_pairs`]: pairs of consecutive revisions of the same page.
//! - [`algorithm`]: [`algorithm::EditExtractor`], the segmentation, alignment and filter pipeline.
//! - [`alignment`]: sentence alignment and decomposition of replaced spans.
//! - [`segmenter`] and [`scoring`]: the two capabilities used by the extractor.
//! - [`emitter`]: the output formats of the command line tool.
//!
//! ## Features and Configuration
//!
//! All thresholds live in [`config::ExtractorConfig`]; the defaults are `min_words = 2`,
//! `max_words = 120`, `min_chars = 10`, `length_diff = 4` and `edit_ratio = 0.3`.
//!
//! ### Logging and Error Handling
//!
//! - Uses the `tracing` crate for logging warnings and errors.
//! - The parser is designed to recover from anomalies in the dump when possible. Enable the
//!   `strict` feature to make the parser terminate upon encountering them.
//!
//! ```toml
//! [dependencies]
//! wikiedits = { version = "0.1.0", features = ["strict"] }
//! ```
//!
//! ## Limitations
//!
//! - **Markup**: Texts are wikitext as found in the dump. Neither markup nor character entities
//!   are converted.
//! - **Segmentation**: The default segmenter uses Unicode sentence boundaries with a small list
//!   of abbreviations per language and will make mistakes a trained model would not.

pub mod algorithm;
pub mod alignment;
pub mod config;
pub mod dump_parser;
pub mod emitter;
pub mod revision_pairs;
pub mod scoring;
pub mod segmenter;
#[cfg(test)]
mod test_support;
pub mod utils;
