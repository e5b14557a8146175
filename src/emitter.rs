//! Serialization of extracted edits.

use std::io::{self, Write};

use crate::{
    algorithm::{CandidateEdit, EditBatch},
    utils::flatten_whitespace,
};

const TABULAR_HEADER: &str =
    "old\tnew\tprev_ctxt\tnext_ctxt\trid\ttimestamp\tuid\tminor\tcomment\tpid\tratio\tdist\n";
const CONTEXT_SEPARATOR: &str = "<SEP>";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One tab separated row per edit, with revision metadata.
    Tabular,
    /// Old and new text followed by the surrounding context.
    Context,
    /// Old and new text only.
    #[default]
    Plain,
}

pub struct Emitter<W: Write> {
    writer: W,
    format: OutputFormat,
    scores: bool,
    edits_written: u64,
    batches_written: u64,
}

impl<W: Write> Emitter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            scores: false,
            edits_written: 0,
            batches_written: 0,
        }
    }

    /// Prefix each plain edit with its scores. Tabular rows always carry them.
    pub fn with_scores(mut self, scores: bool) -> Self {
        self.scores = scores;
        self
    }

    pub fn edits_written(&self) -> u64 {
        self.edits_written
    }

    pub fn batches_written(&self) -> u64 {
        self.batches_written
    }

    /// Column header, only written for [`OutputFormat::Tabular`].
    pub fn write_header(&mut self) -> io::Result<()> {
        if self.format == OutputFormat::Tabular {
            self.writer.write_all(TABULAR_HEADER.as_bytes())?;
        }
        Ok(())
    }

    /// Write every edit of the batch. Empty batches are skipped.
    pub fn write_batch(&mut self, batch: &EditBatch) -> io::Result<()> {
        if batch.edits.is_empty() {
            return Ok(());
        }
        for edit in &batch.edits {
            match self.format {
                OutputFormat::Tabular => self.write_row(batch, edit)?,
                OutputFormat::Context => writeln!(
                    self.writer,
                    "{}\n{}\n{}\n{}\n",
                    edit.old_text,
                    edit.new_text,
                    join_context(&edit.prev_context),
                    join_context(&edit.next_context)
                )?,
                OutputFormat::Plain => {
                    if self.scores {
                        writeln!(
                            self.writer,
                            "### scores: {{dist: {}, ratio: {}}}",
                            edit.dist, edit.ratio
                        )?;
                    }
                    writeln!(self.writer, "{}\n{}\n", edit.old_text, edit.new_text)?;
                }
            }
            self.edits_written += 1;
        }
        self.batches_written += 1;
        Ok(())
    }

    fn write_row(&mut self, batch: &EditBatch, edit: &CandidateEdit) -> io::Result<()> {
        let revision = &batch.pair.new;
        let timestamp = revision
            .timestamp
            .map(|timestamp| timestamp.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default();
        let comment = revision.comment.as_deref().unwrap_or("none");

        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            flatten_whitespace(&edit.old_text),
            flatten_whitespace(&edit.new_text),
            flatten_whitespace(&join_context(&edit.prev_context)),
            flatten_whitespace(&join_context(&edit.next_context)),
            display_or_empty(revision.id),
            timestamp,
            revision.contributor.uid().unwrap_or_default(),
            if revision.minor { "T" } else { "F" },
            flatten_whitespace(comment),
            display_or_empty(revision.page.id),
            edit.ratio,
            edit.dist
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn join_context(context: &[String]) -> String {
    context
        .iter()
        .filter(|sentence| !sentence.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

fn display_or_empty(value: Option<u64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}
