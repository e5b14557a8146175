use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use wikiedits::{
    algorithm::EditExtractor,
    config::ExtractorConfig,
    dump_parser::DumpReader,
    emitter::{Emitter, OutputFormat},
    revision_pairs::RevisionPairsExt,
    segmenter::Language,
};

const PROGRESS_INTERVAL: u64 = 10_000;

/// Extracts edited text fragments from Wikipedia revisions.
#[derive(Debug, clap::Parser)]
struct CommandLine {
    /// Wiki XML dump with complete edit history, `.zst` files are decompressed [default: stdin]
    input: Option<PathBuf>,
    /// File for extracted edits [default: stdout]
    output: Option<PathBuf>,

    /// Print output in OLD_EDIT-TAB-NEW_EDIT format with revision metadata
    #[arg(short, long)]
    tabify: bool,
    /// Include context
    #[arg(short, long)]
    context: bool,
    /// Add levenshtein-based scores
    #[arg(short, long)]
    scores: bool,
    /// Turn on debug logging
    #[arg(long)]
    debug: bool,

    /// Language of the sentence splitter
    #[arg(short, long, default_value_t = Language::English, help_heading = "Selection options")]
    language: Language,
    /// Minimum number of characters in a sentence
    #[arg(long, default_value_t = 10, help_heading = "Selection options")]
    min_chars: usize,
    /// Minimum length of a sentence in words
    #[arg(long, default_value_t = 2, help_heading = "Selection options")]
    min_words: usize,
    /// Maximum length of a sentence in words
    #[arg(long, default_value_t = 120, help_heading = "Selection options")]
    max_words: usize,
    /// Maximum difference in length between edited sentences
    #[arg(long, default_value_t = 4, help_heading = "Selection options")]
    length_diff: usize,
    /// Maximum relative difference in edit distance
    #[arg(long, default_value_t = 0.3, help_heading = "Selection options")]
    edit_ratio: f64,
    /// Number of unchanged sentences of context on each side
    #[arg(long, default_value_t = 2, help_heading = "Selection options")]
    context_window: usize,
    /// Only extract pages of this namespace (repeatable) [default: all]
    #[arg(short = 'n', long = "namespace", help_heading = "Selection options")]
    namespaces: Vec<i32>,
}

impl CommandLine {
    fn config(&self) -> ExtractorConfig {
        ExtractorConfig {
            language: self.language,
            min_words: self.min_words,
            max_words: self.max_words,
            min_chars: self.min_chars,
            length_diff: self.length_diff,
            edit_ratio: self.edit_ratio,
            context_window: self.context_window,
            ..Default::default()
        }
    }

    fn format(&self) -> OutputFormat {
        if self.tabify {
            OutputFormat::Tabular
        } else if self.context {
            OutputFormat::Context
        } else {
            OutputFormat::Plain
        }
    }
}

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    let Some(path) = path else {
        return Ok(Box::new(io::stdin().lock()));
    };
    let reader = BufReader::new(File::open(path)?);
    if path.extension().is_some_and(|ext| ext == "zst") {
        let reader = zstd::stream::Decoder::with_buffer(reader)?;
        Ok(Box::new(BufReader::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(path) => Ok(Box::new(BufWriter::new(File::create(path)?))),
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn run(args: &CommandLine) -> Result<(), Box<dyn Error>> {
    let extractor = EditExtractor::new(args.config())?;
    let input = open_input(args.input.as_deref())
        .map_err(|err| format!("failed to open input: {err}"))?;
    let output = open_output(args.output.as_deref())
        .map_err(|err| format!("failed to open output: {err}"))?;

    let mut emitter = Emitter::new(output, args.format()).with_scores(args.scores);
    emitter.write_header()?;

    let records = DumpReader::new(input).filter(|record| match record {
        Ok(record) if !args.namespaces.is_empty() => record
            .page
            .namespace
            .is_some_and(|ns| args.namespaces.contains(&ns)),
        _ => true,
    });

    let mut pairs = 0u64;
    for batch in extractor.extract_pairs(records.revision_pairs()) {
        let batch = batch?;
        emitter.write_batch(&batch)?;

        pairs += 1;
        if pairs % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                message = "Progress",
                pairs,
                edits = emitter.edits_written(),
                page_id = batch.pair.new.page.id,
                title = %batch.pair.new.page.title
            );
        }
    }
    emitter.flush()?;

    tracing::info!(
        message = "Finished",
        pairs,
        batches_with_edits = emitter.batches_written(),
        edits = emitter.edits_written()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = CommandLine::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(message = "Extraction failed", error = %err);
            ExitCode::FAILURE
        }
    }
}
