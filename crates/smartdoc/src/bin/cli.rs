//! SmartDoc command line tool
//!
//! Usage:
//!   smartdoc ask report.pdf --question "What is the conclusion?"
//!   smartdoc ask report.pdf                 # interactive, one question per line
//!   smartdoc chunks report.pdf --size 2000 --overlap 200

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use smartdoc::{
    config::AppConfig, generation::truncate_chars, AskRequest, DocumentQa, FileParser, TextChunker,
};

/// Ask questions about a PDF document
#[derive(Parser)]
#[command(name = "smartdoc", version, about = "Ask questions about a PDF document")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "SMARTDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter
    #[arg(long, global = true, default_value = "smartdoc=warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a document and answer questions about it
    Ask {
        /// Document to load (.pdf, .txt or .md)
        file: PathBuf,

        /// Answer a single question and exit
        #[arg(long, short)]
        question: Option<String>,
    },
    /// Show how a document is split into chunks
    Chunks {
        /// Document to split
        file: PathBuf,

        /// Override the chunk size in characters
        #[arg(long)]
        size: Option<usize>,

        /// Override the overlap in characters
        #[arg(long)]
        overlap: Option<usize>,

        /// Characters of each chunk to print
        #[arg(long, default_value_t = 60)]
        show: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log))
        .with_writer(io::stderr)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Ask { file, question } => ask(config, &file, question).await,
        Command::Chunks {
            file,
            size,
            overlap,
            show,
        } => {
            if let Some(size) = size {
                config.chunking.chunk_size = size;
            }
            if let Some(overlap) = overlap {
                config.chunking.chunk_overlap = overlap;
            }
            config.validate()?;
            chunks(&config, &file, show)
        }
    }
}

async fn ask(config: AppConfig, file: &Path, question: Option<String>) -> Result<()> {
    let qa = DocumentQa::from_config(config)?;
    let session = qa.create_session();

    let (filename, data) = read_document(file)?;
    let spinner = spinner(format!("Processing {}...", filename))?;
    let loaded = qa.load_document(&session, &filename, data.into()).await;
    spinner.finish_and_clear();
    let loaded = loaded?;

    let summary = loaded.summary();
    println!(
        "{} {} ({} pages, {} chunks)",
        style("Loaded").green().bold(),
        summary.filename,
        summary.total_pages,
        summary.total_chunks
    );
    println!("\n{}\n{}\n", style("Preview").bold(), style(qa.preview(&loaded)).dim());

    if let Some(question) = question {
        return answer(&qa, &session, &question).await;
    }

    println!("Ask a question (empty line or Ctrl+D to quit)");
    let stdin = io::stdin();
    loop {
        print!("{} ", style(">").cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let request = AskRequest::new(line);
        let Some(question) = request.trimmed_question() else {
            break;
        };

        // A failed question leaves the session usable
        if let Err(e) = answer(&qa, &session, question).await {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
        }
    }

    Ok(())
}

async fn answer(qa: &DocumentQa, session: &Uuid, question: &str) -> Result<()> {
    let spinner = spinner("Thinking...".to_string())?;
    let turn = qa.ask(session, question).await;
    spinner.finish_and_clear();
    let turn = turn?;

    println!("\n{}\n{}\n", style("Answer").bold(), turn.answer);
    println!(
        "{}",
        style(format!(
            "{} / {} - {} chunks, {} context chars",
            turn.provider, turn.model, turn.chunks_used, turn.context_chars
        ))
        .dim()
    );
    Ok(())
}

fn chunks(config: &AppConfig, file: &Path, show: usize) -> Result<()> {
    let (filename, data) = read_document(file)?;
    let document = FileParser::from_config(&config.extraction).parse(&filename, &data)?;
    let chunker = TextChunker::from_config(&config.chunking)?;
    let chunks = chunker.chunk_document(&document);

    println!(
        "{} {}: {} chars, {} pages, {} chunks (size {}, overlap {})",
        style("Document").bold(),
        filename,
        document.full_text().chars().count(),
        document.page_count(),
        chunks.len(),
        chunker.chunk_size(),
        chunker.overlap()
    );

    for chunk in &chunks {
        let page = chunk
            .page_number
            .map(|p| format!("p{}", p))
            .unwrap_or_else(|| "-".to_string());
        let snippet = truncate_chars(&chunk.content, show).replace('\n', " ");
        println!(
            "{:>4}  {:>8}..{:<8} {:>5}  {}",
            style(chunk.index).cyan(),
            chunk.char_start,
            chunk.char_end,
            page,
            style(snippet).dim()
        );
    }

    Ok(())
}

fn read_document(file: &Path) -> Result<(String, Vec<u8>)> {
    let data = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("not a file: {}", file.display()))?;
    Ok((filename, data))
}

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}
