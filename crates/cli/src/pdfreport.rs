//! pdfreport - Extract PDF links, rich media, comments, and outline as JSON.
//!
//! Produces the full document report, and optionally writes the embedded
//! rich-media assets into a target directory, named by their embedded
//! filenames.

use anyhow::Context;
use clap::Parser;
use marginalia_core::{Document, Extraction};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdfreport")]
#[command(version, about = "Extract PDF links, media, comments, and outline as JSON", long_about = None)]
struct Args {
    /// Path to the PDF file
    file: PathBuf,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Directory to write rich-media assets into
    #[arg(long = "media-dir")]
    media_dir: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Print recovered per-item failures to stderr
    #[arg(long)]
    diagnostics: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let file = File::open(&args.file)
        .with_context(|| format!("cannot open {}", args.file.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("cannot map {}", args.file.display()))?;
    let doc = Document::from_mmap(mmap)
        .with_context(|| format!("cannot parse {}", args.file.display()))?;

    let extraction = Extraction::build(&doc)?;

    if args.diagnostics {
        for d in &extraction.diagnostics {
            eprintln!("page {}: {}", d.page, d.detail);
        }
    }

    if let Some(dir) = &args.media_dir {
        extraction
            .save_assets(dir)
            .with_context(|| format!("cannot write assets to {}", dir.display()))?;
    }

    let json = extraction.report.to_json(args.pretty)?;

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        Box::new(BufWriter::new(File::create(&args.outfile)?))
    };
    writeln!(output, "{json}")?;
    output.flush()?;

    Ok(())
}
