//! pdfmeta - Print link metadata, or just the page count, of a PDF file.
//!
//! With no flags, prints the per-page link metadata as a JSON array. With
//! --count, prints the bare page count to stdout.

use anyhow::Context;
use clap::Parser;
use marginalia_core::{Document, Extraction};
use memmap2::Mmap;
use serde_json::json;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdfmeta")]
#[command(version, about = "Print link metadata of a PDF file in JSON format", long_about = None)]
struct Args {
    /// Path to the PDF file
    file: PathBuf,

    /// Print only the number of pages
    #[arg(long)]
    count: bool,
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

    if args.count {
        write!(io::stdout(), "{}", doc.page_count())?;
        io::stdout().flush()?;
        return Ok(());
    }

    let extraction = Extraction::build(&doc)?;
    let metadata: Vec<_> = extraction
        .report
        .pages
        .iter()
        .map(|page| {
            json!({
                "pgno": page.pgno,
                "pgwidth": page.pgwidth,
                "pgheight": page.pgheight,
                "links_metadata": page.links_metadata,
            })
        })
        .collect();

    writeln!(io::stdout(), "{}", serde_json::to_string(&metadata)?)?;
    Ok(())
}
