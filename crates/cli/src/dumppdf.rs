//! dumppdf - Print the object graph of a PDF file
//!
//! Loads a file through the recovering loader, reports which strategy
//! produced the object table and writes the requested objects back out in
//! PDF syntax.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use pdfgraft_core::model::write_indirect;
use pdfgraft_core::{FileSource, LoadOptions, ObjNum, PdfFile, ResourceStore, Value};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// A command line tool for dumping the objects of a PDF file.
#[derive(Parser, Debug)]
#[command(name = "dumppdf")]
#[command(author, version, about = "Dump the object graph of a PDF file", long_about = None)]
struct Args {
    /// Path to the PDF file
    file: PathBuf,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Dump every object, in ascending object number order
    #[arg(short = 'a', long = "all", action = ArgAction::SetTrue)]
    all: bool,

    /// Object numbers to dump. Use -i 1,2,3 or repeat the flag
    #[arg(short = 'i', long = "objects", value_delimiter = ',', action = ArgAction::Append)]
    objects: Vec<ObjNum>,

    /// List the page objects with their media boxes
    #[arg(long = "pages", action = ArgAction::SetTrue)]
    pages: bool,

    /// Print the trailer dictionary
    #[arg(long = "trailer", action = ArgAction::SetTrue)]
    trailer: bool,

    /// Write streams decompressed, without their Filter entry
    #[arg(long = "inflate", action = ArgAction::SetTrue)]
    inflate: bool,

    /// Move one page's resources (1-indexed) into a store and print the
    /// embedding order
    #[arg(long = "collect", value_name = "PAGE")]
    collect: Option<usize>,

    /// Skip the cross-reference index and scan the file front to back
    #[arg(long = "sequential", action = ArgAction::SetTrue)]
    sequential: bool,
}

/// Write one object as `N 0 obj ... endobj`.
fn dump_object<W: Write>(out: &mut W, file: &PdfFile, num: ObjNum, inflate: bool) -> Result<()> {
    let Some(value) = file.object(num) else {
        eprintln!("Warning: object {num} not found");
        return Ok(());
    };
    let mut buf = Vec::new();
    write_indirect(&mut buf, num, value, None, inflate);
    out.write_all(&buf)?;
    Ok(())
}

fn dump_trailer<W: Write>(out: &mut W, file: &PdfFile) -> Result<()> {
    let mut buf = b"trailer\n".to_vec();
    Value::Dict(file.trailer().clone()).write(&mut buf, None, false);
    buf.push(b'\n');
    out.write_all(&buf)?;
    Ok(())
}

fn dump_pages<W: Write>(out: &mut W, file: &PdfFile) -> Result<()> {
    for index in 0..file.count_pages() {
        let num = file
            .page_object_number(index)
            .map_or_else(|| "?".to_owned(), |n| n.to_string());
        match file.media_box(index) {
            Some((x0, y0, x1, y1)) => {
                writeln!(out, "page {} obj {num} mediabox [{x0} {y0} {x1} {y1}]", index + 1)?
            }
            None => writeln!(out, "page {} obj {num} mediabox -", index + 1)?,
        }
    }
    Ok(())
}

fn collect_page<W: Write>(out: &mut W, file: &mut PdfFile, page: usize) -> Result<()> {
    let Some(index) = page.checked_sub(1).filter(|&i| i < file.count_pages()) else {
        bail!("page {page} out of range (1..={})", file.count_pages());
    };
    let mut store = ResourceStore::new();
    store
        .collect_page(file, index)
        .with_context(|| format!("collecting resources of page {page}"))?;
    let sequence: Vec<String> = store.embed_sequence().iter().map(|n| n.to_string()).collect();
    writeln!(out, "embed sequence: {}", sequence.join(" "))?;
    writeln!(out, "{}", store.describe())?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if !args.file.exists() {
        bail!("File not found: {}", args.file.display());
    }

    let options = LoadOptions {
        use_structural_index: !args.sequential,
        ..LoadOptions::default()
    };
    let source = FileSource::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;
    let mut file = PdfFile::load_with(source, &options)
        .with_context(|| format!("loading {}", args.file.display()))?;
    eprintln!(
        "{}: {} objects, {} pages, loaded by {}",
        args.file.display(),
        file.len(),
        file.count_pages(),
        file.strategy()
    );

    let mut output = BufWriter::new(io::stdout().lock());

    if args.trailer {
        dump_trailer(&mut output, &file)?;
    }
    if args.pages {
        dump_pages(&mut output, &file)?;
    }
    if args.all {
        for num in file.object_numbers() {
            dump_object(&mut output, &file, num, args.inflate)?;
        }
    } else {
        for &num in &args.objects {
            dump_object(&mut output, &file, num, args.inflate)?;
        }
    }
    if let Some(page) = args.collect {
        collect_page(&mut output, &mut file, page)?;
    }

    // Nothing selected: show the trailer
    if !(args.trailer || args.pages || args.all || !args.objects.is_empty() || args.collect.is_some()) {
        dump_trailer(&mut output, &file)?;
    }

    output.flush()?;
    Ok(())
}
