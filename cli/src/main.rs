//! searchable-pdf CLI - scanned PDF + OCR results → searchable PDF

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use crossbeam_channel::{select, Sender};
use indicatif::{ProgressBar, ProgressStyle};

use searchable_pdf::{
    load, FontSource, PageSource, PdfSource, PdfWriter, ReconstructOptions, ReconstructReport,
    Reconstructor, RecordingSink, TextMode,
};

#[derive(Parser)]
#[command(name = "searchable-pdf")]
#[command(version)]
#[command(about = "Turn scanned PDFs into searchable PDFs using OCR results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a searchable PDF from a scan and its OCR results
    Convert {
        /// Scanned source PDF
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// OCR result files or directories of result shards
        #[arg(value_name = "OCR_JSON|DIR", required = true)]
        ocr: Vec<PathBuf>,

        /// Output PDF
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// TrueType/OpenType font for the text layer
        #[arg(long, value_name = "FILE", env = "SEARCHABLE_PDF_FONT")]
        font: Option<PathBuf>,

        /// Draw the text layer visibly (for checking alignment)
        #[arg(long)]
        visible: bool,

        /// Do not stretch words to the width of their boxes
        #[arg(long)]
        no_fit: bool,

        /// Ignore OCR results for pages the PDF does not have
        #[arg(long)]
        lenient_pages: bool,

        /// Document title
        #[arg(long)]
        title: Option<String>,
    },

    /// Summarize OCR results, optionally checking them against a PDF
    Inspect {
        /// OCR result files or directories of result shards
        #[arg(value_name = "OCR_JSON|DIR", required = true)]
        ocr: Vec<PathBuf>,

        /// Source PDF to check the results against
        #[arg(long, value_name = "PDF")]
        pdf: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            ocr,
            output,
            font,
            visible,
            no_fit,
            lenient_pages,
            title,
        } => {
            let mut options = ReconstructOptions::new()
                .with_fit_width(!no_fit)
                .with_strict_page_count(!lenient_pages);
            if visible {
                options = options.with_text_mode(TextMode::Visible);
            }
            if let Some(font) = font {
                options = options.with_font(FontSource::File(font));
            }
            if let Some(title) = title {
                options = options.with_title(title);
            }
            cmd_convert(&input, &ocr, &output, &options)
        }
        Commands::Inspect { ocr, pdf, json } => cmd_inspect(&ocr, pdf.as_deref(), json),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// A spinner ticking on a background thread until told to stop.
struct Spinner {
    bar: ProgressBar,
    done: Sender<()>,
    handle: JoinHandle<()>,
}

impl Spinner {
    fn start(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        bar.set_message(message.to_string());

        let (done, stop) = crossbeam_channel::bounded::<()>(1);
        let ticker = bar.clone();
        let handle = thread::spawn(move || loop {
            select! {
                recv(stop) -> _ => break,
                default(Duration::from_millis(80)) => ticker.tick(),
            }
        });

        Self { bar, done, handle }
    }

    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn finish(self, message: &str) {
        let _ = self.done.send(());
        let _ = self.handle.join();
        self.bar.finish_with_message(message.to_string());
    }

    fn abandon(self) {
        let _ = self.done.send(());
        let _ = self.handle.join();
        self.bar.finish_and_clear();
    }
}

fn cmd_convert(
    input: &Path,
    ocr: &[PathBuf],
    output: &Path,
    options: &ReconstructOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("converting {} with {:?}", input.display(), options);
    let spinner = Spinner::start("Loading OCR results...");

    let result = (|| {
        let index = load::load_index(ocr)?;
        spinner.set_message(&format!("Indexed {} pages, opening PDF...", index.len()));
        let source = PdfSource::open(input)?;

        spinner.set_message(&format!("Rebuilding {} pages...", source.page_count()));
        let mut writer = PdfWriter::new(options)?;
        let report = Reconstructor::new(&source, &index, options).run(&mut writer)?;

        spinner.set_message("Writing output...");
        writer.save_atomic(output)?;
        Ok::<_, searchable_pdf::Error>(report)
    })();

    let report = match result {
        Ok(report) => {
            spinner.finish("Done!");
            report
        }
        Err(e) => {
            spinner.abandon();
            return Err(e.into());
        }
    };

    println!("\n{} {}", "Saved to".green(), output.display());
    print_report(&report);
    Ok(())
}

fn print_report(report: &ReconstructReport) {
    println!("{}: {}", "Pages".bold(), report.pages);
    println!("{}: {}", "Annotated".bold(), report.annotated_pages);
    println!("{}: {}", "Words".bold(), report.words);

    if !report.missing_pages.is_empty() {
        println!(
            "{} no OCR results for pages {}",
            "Warning:".yellow().bold(),
            format_pages(&report.missing_pages)
        );
    }
    if !report.empty_pages.is_empty() {
        println!(
            "{} {}",
            "No text recognized on pages".dimmed(),
            format_pages(&report.empty_pages)
        );
    }
    for (page, message) in &report.failed_pages {
        println!(
            "{} OCR failed on page {}: {}",
            "Warning:".yellow().bold(),
            page,
            message
        );
    }
    if !report.ignored_pages.is_empty() {
        println!(
            "{} ignored OCR results for pages {} beyond the end of the document",
            "Warning:".yellow().bold(),
            format_pages(&report.ignored_pages)
        );
    }
    if report.replaced_characters > 0 {
        println!(
            "{} {} characters could not be encoded by the font (try --font)",
            "Warning:".yellow().bold(),
            report.replaced_characters
        );
    }
}

/// Collapse sorted page numbers into ranges: `1-3, 7, 9-10`.
fn format_pages(pages: &[u32]) -> String {
    let mut ranges: Vec<String> = Vec::new();
    let mut iter = pages.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            ranges.push(start.to_string());
        } else {
            ranges.push(format!("{}-{}", start, end));
        }
    }
    ranges.join(", ")
}

fn cmd_inspect(
    ocr: &[PathBuf],
    pdf: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let index = load::load_index(ocr)?;
    log::debug!("indexed {} pages from {} input(s)", index.len(), ocr.len());

    // Dry run against the PDF: catches page-count and malformed-word errors
    // without writing anything
    let checked = match pdf {
        Some(path) => {
            let source = PdfSource::open(path)?;
            let options = ReconstructOptions::new().lenient_pages();
            let mut sink = RecordingSink::new();
            let report = Reconstructor::new(&source, &index, &options).run(&mut sink)?;
            Some(report)
        }
        None => None,
    };

    if json {
        let summary = serde_json::json!({
            "pages": index.page_numbers().collect::<Vec<_>>(),
            "words": index.word_count(),
            "failures": index.failures(),
            "report": checked,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "OCR Results".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    let pages: Vec<u32> = index.page_numbers().collect();
    println!("{}: {}", "Pages".bold(), format_pages(&pages));
    println!("{}: {}", "Words".bold(), index.word_count());
    println!("{}: {}", "Failures".bold(), index.failures().len());
    if checked.is_none() {
        for (page, message) in index.failures() {
            println!(
                "{} OCR failed on page {}: {}",
                "Warning:".yellow().bold(),
                page,
                message
            );
        }
    }

    if let Some(report) = checked {
        println!();
        println!("{}", "Check against PDF".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        print_report(&report);
    }

    Ok(())
}

fn cmd_version() {
    println!(
        "{} {}",
        "searchable-pdf".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("Searchable PDF reconstruction from OCR results");
    println!();
    println!("Library: {}", searchable_pdf::VERSION);
    println!("License: MIT");
}
