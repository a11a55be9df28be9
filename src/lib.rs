//! # searchable-pdf
//!
//! Rebuild scanned PDFs as searchable documents from OCR results.
//!
//! Every page of the source PDF is captured as a template and redrawn
//! unchanged; on top of it an invisible text layer places each recognized
//! word at the position the OCR service reported, so the scan can be
//! searched, selected and copied.
//!
//! ## Quick Start
//!
//! ```no_run
//! use searchable_pdf::{make_searchable, ReconstructOptions};
//!
//! fn main() -> searchable_pdf::Result<()> {
//!     let report = make_searchable(
//!         "scan.pdf",
//!         &["ocr-output/"],
//!         "scan-searchable.pdf",
//!         &ReconstructOptions::default(),
//!     )?;
//!
//!     for page in &report.missing_pages {
//!         eprintln!("page {} had no OCR results", page);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **OCR input**: Cloud Vision `AsyncBatchAnnotateFiles` JSON, single files
//!   or sharded output directories
//! - **Faithful pages**: the source page is embedded as a Form XObject, never
//!   re-rasterized
//! - **Fonts**: built-in glyphless Helvetica, or any TrueType/OpenType font for
//!   non-Latin scripts
//! - **Atomic output**: nothing is written unless the whole document was built

pub mod detect;
pub mod error;
pub mod index;
pub mod load;
pub mod model;
pub mod options;
pub mod reconstruct;
pub mod render;
pub mod source;
pub mod writer;

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf_bytes, PdfFormat};
pub use error::{Error, Result};
pub use index::{AnnotationIndex, PageLookup};
pub use model::{
    AnnotateFileResponse, AnnotateImageResponse, BoundingBox, BoundingPoly, NormalizedVertex,
    PageGeometry, TextAnnotation, Word,
};
pub use options::{ReconstructOptions, TextMode};
pub use reconstruct::{ReconstructReport, Reconstructor};
pub use render::{FontSource, OverlayFont, TextDraw};
pub use source::{PageSource, PageTemplate, PdfSource};
pub use writer::{DocumentSink, PdfWriter, RecordingSink};

use std::path::Path;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a searchable PDF from a scanned PDF and its OCR result files.
///
/// `ocr_inputs` may mix result files and directories of sharded results.
/// The output is written atomically: on error, `output` is left untouched.
///
/// # Example
///
/// ```no_run
/// use searchable_pdf::{make_searchable, ReconstructOptions};
///
/// let options = ReconstructOptions::new().with_font_file("NotoSansJP-Regular.otf");
/// let report = make_searchable("in.pdf", &["out-1-to-20.json"], "out.pdf", &options).unwrap();
/// println!("{} words", report.words);
/// ```
pub fn make_searchable<S, P, O>(
    source: S,
    ocr_inputs: &[P],
    output: O,
    options: &ReconstructOptions,
) -> Result<ReconstructReport>
where
    S: AsRef<Path>,
    P: AsRef<Path>,
    O: AsRef<Path>,
{
    let index = if options.parallel {
        load::load_index(ocr_inputs)?
    } else {
        load::load_index_sequential(ocr_inputs)?
    };
    let source = PdfSource::open(source)?;

    let mut writer = PdfWriter::new(options)?;
    let report = Reconstructor::new(&source, &index, options).run(&mut writer)?;
    writer.save_atomic(output)?;
    Ok(report)
}

/// Build a searchable PDF in memory.
///
/// Returns the serialized document together with the run report.
pub fn make_searchable_bytes(
    pdf: &[u8],
    index: &AnnotationIndex,
    options: &ReconstructOptions,
) -> Result<(Vec<u8>, ReconstructReport)> {
    let source = PdfSource::from_bytes(pdf)?;
    let mut writer = PdfWriter::new(options)?;
    let report = Reconstructor::new(&source, index, options).run(&mut writer)?;
    Ok((writer.finish()?, report))
}

/// Builder-style API for creating searchable PDFs.
///
/// # Example
///
/// ```no_run
/// use searchable_pdf::SearchablePdf;
///
/// let report = SearchablePdf::new()
///     .lenient_pages()
///     .with_title("Board minutes 1987")
///     .convert("scan.pdf", &["ocr/"], "minutes.pdf")?;
/// # Ok::<(), searchable_pdf::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchablePdf {
    options: ReconstructOptions,
}

impl SearchablePdf {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a TrueType/OpenType font for the text layer.
    pub fn with_font(mut self, font: FontSource) -> Self {
        self.options = self.options.with_font(font);
        self
    }

    /// Draw the text layer visibly.
    pub fn visible_text(mut self) -> Self {
        self.options = self.options.visible_text();
        self
    }

    /// Disable horizontal fitting of words to their boxes.
    pub fn without_fit(mut self) -> Self {
        self.options = self.options.with_fit_width(false);
        self
    }

    /// Ignore OCR results for pages the source does not have.
    pub fn lenient_pages(mut self) -> Self {
        self.options = self.options.lenient_pages();
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options = self.options.with_title(title);
        self
    }

    /// Disable parallel decoding of result files.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// The options this builder has collected.
    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Convert files on disk.
    pub fn convert<S, P, O>(&self, source: S, ocr_inputs: &[P], output: O) -> Result<ReconstructReport>
    where
        S: AsRef<Path>,
        P: AsRef<Path>,
        O: AsRef<Path>,
    {
        make_searchable(source, ocr_inputs, output, &self.options)
    }

    /// Convert in memory.
    pub fn convert_bytes(
        &self,
        pdf: &[u8],
        index: &AnnotationIndex,
    ) -> Result<(Vec<u8>, ReconstructReport)> {
        make_searchable_bytes(pdf, index, &self.options)
    }
}
