//! Error types for searchable-pdf.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for searchable-pdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a searchable PDF.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source file is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing the source PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The source document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A source page's content or resources cannot be read.
    #[error("Cannot read page {page}: {reason}")]
    UnreadablePage {
        /// 1-based page number
        page: u32,
        /// What could not be read
        reason: String,
    },

    /// A page has no usable MediaBox.
    #[error("Invalid geometry for page {page}: {reason}")]
    InvalidPageGeometry {
        /// 1-based page number
        page: u32,
        /// What was wrong with the box
        reason: String,
    },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The OCR results reference pages the source document does not have.
    #[error("OCR results cover page {annotated} but the document has {pages} pages")]
    PageCountMismatch {
        /// Highest annotated page number
        annotated: u32,
        /// Page count of the source document
        pages: u32,
    },

    /// An OCR response has no usable page number.
    #[error("Invalid page number in OCR response: {0}")]
    InvalidPageNumber(String),

    /// A word's bounding polygon has no vertices.
    #[error("Word on page {page} has an empty bounding polygon")]
    EmptyPolygon {
        /// 1-based page number (0 when not yet known)
        page: u32,
    },

    /// A word has no symbols.
    #[error("Word on page {page} has no symbols")]
    EmptyWord {
        /// 1-based page number (0 when not yet known)
        page: u32,
    },

    /// An OCR result file could not be read.
    #[error("Failed to read OCR results from {path}: {source}")]
    AnnotationRead {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// An OCR result file could not be decoded.
    #[error("Failed to decode OCR results from {path}: {source}")]
    AnnotationDecode {
        /// File the JSON came from
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The overlay font could not be loaded.
    #[error("Failed to load font from {origin}: {reason}")]
    FontLoad {
        /// Where the font was loaded from
        origin: String,
        /// What went wrong
        reason: String,
    },

    /// The output could not be written to its destination.
    #[error("Failed to write output to {path}: {source}")]
    OutputWrite {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error serializing the output document.
    #[error("PDF writing error: {0}")]
    PdfWrite(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Attach a page number to a word-level error raised before the page was known.
    pub fn on_page(self, page: u32) -> Self {
        match self {
            Error::EmptyPolygon { .. } => Error::EmptyPolygon { page },
            Error::EmptyWord { .. } => Error::EmptyWord { page },
            other => other,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::AnnotationDecode {
            path: PathBuf::from("<memory>"),
            source: err,
        }
    }
}
