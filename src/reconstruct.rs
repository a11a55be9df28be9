//! Page reconstruction: the loop that turns a source PDF and its OCR index
//! into a searchable document.
//!
//! Pages are processed strictly in order, one at a time. For each source
//! page the reconstructor reads its size, captures a fresh template, opens
//! an output page, draws every recognized word, stamps the template and
//! closes the page. Any error aborts the whole run; the sink is only
//! finalized by the caller after [`Reconstructor::run`] succeeded.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::index::{AnnotationIndex, PageLookup};
use crate::options::ReconstructOptions;
use crate::render::{placed_words, TextDraw};
use crate::source::PageSource;
use crate::writer::DocumentSink;

/// Outcome of a successful run.
///
/// Pages without any OCR response are not errors: they are rebuilt from the
/// template alone and listed in `missing_pages` so the caller can warn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconstructReport {
    /// Pages written to the output
    pub pages: u32,

    /// Pages that received a text layer
    pub annotated_pages: u32,

    /// Pages whose OCR response carried no text
    pub empty_pages: Vec<u32>,

    /// Pages no OCR response mentioned
    pub missing_pages: Vec<u32>,

    /// Pages whose OCR failed, with the service's error message; also
    /// listed in `empty_pages`
    pub failed_pages: BTreeMap<u32, String>,

    /// Annotated page numbers beyond the source page count (lenient mode only)
    pub ignored_pages: Vec<u32>,

    /// Words drawn across all pages
    pub words: usize,

    /// Characters the overlay font could not encode
    pub replaced_characters: usize,
}

impl ReconstructReport {
    /// Whether every page had a successful OCR response.
    pub fn is_complete(&self) -> bool {
        self.missing_pages.is_empty() && self.failed_pages.is_empty()
    }
}

/// Drives a [`DocumentSink`] over every page of a [`PageSource`].
pub struct Reconstructor<'a, S: PageSource + ?Sized> {
    source: &'a S,
    index: &'a AnnotationIndex,
    options: &'a ReconstructOptions,
}

impl<'a, S: PageSource + ?Sized> Reconstructor<'a, S> {
    /// Create a reconstructor over a source document and its OCR index.
    pub fn new(source: &'a S, index: &'a AnnotationIndex, options: &'a ReconstructOptions) -> Self {
        Self {
            source,
            index,
            options,
        }
    }

    /// Check that the OCR results fit the source document.
    ///
    /// Returns the annotated page numbers beyond the source page count,
    /// which is an error in strict mode.
    pub fn preflight(&self) -> Result<Vec<u32>> {
        let total = self.source.page_count();
        let extra: Vec<u32> = self.index.page_numbers().filter(|p| *p > total).collect();

        if let Some(&highest) = extra.last() {
            if self.options.strict_page_count {
                return Err(Error::PageCountMismatch {
                    annotated: highest,
                    pages: total,
                });
            }
            log::debug!("ignoring OCR results for pages {:?}", extra);
        }
        Ok(extra)
    }

    /// Build every page into `sink`.
    pub fn run<K: DocumentSink + ?Sized>(&self, sink: &mut K) -> Result<ReconstructReport> {
        let total = self.source.page_count();
        let mut report = ReconstructReport {
            ignored_pages: self.preflight()?,
            ..Default::default()
        };

        for page in 1..=total {
            let geometry = self.source.page_geometry(page)?;
            let template = self.source.capture_template(page)?;
            sink.begin_page(&geometry)?;

            match self.index.lookup(page) {
                PageLookup::Annotated(annotation) => {
                    let mut drawn = 0;
                    for placed in placed_words(annotation) {
                        let (word, bbox) = placed.map_err(|e| e.on_page(page))?;
                        sink.draw_text(&TextDraw::place(word, &bbox, &geometry))?;
                        drawn += 1;
                    }
                    log::trace!("page {}: {} words", page, drawn);
                    report.annotated_pages += 1;
                    report.words += drawn;
                }
                PageLookup::Empty => {
                    if let Some(message) = self.index.failures().get(&page) {
                        report.failed_pages.insert(page, message.clone());
                    }
                    report.empty_pages.push(page);
                }
                PageLookup::Missing => report.missing_pages.push(page),
            }

            sink.stamp_template(template)?;
            sink.end_page()?;
            report.pages += 1;
        }

        report.replaced_characters = sink.replaced_characters();
        log::debug!(
            "rebuilt {} pages ({} annotated, {} words)",
            report.pages,
            report.annotated_pages,
            report.words
        );
        Ok(report)
    }
}
