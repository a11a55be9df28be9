//! Output document construction.
//!
//! The reconstructor drives a [`DocumentSink`] page by page; [`PdfWriter`]
//! turns those calls into a PDF with `lopdf`, and [`RecordingSink`] keeps
//! them in memory for dry runs and tests.

mod import;
mod pdf_writer;

pub use pdf_writer::PdfWriter;

use crate::error::{Error, Result};
use crate::model::PageGeometry;
use crate::render::TextDraw;
use crate::source::PageTemplate;

/// Receiver of reconstructed pages, in increasing page order.
///
/// For each page the caller invokes `begin_page`, any number of
/// `draw_text`, exactly one `stamp_template`, then `end_page`. Whatever the
/// call order, the template is painted beneath the text.
pub trait DocumentSink {
    /// Start a new page with the given size.
    fn begin_page(&mut self, geometry: &PageGeometry) -> Result<()>;

    /// Add one word to the current page's text layer.
    fn draw_text(&mut self, draw: &TextDraw) -> Result<()>;

    /// Paint a captured source page on the current page.
    fn stamp_template(&mut self, template: PageTemplate) -> Result<()>;

    /// Finish the current page and append it to the document.
    fn end_page(&mut self) -> Result<()>;

    /// Characters replaced so far because the font could not encode them.
    fn replaced_characters(&self) -> usize {
        0
    }
}

/// One page as seen by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPage {
    /// Page size
    pub geometry: PageGeometry,
    /// Text draws, in call order
    pub draws: Vec<TextDraw>,
    /// Source page number of the stamped template
    pub template_page: Option<u32>,
}

/// A sink that keeps every call in memory instead of writing a PDF.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Completed pages
    pub pages: Vec<RecordedPage>,
    current: Option<RecordedPage>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of draws across completed pages.
    pub fn draw_count(&self) -> usize {
        self.pages.iter().map(|p| p.draws.len()).sum()
    }

    fn current(&mut self) -> Result<&mut RecordedPage> {
        self.current.as_mut().ok_or_else(no_open_page)
    }
}

pub(crate) fn no_open_page() -> Error {
    Error::PdfWrite("no page is open".to_string())
}

impl DocumentSink for RecordingSink {
    fn begin_page(&mut self, geometry: &PageGeometry) -> Result<()> {
        if self.current.is_some() {
            return Err(Error::PdfWrite("previous page was not ended".to_string()));
        }
        self.current = Some(RecordedPage {
            geometry: *geometry,
            draws: Vec::new(),
            template_page: None,
        });
        Ok(())
    }

    fn draw_text(&mut self, draw: &TextDraw) -> Result<()> {
        self.current()?.draws.push(draw.clone());
        Ok(())
    }

    fn stamp_template(&mut self, template: PageTemplate) -> Result<()> {
        self.current()?.template_page = Some(template.page);
        Ok(())
    }

    fn end_page(&mut self) -> Result<()> {
        let page = self.current.take().ok_or_else(no_open_page)?;
        self.pages.push(page);
        Ok(())
    }
}
