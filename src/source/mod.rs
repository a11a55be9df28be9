//! Access to the scanned source document.
//!
//! [`PageSource`] isolates the reconstructor from the concrete PDF library:
//! it answers page-count and geometry queries and captures page templates.
//! [`PdfSource`] is the `lopdf`-backed implementation.

mod pdf;
mod template;

pub use pdf::PdfSource;
pub use template::PageTemplate;

use crate::error::Result;
use crate::model::PageGeometry;

/// Random-access view of the source document's pages. Page numbers are 1-based.
pub trait PageSource {
    /// Total number of pages; authoritative for the output page count.
    fn page_count(&self) -> u32;

    /// Size of a page, read from its (possibly inherited) MediaBox.
    fn page_geometry(&self, page: u32) -> Result<PageGeometry>;

    /// Capture a reusable snapshot of a page's visual content.
    fn capture_template(&self, page: u32) -> Result<PageTemplate>;
}
